use rand::Rng;

use crate::activation::activation::ActivationType;
use crate::error::{NetworkError, Result};
use crate::layers::neuron::Neuron;
use crate::optim::sgd::Sgd;

/// A fully connected layer. Every neuron sees the same inputs and shares one
/// activation (none for the input layer).
///
/// Besides the neurons it keeps what the backward pass and the weight update
/// need: the inputs of the last forward pass, the previous step of every
/// weight for momentum, and optional batch gradient sums.
#[derive(Debug, Clone)]
pub struct Layer {
    neurons: Vec<Neuron>,
    num_inputs: usize,
    activation: Option<ActivationType>,
    last_outputs: Vec<f64>,
    last_inputs: Vec<f64>,
    prev_weight_deltas: Vec<Vec<f64>>,
    grad_sums: Vec<Vec<f64>>,
    bias_grad_sums: Vec<f64>,
    accumulated: usize,
}

impl Layer {
    pub fn new(size: usize, num_inputs: usize, activation: Option<ActivationType>) -> Layer {
        Layer {
            neurons: (0..size).map(|_| Neuron::new(num_inputs, activation)).collect(),
            num_inputs,
            activation,
            last_outputs: vec![0.0; size],
            last_inputs: Vec::new(),
            prev_weight_deltas: vec![vec![0.0; num_inputs]; size],
            grad_sums: vec![vec![0.0; num_inputs]; size],
            bias_grad_sums: vec![0.0; size],
            accumulated: 0,
        }
    }

    pub fn initialize_weights<R: Rng + ?Sized>(&mut self, rng: &mut R, std_dev: f64) {
        for neuron in &mut self.neurons {
            neuron.initialize_weights(rng, std_dev);
        }
        for prev in &mut self.prev_weight_deltas {
            prev.iter_mut().for_each(|d| *d = 0.0);
        }
        self.clear_accumulated_gradients();
    }

    /// Runs every neuron on `inputs` in order and caches inputs and outputs.
    pub fn forward(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        if inputs.len() != self.num_inputs {
            return Err(NetworkError::dimension("layer forward", self.num_inputs, inputs.len()));
        }

        self.last_inputs.clear();
        self.last_inputs.extend_from_slice(inputs);

        let outputs = self.neurons
            .iter_mut()
            .map(|n| n.forward(inputs))
            .collect::<Result<Vec<f64>>>()?;
        self.last_outputs.clone_from(&outputs);
        Ok(outputs)
    }

    /// Stores outputs directly; used by the pass-through input layer.
    pub fn set_outputs(&mut self, outputs: &[f64]) -> Result<()> {
        if outputs.len() != self.neurons.len() {
            return Err(NetworkError::dimension("layer outputs", self.neurons.len(), outputs.len()));
        }
        self.last_outputs.clear();
        self.last_outputs.extend_from_slice(outputs);
        Ok(())
    }

    /// Turns the error arriving at each neuron's output into its delta by
    /// multiplying with the activation derivative at the cached weighted sum.
    pub fn backward(&mut self, errors: &[f64]) -> Result<()> {
        if errors.len() != self.neurons.len() {
            return Err(NetworkError::dimension("layer backward", self.neurons.len(), errors.len()));
        }
        for (neuron, err) in self.neurons.iter_mut().zip(errors) {
            let delta = err * neuron.activation_derivative();
            neuron.set_delta(delta);
        }
        Ok(())
    }

    /// Error signal for the previous layer: `Wᵀ · δ`, one entry per input.
    pub fn errors_for_prev_layer(&self) -> Vec<f64> {
        let mut errors = vec![0.0; self.num_inputs];
        for neuron in &self.neurons {
            let delta = neuron.delta();
            for (e, w) in errors.iter_mut().zip(neuron.weights()) {
                *e += w * delta;
            }
        }
        errors
    }

    /// One momentum step per neuron from the current deltas and cached inputs.
    pub fn update_weights(&mut self, learning_rate: f64, momentum: f64) -> Result<()> {
        for (neuron, prev) in self.neurons.iter_mut().zip(self.prev_weight_deltas.iter_mut()) {
            neuron.update_weights(&self.last_inputs, learning_rate, momentum, prev)?;
        }
        Ok(())
    }

    /// Adds the current per-sample gradient (`δ · input`) to the batch sums.
    pub fn accumulate_gradients(&mut self) -> Result<()> {
        if self.last_inputs.len() != self.num_inputs {
            return Err(NetworkError::dimension("layer accumulate", self.num_inputs, self.last_inputs.len()));
        }
        for (i, neuron) in self.neurons.iter().enumerate() {
            let delta = neuron.delta();
            for (g, x) in self.grad_sums[i].iter_mut().zip(&self.last_inputs) {
                *g += delta * x;
            }
            self.bias_grad_sums[i] += delta;
        }
        self.accumulated += 1;
        Ok(())
    }

    /// Applies the mean of the accumulated gradients as a single step, then
    /// clears the sums. Does nothing if nothing was accumulated.
    pub fn apply_accumulated_gradients(&mut self, learning_rate: f64, momentum: f64) -> Result<()> {
        if self.accumulated == 0 {
            return Ok(());
        }
        let scale = 1.0 / self.accumulated as f64;
        let sgd = Sgd::new(learning_rate, momentum);

        for (i, neuron) in self.neurons.iter_mut().enumerate() {
            let grad: Vec<f64> = self.grad_sums[i].iter().map(|g| g * scale).collect();
            let bias_grad = self.bias_grad_sums[i] * scale;
            neuron.apply_gradient(&grad, bias_grad, &sgd, &mut self.prev_weight_deltas[i])?;
        }
        self.clear_accumulated_gradients();
        Ok(())
    }

    pub fn clear_accumulated_gradients(&mut self) {
        for sums in &mut self.grad_sums {
            sums.iter_mut().for_each(|g| *g = 0.0);
        }
        self.bias_grad_sums.iter_mut().for_each(|g| *g = 0.0);
        self.accumulated = 0;
    }

    pub fn accumulated_samples(&self) -> usize {
        self.accumulated
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn neurons_mut(&mut self) -> &mut [Neuron] {
        &mut self.neurons
    }

    pub fn size(&self) -> usize {
        self.neurons.len()
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn activation(&self) -> Option<ActivationType> {
        self.activation
    }

    pub fn outputs(&self) -> &[f64] {
        &self.last_outputs
    }

    pub fn last_inputs(&self) -> &[f64] {
        &self.last_inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 2 inputs -> 2 linear neurons with hand-picked weights.
    fn linear_layer() -> Layer {
        let mut layer = Layer::new(2, 2, Some(ActivationType::Linear));
        layer.neurons_mut()[0].set_weights(&[1.0, 2.0]).unwrap();
        layer.neurons_mut()[1].set_weights(&[-1.0, 0.5]).unwrap();
        layer.neurons_mut()[1].set_bias(1.0);
        layer
    }

    #[test]
    fn forward_computes_outputs_in_order() {
        let mut layer = linear_layer();
        let out = layer.forward(&[3.0, 4.0]).unwrap();
        assert_eq!(out, vec![11.0, 0.0]);
        assert_eq!(layer.outputs(), &[11.0, 0.0]);
        assert_eq!(layer.last_inputs(), &[3.0, 4.0]);
    }

    #[test]
    fn forward_rejects_wrong_width() {
        let mut layer = linear_layer();
        assert!(matches!(
            layer.forward(&[1.0]),
            Err(NetworkError::Dimension { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn backward_applies_derivative_once() {
        let mut layer = Layer::new(1, 1, Some(ActivationType::Sigmoid));
        layer.neurons_mut()[0].set_weights(&[1.0]).unwrap();
        layer.forward(&[0.0]).unwrap();
        layer.backward(&[2.0]).unwrap();
        // sigmoid'(0) = 0.25
        assert_relative_eq!(layer.neurons()[0].delta(), 0.5);
    }

    #[test]
    fn backward_rejects_wrong_error_width() {
        let mut layer = linear_layer();
        layer.forward(&[1.0, 1.0]).unwrap();
        assert!(layer.backward(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn errors_for_prev_layer_is_transposed_product() {
        let mut layer = linear_layer();
        layer.forward(&[1.0, 1.0]).unwrap();
        layer.backward(&[1.0, 2.0]).unwrap();
        // Wᵀ δ = [1*1 + -1*2, 2*1 + 0.5*2]
        let errs = layer.errors_for_prev_layer();
        assert_relative_eq!(errs[0], -1.0);
        assert_relative_eq!(errs[1], 3.0);
    }

    #[test]
    fn accumulated_mean_equals_single_step_for_one_sample() {
        let mut a = linear_layer();
        let mut b = linear_layer();
        for layer in [&mut a, &mut b] {
            layer.forward(&[0.5, -1.0]).unwrap();
            layer.backward(&[0.2, -0.4]).unwrap();
        }
        a.update_weights(0.1, 0.0).unwrap();
        b.accumulate_gradients().unwrap();
        b.apply_accumulated_gradients(0.1, 0.0).unwrap();
        assert_eq!(a.neurons(), b.neurons());
        assert_eq!(b.accumulated_samples(), 0);
    }

    #[test]
    fn accumulation_averages_over_samples() {
        let mut layer = Layer::new(1, 1, Some(ActivationType::Linear));
        for x in [1.0, 3.0] {
            layer.forward(&[x]).unwrap();
            layer.backward(&[1.0]).unwrap();
            layer.accumulate_gradients().unwrap();
        }
        layer.apply_accumulated_gradients(1.0, 0.0).unwrap();
        // mean grad = (1 + 3) / 2
        assert_relative_eq!(layer.neurons()[0].weights()[0], -2.0);
        assert_relative_eq!(layer.neurons()[0].bias(), -1.0);
    }

    #[test]
    fn update_before_forward_fails() {
        let mut layer = linear_layer();
        assert!(layer.update_weights(0.1, 0.0).is_err());
    }
}
