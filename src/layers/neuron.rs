use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::activation::activation::ActivationType;
use crate::error::{NetworkError, Result};
use crate::optim::sgd::Sgd;

/// A single unit: one weight per input, a bias, and the values cached by the
/// last forward/backward pass.
///
/// Input-layer neurons carry no activation; their output is the raw weighted sum.
#[derive(Debug, Clone, PartialEq)]
pub struct Neuron {
    weights: Vec<f64>,
    bias: f64,
    last_weighted_sum: f64,
    last_output: f64,
    delta: f64,
    activation: Option<ActivationType>,
}

impl Neuron {
    /// Creates a neuron with all weights and the bias at zero.
    pub fn new(num_inputs: usize, activation: Option<ActivationType>) -> Neuron {
        Neuron {
            weights: vec![0.0; num_inputs],
            bias: 0.0,
            last_weighted_sum: 0.0,
            last_output: 0.0,
            delta: 0.0,
            activation,
        }
    }

    /// Draws every weight and the bias from N(0, std_dev²).
    pub fn initialize_weights<R: Rng + ?Sized>(&mut self, rng: &mut R, std_dev: f64) {
        for w in self.weights.iter_mut() {
            let z: f64 = StandardNormal.sample(rng);
            *w = z * std_dev;
        }
        let z: f64 = StandardNormal.sample(rng);
        self.bias = z * std_dev;
    }

    /// Computes `activation(dot(inputs, weights) + bias)` and caches both the
    /// weighted sum and the output.
    pub fn forward(&mut self, inputs: &[f64]) -> Result<f64> {
        if inputs.len() != self.weights.len() {
            return Err(NetworkError::dimension("neuron forward", self.weights.len(), inputs.len()));
        }

        let sum: f64 = inputs.iter().zip(&self.weights).map(|(x, w)| x * w).sum();
        self.last_weighted_sum = sum + self.bias;
        self.last_output = match self.activation {
            Some(act) => act.function(self.last_weighted_sum),
            None => self.last_weighted_sum,
        };
        Ok(self.last_output)
    }

    /// Activation derivative at the cached weighted sum; 1 without an activation.
    pub fn activation_derivative(&self) -> f64 {
        self.activation
            .map(|act| act.derivative(self.last_weighted_sum))
            .unwrap_or(1.0)
    }

    /// Applies one momentum step using the stored delta and the inputs of the
    /// pass that produced it.
    ///
    /// The delta already includes the activation derivative (see
    /// `Layer::backward`), so the weight gradient is simply `delta * input`.
    pub fn update_weights(
        &mut self,
        inputs: &[f64],
        learning_rate: f64,
        momentum: f64,
        prev_deltas: &mut [f64],
    ) -> Result<()> {
        if inputs.len() != self.weights.len() {
            return Err(NetworkError::dimension("neuron update", self.weights.len(), inputs.len()));
        }
        let grad: Vec<f64> = inputs.iter().map(|x| self.delta * x).collect();
        let bias_grad = self.delta;
        self.apply_gradient(&grad, bias_grad, &Sgd::new(learning_rate, momentum), prev_deltas)
    }

    /// Applies an externally computed gradient (e.g. a batch mean).
    pub fn apply_gradient(
        &mut self,
        grad: &[f64],
        bias_grad: f64,
        sgd: &Sgd,
        prev_deltas: &mut [f64],
    ) -> Result<()> {
        sgd.step(&mut self.weights, grad, prev_deltas)?;
        sgd.step_bias(&mut self.bias, bias_grad);
        Ok(())
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Replaces the weight vector; the length must not change.
    pub fn set_weights(&mut self, weights: &[f64]) -> Result<()> {
        if weights.len() != self.weights.len() {
            return Err(NetworkError::dimension("neuron weights", self.weights.len(), weights.len()));
        }
        self.weights.copy_from_slice(weights);
        Ok(())
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn set_bias(&mut self, bias: f64) {
        self.bias = bias;
    }

    pub fn num_inputs(&self) -> usize {
        self.weights.len()
    }

    pub fn activation(&self) -> Option<ActivationType> {
        self.activation
    }

    pub fn last_weighted_sum(&self) -> f64 {
        self.last_weighted_sum
    }

    pub fn last_output(&self) -> f64 {
        self.last_output
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn set_delta(&mut self, delta: f64) {
        self.delta = delta;
    }
}
