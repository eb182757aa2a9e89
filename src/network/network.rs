use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::activation::activation::ActivationType;
use crate::error::{NetworkError, Result};
use crate::layers::dense::Layer;
use crate::loss::mse::MseLoss;

/// Where the network stands within one forward/backward/update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    ForwardComplete,
    BackwardComplete,
}

impl PassState {
    fn name(&self) -> &'static str {
        match self {
            PassState::Idle => "idle",
            PassState::ForwardComplete => "forward-complete",
            PassState::BackwardComplete => "backward-complete",
        }
    }
}

/// A multilayer perceptron.
///
/// Layer 0 is the input layer: it holds one activation-less neuron per input
/// and passes values through unchanged. Every later layer is fully connected
/// to the one before it and has exactly one activation type.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    activation_types: Vec<ActivationType>,
    last_output: Vec<f64>,
    state: PassState,
}

impl Network {
    /// Builds a network with Xavier-initialised weights from an entropy seed.
    ///
    /// `architecture` lists neurons per layer, input first; `activations` has
    /// one entry per non-input layer.
    pub fn new(architecture: &[usize], activations: &[ActivationType]) -> Result<Network> {
        let mut network = Network::zeroed(architecture, activations)?;
        network.initialize_weights_with(&mut StdRng::from_entropy());
        Ok(network)
    }

    /// Like [`Network::new`] but reproducible.
    pub fn with_seed(architecture: &[usize], activations: &[ActivationType], seed: u64) -> Result<Network> {
        let mut network = Network::zeroed(architecture, activations)?;
        network.initialize_weights(seed);
        Ok(network)
    }

    /// Builds the layers with every weight and bias at zero.
    pub fn zeroed(architecture: &[usize], activations: &[ActivationType]) -> Result<Network> {
        if architecture.len() < 2 {
            return Err(NetworkError::Structural(format!(
                "need at least an input and an output layer, got {} layer(s)",
                architecture.len()
            )));
        }
        if let Some(idx) = architecture.iter().position(|&size| size == 0) {
            return Err(NetworkError::Structural(format!("layer {idx} has no neurons")));
        }
        if activations.len() != architecture.len() - 1 {
            return Err(NetworkError::Structural(format!(
                "expected {} activation(s) for {} layers, got {}",
                architecture.len() - 1,
                architecture.len(),
                activations.len()
            )));
        }

        let mut layers = Vec::with_capacity(architecture.len());
        layers.push(Layer::new(architecture[0], architecture[0], None));
        for (i, activation) in activations.iter().enumerate() {
            layers.push(Layer::new(architecture[i + 1], architecture[i], Some(*activation)));
        }

        Ok(Network {
            layers,
            activation_types: activations.to_vec(),
            last_output: Vec::new(),
            state: PassState::Idle,
        })
    }

    /// Re-draws all trainable weights from a seeded generator.
    pub fn initialize_weights(&mut self, seed: u64) {
        self.initialize_weights_with(&mut StdRng::seed_from_u64(seed));
    }

    /// Xavier/Glorot: N(0, 2 / (fan_in + fan_out)) for every non-input layer.
    pub fn initialize_weights_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for layer in self.layers.iter_mut().skip(1) {
            let variance = 2.0 / (layer.num_inputs() + layer.size()) as f64;
            layer.initialize_weights(rng, variance.sqrt());
        }
        self.state = PassState::Idle;
    }

    /// Forward pass; every layer caches what backprop needs.
    pub fn forward(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        let expected = self.num_inputs();
        if inputs.len() != expected {
            return Err(NetworkError::dimension("network forward", expected, inputs.len()));
        }

        self.layers[0].set_outputs(inputs)?;
        let mut current = inputs.to_vec();
        for layer in self.layers.iter_mut().skip(1) {
            current = layer.forward(&current)?;
        }

        self.last_output.clone_from(&current);
        self.state = PassState::ForwardComplete;
        Ok(current)
    }

    /// Back-propagates `last_output - targets` down to layer 1 and returns
    /// the MSE of the preceding forward pass.
    pub fn backward(&mut self, targets: &[f64]) -> Result<f64> {
        self.require(PassState::ForwardComplete, "run backward")?;
        if targets.len() != self.last_output.len() {
            return Err(NetworkError::dimension("network backward", self.last_output.len(), targets.len()));
        }

        let mut errors = MseLoss::derivative(&self.last_output, targets);
        for i in (1..self.layers.len()).rev() {
            self.layers[i].backward(&errors)?;
            if i > 1 {
                errors = self.layers[i].errors_for_prev_layer();
            }
        }

        self.state = PassState::BackwardComplete;
        MseLoss::loss(&self.last_output, targets)
    }

    /// Applies the deltas of the last backward pass to every trainable layer.
    pub fn update_weights(&mut self, learning_rate: f64, momentum: f64) -> Result<()> {
        self.require(PassState::BackwardComplete, "update weights")?;
        for layer in self.layers.iter_mut().skip(1) {
            layer.update_weights(learning_rate, momentum)?;
        }
        self.state = PassState::Idle;
        Ok(())
    }

    /// Adds the gradient of the last backward pass to each layer's batch sums.
    pub fn accumulate_gradients(&mut self) -> Result<()> {
        self.require(PassState::BackwardComplete, "accumulate gradients")?;
        for layer in self.layers.iter_mut().skip(1) {
            layer.accumulate_gradients()?;
        }
        self.state = PassState::Idle;
        Ok(())
    }

    /// Steps every layer with the mean of its accumulated gradients.
    pub fn apply_accumulated_gradients(&mut self, learning_rate: f64, momentum: f64) -> Result<()> {
        for layer in self.layers.iter_mut().skip(1) {
            layer.apply_accumulated_gradients(learning_rate, momentum)?;
        }
        self.state = PassState::Idle;
        Ok(())
    }

    /// Drops any partially summed batch gradients and returns to `Idle`.
    pub fn clear_accumulated_gradients(&mut self) {
        for layer in self.layers.iter_mut().skip(1) {
            layer.clear_accumulated_gradients();
        }
        self.state = PassState::Idle;
    }

    pub fn compute_mean_squared_error(predictions: &[f64], targets: &[f64]) -> Result<f64> {
        MseLoss::loss(predictions, targets)
    }

    /// Weight vectors of every neuron, layer by layer (input layer included).
    pub fn get_all_weights(&self) -> Vec<Vec<Vec<f64>>> {
        self.layers
            .iter()
            .map(|layer| layer.neurons().iter().map(|n| n.weights().to_vec()).collect())
            .collect()
    }

    /// Restores a snapshot taken by [`Network::get_all_weights`]. The whole
    /// shape is checked before any weight is written.
    pub fn set_all_weights(&mut self, weights: &[Vec<Vec<f64>>]) -> Result<()> {
        if weights.len() != self.layers.len() {
            return Err(NetworkError::dimension("weight layers", self.layers.len(), weights.len()));
        }
        for (layer, layer_weights) in self.layers.iter().zip(weights) {
            if layer_weights.len() != layer.size() {
                return Err(NetworkError::dimension("weight neurons", layer.size(), layer_weights.len()));
            }
            if let Some(bad) = layer_weights.iter().find(|w| w.len() != layer.num_inputs()) {
                return Err(NetworkError::dimension("neuron weights", layer.num_inputs(), bad.len()));
            }
        }

        for (layer, layer_weights) in self.layers.iter_mut().zip(weights) {
            for (neuron, w) in layer.neurons_mut().iter_mut().zip(layer_weights) {
                neuron.set_weights(w)?;
            }
        }
        Ok(())
    }

    pub fn get_all_biases(&self) -> Vec<Vec<f64>> {
        self.layers
            .iter()
            .map(|layer| layer.neurons().iter().map(|n| n.bias()).collect())
            .collect()
    }

    /// Restores biases, layer by layer; validated like [`Network::set_all_weights`].
    pub fn set_all_biases(&mut self, biases: &[Vec<f64>]) -> Result<()> {
        if biases.len() != self.layers.len() {
            return Err(NetworkError::dimension("bias layers", self.layers.len(), biases.len()));
        }
        if let Some((layer, b)) = self.layers.iter().zip(biases).find(|(l, b)| l.size() != b.len()) {
            return Err(NetworkError::dimension("layer biases", layer.size(), b.len()));
        }

        for (layer, layer_biases) in self.layers.iter_mut().zip(biases) {
            for (neuron, b) in layer.neurons_mut().iter_mut().zip(layer_biases) {
                neuron.set_bias(*b);
            }
        }
        Ok(())
    }

    pub fn set_layer_biases(&mut self, layer: usize, biases: &[f64]) -> Result<()> {
        let count = self.layers.len();
        let target = self.layers
            .get_mut(layer)
            .ok_or_else(|| NetworkError::Structural(format!("layer {layer} out of range (have {count})")))?;
        if biases.len() != target.size() {
            return Err(NetworkError::dimension("layer biases", target.size(), biases.len()));
        }
        for (neuron, b) in target.neurons_mut().iter_mut().zip(biases) {
            neuron.set_bias(*b);
        }
        Ok(())
    }

    /// Neurons per layer, input layer first.
    pub fn architecture(&self) -> Vec<usize> {
        self.layers.iter().map(|l| l.size()).collect()
    }

    pub fn activation_types(&self) -> &[ActivationType] {
        &self.activation_types
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn last_output(&self) -> &[f64] {
        &self.last_output
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn num_inputs(&self) -> usize {
        self.layers[0].size()
    }

    pub fn num_outputs(&self) -> usize {
        self.layers[self.layers.len() - 1].size()
    }

    fn require(&self, state: PassState, operation: &'static str) -> Result<()> {
        if self.state != state {
            return Err(NetworkError::InvalidState { operation, state: self.state.name() });
        }
        Ok(())
    }
}
