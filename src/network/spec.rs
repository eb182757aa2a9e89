use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationType;
use crate::error::Result;
use crate::network::network::Network;
use crate::persistence::json;

/// A serializable description of a network architecture.
///
/// Fields:
/// - `architecture`: neurons per layer, input layer first
/// - `activations`: one activation per non-input layer
/// - `seed`: optional seed for Xavier initialisation; entropy when absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub architecture: Vec<usize>,
    pub activations: Vec<ActivationType>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl NetworkSpec {
    pub fn new(architecture: Vec<usize>, activations: Vec<ActivationType>) -> NetworkSpec {
        NetworkSpec { architecture, activations, seed: None }
    }

    /// Builds a freshly initialised network from this spec.
    pub fn build(&self) -> Result<Network> {
        match self.seed {
            Some(seed) => Network::with_seed(&self.architecture, &self.activations, seed),
            None => Network::new(&self.architecture, &self.activations),
        }
    }

    /// Describes an existing network (without its weights).
    pub fn of(network: &Network) -> NetworkSpec {
        NetworkSpec::new(network.architecture(), network.activation_types().to_vec())
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        json::write_json(self, path)
    }

    pub fn load_json(path: &str) -> std::io::Result<NetworkSpec> {
        json::read_json(path)
    }
}
