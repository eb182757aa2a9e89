use serde::{Serialize, Deserialize};

use crate::network::spec::NetworkSpec;
use crate::persistence::json::read_json;
use crate::train::sample::Sample;
use crate::train::train_config::TrainingParams;

/// Everything the `mlp-engine` binary needs for one run, read from JSON.
///
/// ```json
/// {
///   "network":  { "architecture": [2, 2, 1], "activations": ["Sigmoid", "Sigmoid"], "seed": 1 },
///   "training": { "learning_rate": 0.5, "num_epochs": 5000, "momentum": 0.9 },
///   "samples":  [ { "inputs": [0, 0], "outputs": [0] } ],
///   "weights_out": "xor.nui"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub network: NetworkSpec,
    #[serde(default)]
    pub training: TrainingParams,
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub test_samples: Vec<Sample>,
    /// Where to write the trained weights, if anywhere.
    #[serde(default)]
    pub weights_out: Option<String>,
    /// Where to write the per-epoch error CSV, if anywhere.
    #[serde(default)]
    pub results_csv: Option<String>,
}

impl RunConfig {
    pub fn load_json(path: &str) -> std::io::Result<RunConfig> {
        read_json(path)
    }
}
