use serde::{Serialize, Deserialize};

/// One labelled example. `inputs` must match the network's input width and
/// `outputs` its output width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub inputs: Vec<f64>,
    pub outputs: Vec<f64>,
}

impl Sample {
    pub fn new(inputs: Vec<f64>, outputs: Vec<f64>) -> Sample {
        Sample { inputs, outputs }
    }
}
