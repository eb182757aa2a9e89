use serde::{Serialize, Deserialize};

use crate::error::{NetworkError, Result};

/// How the samples of one batch turn into a weight update.
///
/// - `Accumulate`: per-sample gradients are summed and their mean is applied
///   as one momentum step.
/// - `LastSample`: every sample runs forward/backward but only the deltas of
///   the last one are applied, with the learning rate divided by
///   the batch length. Matches weights trained by older tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    #[default]
    Accumulate,
    LastSample,
}

/// Hyperparameters for a `Trainer::train` run.
///
/// # Fields
/// - `learning_rate`: gradient step scale, must be > 0
/// - `num_epochs`: upper bound on full passes over the samples
/// - `batch_size`: samples per update; the last batch may be shorter and a
///   size above the sample count is simply one batch
/// - `momentum`: share of the previous step added to the current one, in [0, 1)
/// - `shuffle`: reorder samples before every epoch after the first
/// - `seed`: seeds the shuffle; entropy when absent
/// - `batch_mode`: see [`BatchMode`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    pub learning_rate: f64,
    pub num_epochs: usize,
    pub batch_size: usize,
    pub momentum: f64,
    pub shuffle: bool,
    pub seed: Option<u64>,
    pub batch_mode: BatchMode,
}

impl Default for TrainingParams {
    fn default() -> Self {
        TrainingParams {
            learning_rate: 0.01,
            num_epochs: 100,
            batch_size: 1,
            momentum: 0.0,
            shuffle: true,
            seed: None,
            batch_mode: BatchMode::Accumulate,
        }
    }
}

impl TrainingParams {
    pub fn new(learning_rate: f64, num_epochs: usize) -> Self {
        TrainingParams { learning_rate, num_epochs, ..Default::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(NetworkError::InvalidParams(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        if self.num_epochs == 0 {
            return Err(NetworkError::InvalidParams("num_epochs must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(NetworkError::InvalidParams("batch_size must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(NetworkError::InvalidParams(format!(
                "momentum must be in [0, 1), got {}",
                self.momentum
            )));
        }
        Ok(())
    }
}
