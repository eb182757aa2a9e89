use serde::{Serialize, Deserialize};

/// Outcome of one `Trainer::train` run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingResults {
    /// Mean error of every completed epoch, in order.
    pub epoch_errors: Vec<f64>,
    pub epochs_completed: usize,
    /// Error of the last completed epoch; 0 when none completed.
    pub final_error: f64,
    /// True when a stop request ended the run before `num_epochs`.
    pub stopped: bool,
}

impl TrainingResults {
    pub(crate) fn record(&mut self, epoch_error: f64) {
        self.epoch_errors.push(epoch_error);
        self.epochs_completed = self.epoch_errors.len();
        self.final_error = epoch_error;
    }
}
