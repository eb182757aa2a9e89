use crate::error::{NetworkError, Result};

/// Plain gradient descent with classical (non-Nesterov) momentum.
///
/// Each step is `-learning_rate * grad + momentum * previous_step`; the step
/// taken is remembered so the next call can add its momentum share.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64, momentum: f64) -> Sgd {
        Sgd { learning_rate, momentum }
    }

    /// Updates `params` in place from `grad`, recording each step in `prev_steps`.
    pub fn step(&self, params: &mut [f64], grad: &[f64], prev_steps: &mut [f64]) -> Result<()> {
        if grad.len() != params.len() {
            return Err(NetworkError::dimension("sgd gradient", params.len(), grad.len()));
        }
        if prev_steps.len() != params.len() {
            return Err(NetworkError::dimension("sgd momentum history", params.len(), prev_steps.len()));
        }

        for ((p, g), prev) in params.iter_mut().zip(grad).zip(prev_steps.iter_mut()) {
            let mut step = -self.learning_rate * g;
            if self.momentum > 0.0 {
                step += self.momentum * *prev;
            }
            *p += step;
            *prev = step;
        }
        Ok(())
    }

    /// Bias steps carry no momentum term.
    pub fn step_bias(&self, bias: &mut f64, grad: f64) {
        *bias -= self.learning_rate * grad;
    }
}
