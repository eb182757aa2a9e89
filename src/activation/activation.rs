use serde::{Serialize, Deserialize};
use std::fmt;

/// Sigmoid saturates to exactly 0 or 1 beyond this magnitude.
const SIGMOID_CLAMP: f64 = 700.0;

/// Element-wise activation applied by every neuron of a non-input layer.
///
/// The variant is stored directly on each neuron; it carries no state, so
/// `function()` and `derivative()` are pure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationType {
    #[default]
    Sigmoid,
    Tanh,
    ReLU,
    Linear,
}

impl ActivationType {
    /// Applies the activation to a weighted sum.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationType::Sigmoid => {
                if x > SIGMOID_CLAMP {
                    1.0
                } else if x < -SIGMOID_CLAMP {
                    0.0
                } else {
                    1.0 / (1.0 + (-x).exp())
                }
            }
            ActivationType::Tanh => x.tanh(),
            ActivationType::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationType::Linear => x,
        }
    }

    /// Derivative with respect to the weighted sum `x` (not the output).
    ///
    /// Sigmoid is evaluated as `s * (1 - s)` where `s = function(x)`.
    /// ReLU is taken as 0 at exactly 0.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationType::Sigmoid => {
                let s = self.function(x);
                s * (1.0 - s)
            }
            ActivationType::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationType::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationType::Linear => 1.0,
        }
    }

    /// Integer code used by the weight file format.
    pub fn code(&self) -> u8 {
        match self {
            ActivationType::Sigmoid => 0,
            ActivationType::Tanh => 1,
            ActivationType::ReLU => 2,
            ActivationType::Linear => 3,
        }
    }

    /// Resolves a weight-file code. Unknown codes fall back to Sigmoid so
    /// that older or hand-edited files still load.
    pub fn from_code(code: i64) -> ActivationType {
        match code {
            1 => ActivationType::Tanh,
            2 => ActivationType::ReLU,
            3 => ActivationType::Linear,
            _ => ActivationType::Sigmoid,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivationType::Sigmoid => "Sigmoid",
            ActivationType::Tanh => "Tanh",
            ActivationType::ReLU => "ReLU",
            ActivationType::Linear => "Linear",
        }
    }
}

impl fmt::Display for ActivationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
