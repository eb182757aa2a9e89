use crate::error::{NetworkError, Result};

pub struct MaeLoss;

impl MaeLoss {
    /// Scalar MAE: mean(|predicted - expected|), 0 for two empty slices.
    pub fn loss(predicted: &[f64], expected: &[f64]) -> Result<f64> {
        if predicted.len() != expected.len() {
            return Err(NetworkError::dimension("mean absolute error", predicted.len(), expected.len()));
        }
        if predicted.is_empty() {
            return Ok(0.0);
        }
        let sum: f64 = predicted.iter().zip(expected)
            .map(|(p, y)| (p - y).abs())
            .sum();
        Ok(sum / predicted.len() as f64)
    }
}
