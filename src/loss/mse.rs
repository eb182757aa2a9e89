use crate::error::{NetworkError, Result};

pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²), 0 for two empty slices.
    pub fn loss(predicted: &[f64], expected: &[f64]) -> Result<f64> {
        if predicted.len() != expected.len() {
            return Err(NetworkError::dimension("mean squared error", predicted.len(), expected.len()));
        }
        if predicted.is_empty() {
            return Ok(0.0);
        }
        let sum: f64 = predicted.iter().zip(expected)
            .map(|(a, b)| (a - b).powi(2))
            .sum();
        Ok(sum / predicted.len() as f64)
    }

    /// Per-output error fed into the backward pass: predicted - expected
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected)
            .map(|(a, b)| a - b)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_inputs_give_zero() {
        assert_eq!(MseLoss::loss(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn mismatched_lengths_fail() {
        assert!(matches!(
            MseLoss::loss(&[1.0, 2.0], &[1.0]),
            Err(NetworkError::Dimension { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn mean_of_squares() {
        assert_relative_eq!(MseLoss::loss(&[1.0, 2.0, 3.0], &[1.0, 0.0, 6.0]).unwrap(), 13.0 / 3.0);
        assert_eq!(MseLoss::derivative(&[1.0, 2.0], &[0.5, 3.0]), vec![0.5, -1.0]);
    }
}
