use serde::{Serialize, Deserialize};

use crate::error::{NetworkError, Result};
use crate::loss::{MaeLoss, MseLoss};
use crate::network::network::Network;
use crate::train::sample::Sample;

/// Outputs at or above this value count as the positive class.
const DECISION_THRESHOLD: f64 = 0.5;

/// Binary classification metrics. `confusion[predicted][actual]`, so
/// `confusion[1][1]` holds true positives and `confusion[1][0]` false positives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BinaryClassification {
    pub confusion: [[usize; 2]; 2],
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Regression and (when applicable) classification metrics over a sample set.
///
/// `predictions` and `actuals` are flattened: one entry per output value of
/// every sample, in sample order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub predictions: Vec<f64>,
    pub actuals: Vec<f64>,
    pub mse: f64,
    pub mae: f64,
    /// Coefficient of determination; 0 when the targets have no variance.
    pub r2: f64,
    /// Present when the network has one output and every target is 0 or 1.
    pub classification: Option<BinaryClassification>,
}

/// Runs every sample through `network` (no weight changes) and scores the results.
pub fn evaluate(network: &mut Network, samples: &[Sample]) -> Result<EvaluationReport> {
    let mut report = EvaluationReport::default();
    if samples.is_empty() {
        return Ok(report);
    }

    for sample in samples {
        let prediction = network.forward(&sample.inputs)?;
        if prediction.len() != sample.outputs.len() {
            return Err(NetworkError::dimension("sample outputs", prediction.len(), sample.outputs.len()));
        }
        report.predictions.extend_from_slice(&prediction);
        report.actuals.extend_from_slice(&sample.outputs);
    }

    report.mse = MseLoss::loss(&report.predictions, &report.actuals)?;
    report.mae = MaeLoss::loss(&report.predictions, &report.actuals)?;
    report.r2 = r_squared(&report.predictions, &report.actuals);

    let is_binary = network.num_outputs() == 1
        && report.actuals.iter().all(|&y| y == 0.0 || y == 1.0);
    if is_binary {
        report.classification = Some(classify(&report.predictions, &report.actuals));
    }
    Ok(report)
}

fn r_squared(predictions: &[f64], actuals: &[f64]) -> f64 {
    let n = actuals.len() as f64;
    let mean = actuals.iter().sum::<f64>() / n;
    let total: f64 = actuals.iter().map(|y| (y - mean).powi(2)).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let residual: f64 = predictions.iter().zip(actuals).map(|(p, y)| (p - y).powi(2)).sum();
    1.0 - residual / total
}

fn classify(predictions: &[f64], actuals: &[f64]) -> BinaryClassification {
    let mut confusion = [[0usize; 2]; 2];
    for (p, y) in predictions.iter().zip(actuals) {
        let predicted = usize::from(*p >= DECISION_THRESHOLD);
        let actual = usize::from(*y >= DECISION_THRESHOLD);
        confusion[predicted][actual] += 1;
    }

    let tp = confusion[1][1] as f64;
    let fp = confusion[1][0] as f64;
    let fn_ = confusion[0][1] as f64;
    let correct = (confusion[0][0] + confusion[1][1]) as f64;

    let ratio = |num: f64, den: f64| if den > 0.0 { num / den } else { 0.0 };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);

    BinaryClassification {
        confusion,
        accuracy: correct / predictions.len() as f64,
        precision,
        recall,
        f1: ratio(2.0 * precision * recall, precision + recall),
    }
}
