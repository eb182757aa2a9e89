pub mod metrics;

pub use metrics::{evaluate, BinaryClassification, EvaluationReport};
