pub mod activation;
pub mod config;
pub mod error;
pub mod eval;
pub mod layers;
pub mod loss;
pub mod network;
pub mod optim;
pub mod persistence;
pub mod train;

// Convenience re-exports
pub use activation::activation::ActivationType;
pub use config::RunConfig;
pub use error::{NetworkError, PersistenceError, Result};
pub use eval::metrics::{evaluate, BinaryClassification, EvaluationReport};
pub use layers::dense::Layer;
pub use layers::neuron::Neuron;
pub use loss::mse::MseLoss;
pub use network::network::{Network, PassState};
pub use network::spec::NetworkSpec;
pub use optim::sgd::Sgd;
pub use persistence::{export_results_csv, load_network, save_network};
pub use train::{BatchMode, Sample, StopHandle, Trainer, TrainingParams, TrainingResults};
