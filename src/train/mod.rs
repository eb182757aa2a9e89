pub mod results;
pub mod sample;
pub mod train_config;
pub mod trainer;

pub use results::TrainingResults;
pub use sample::Sample;
pub use train_config::{BatchMode, TrainingParams};
pub use trainer::{StopHandle, Trainer};
