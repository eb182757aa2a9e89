pub mod mae;
pub mod mse;

pub use mae::MaeLoss;
pub use mse::MseLoss;
