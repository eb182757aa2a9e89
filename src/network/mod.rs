pub mod network;
pub mod spec;

pub use network::{Network, PassState};
pub use spec::NetworkSpec;
