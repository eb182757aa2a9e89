use thiserror::Error;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Failures raised by the network, its layers and the trainer.
///
/// None of these are transient: the caller has to fix its inputs before
/// trying again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// A vector length did not match the shape it is paired with.
    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    Dimension {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The requested architecture cannot form a network.
    #[error("invalid architecture: {0}")]
    Structural(String),

    /// A trainer operation was invoked after its network was released.
    #[error("trainer has no network bound")]
    Unbound,

    #[error("no training samples provided")]
    EmptySamples,

    #[error("invalid training parameters: {0}")]
    InvalidParams(String),

    /// A pass step was called out of order (e.g. `backward` without `forward`).
    #[error("cannot {operation} while network is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
}

impl NetworkError {
    pub(crate) fn dimension(context: &'static str, expected: usize, actual: usize) -> Self {
        NetworkError::Dimension { context, expected, actual }
    }
}

/// Failures raised while reading or writing the weight file format.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A required header line is absent.
    #[error("missing required section `{0}`")]
    MissingSection(&'static str),

    #[error("malformed weight file at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    /// The file parsed but does not fit the network it describes.
    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl PersistenceError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        PersistenceError::Malformed { line, reason: reason.into() }
    }
}
