// Engine error taxonomy
//
// Setup-phase failures come back to the caller through these variants. Failures
// that happen inside a running stream never reach here; they end that stream and
// get logged instead.

/// Errors returned by engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed persisted value: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Audio device error: {0:#}")]
    Device(#[from] anyhow::Error),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Audio worker exited before reporting ({0})")]
    WorkerLost(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
