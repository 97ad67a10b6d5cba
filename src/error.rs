use thiserror::Error;

/// Cycle detection error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CycleError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("No cycles detected. Adjust the detection parameters or try manual cutting.")]
    Detection,

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for cycle detection operations
pub type CycleResult<T> = Result<T, CycleError>;
