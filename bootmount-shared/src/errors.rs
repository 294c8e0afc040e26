//! Error types used across the boot bring-up.

use thiserror::Error;

/// Result type for boot bring-up operations.
pub type BootResult<T> = Result<T, BootError>;

#[derive(Debug, Error)]
pub enum BootError {
    /// The kernel rejected a mount request.
    #[error("mount error: {0}")]
    Mount(String),

    /// The mount target already has a filesystem mounted on it (EBUSY).
    #[error("target busy: {0}")]
    Busy(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// No block device carries the requested partition.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BootError {
    /// Whether this error is the "already mounted" condition.
    pub fn is_busy(&self) -> bool {
        matches!(self, BootError::Busy(_))
    }
}

// Implement From for common error types to enable `?` operator
impl From<std::io::Error> for BootError {
    fn from(err: std::io::Error) -> Self {
        BootError::Internal(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for BootError {
    fn from(err: serde_json::Error) -> Self {
        BootError::Config(format!("JSON error: {}", err))
    }
}
