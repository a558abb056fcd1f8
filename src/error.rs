use std::io;
use thiserror::Error;

/// Error types for sweep-rs
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid sweep request: {0}")]
    InvalidRequest(String),

    #[error("Platform not supported: {0}")]
    NotSupported(String),

    #[error("Windows API error: {0}")]
    WindowsError(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Result type alias for sweep-rs
pub type Result<T> = std::result::Result<T, SweepError>;
