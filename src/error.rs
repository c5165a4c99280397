use std::io;
use thiserror::Error;

/// Custom error type for ramtree
#[derive(Error, Debug)]
pub enum RamtreeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for ramtree
pub type Result<T> = std::result::Result<T, RamtreeError>;

impl RamtreeError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        RamtreeError::Config(msg.into())
    }

    /// Create an export error
    pub fn export<S: Into<String>>(msg: S) -> Self {
        RamtreeError::Export(msg.into())
    }

    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        RamtreeError::Runtime(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        RamtreeError::Other(msg.into())
    }
}
