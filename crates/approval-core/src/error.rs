//! Error types for the approval gate

use thiserror::Error;

/// Main error type for all approval gate operations
#[derive(Error, Debug)]
pub enum GateError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Issue tracker error: {0}")]
    Tracker(String),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {0}")]
    Output(String),
}

/// Result type for approval gate operations
pub type Result<T> = std::result::Result<T, GateError>;
