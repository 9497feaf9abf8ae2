//! Common error types for InvestLink

use thiserror::Error;

/// Common result type for InvestLink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by InvestLink components
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML configuration could not be parsed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Server response broke the wire contract
    #[error("Contract violation: {0}")]
    Contract(String),
}
