//! Error types for the InvestLink client
//!
//! Every contract operation converts transport, status and decode failures
//! into this taxonomy at its own boundary. Read paths fail with
//! [`ClientError::FetchFailed`], write paths with [`ClientError::UpdateFailed`].

use thiserror::Error;

/// Client error taxonomy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// A batch, list, profile or search read did not complete.
    /// Recoverable by a user-triggered retry; never means "empty".
    #[error("Fetch failed ({operation}): {reason}")]
    FetchFailed {
        operation: &'static str,
        reason: String,
    },

    /// A swipe or status write did not complete
    #[error("Update failed ({operation}): {reason}")]
    UpdateFailed {
        operation: &'static str,
        reason: String,
    },

    /// Profile lookup for an unknown id; not retried automatically
    #[error("Not found: {0}")]
    NotFound(String),

    /// Client could not be constructed from its configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ClientError {
    pub fn fetch(operation: &'static str, reason: impl Into<String>) -> Self {
        ClientError::FetchFailed {
            operation,
            reason: reason.into(),
        }
    }

    pub fn update(operation: &'static str, reason: impl Into<String>) -> Self {
        ClientError::UpdateFailed {
            operation,
            reason: reason.into(),
        }
    }

    /// Whether the UI should offer a retry affordance
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::FetchFailed { .. })
    }
}

impl From<investlink_common::Error> for ClientError {
    fn from(err: investlink_common::Error) -> Self {
        use investlink_common::Error as E;
        match err {
            E::Config(msg) => ClientError::Config(msg),
            E::Toml(e) => ClientError::Config(e.to_string()),
            E::Io(e) => ClientError::Config(e.to_string()),
            E::NotFound(msg) => ClientError::NotFound(msg),
            E::InvalidInput(msg) => ClientError::InvalidInput(msg),
            E::Contract(msg) => ClientError::fetch("decode", msg),
        }
    }
}

/// Convenience Result type using ClientError
pub type Result<T> = std::result::Result<T, ClientError>;
