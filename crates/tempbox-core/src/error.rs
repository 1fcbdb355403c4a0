//! Error types for the core library.

use thiserror::Error;

use crate::accounts::ValidationError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Remote API call failed.
    #[error("API error: {0}")]
    Api(#[from] tempbox_api::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No mailbox is logged in.
    #[error("Not logged in")]
    NotAuthenticated,

    /// Stored account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account input rejected before any request was made.
    #[error("Invalid account: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    /// The background poller has stopped.
    #[error("Poller stopped")]
    PollerStopped,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::message)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
