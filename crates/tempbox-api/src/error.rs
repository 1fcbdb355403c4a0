//! Error types for mail.gw API calls.

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP status the service uses to signal throttling.
pub const TOO_MANY_REQUESTS: u16 = 429;

/// API error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The service answered with a non-success status.
    #[error("API error {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Description from the response body, or the status reason.
        message: String,
    },

    /// The call needs a bearer token but the client has none.
    #[error("Not authenticated")]
    MissingToken,
}

impl Error {
    /// Creates a status error.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code, if the service answered at all.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if the service asked the client to slow down.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(TOO_MANY_REQUESTS)
    }

    /// Returns true if the service rejected the credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::MissingToken) || self.status_code() == Some(401)
    }
}
