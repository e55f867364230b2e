use thiserror::Error;

use crate::SessionId;

/// Errors that can occur when talking to a payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The provider does not know this session.
    #[error("Checkout session not found: {0}")]
    SessionNotFound(SessionId),

    /// The provider is down, overloaded or rate limiting.
    #[error("Payment provider unavailable: {0}")]
    Unavailable(String),

    /// HTTP request failed, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the request.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The provider answered with something we could not read.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The client could not be configured.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PaymentError {
    /// Returns true if retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PaymentError::Unavailable(_) | PaymentError::Http(_))
    }
}

/// Result type for payment provider operations.
pub type Result<T> = std::result::Result<T, PaymentError>;
