//! Checkout error types.

use common::{OrderId, SessionId};
use domain::{MetadataError, OrderError, ValidationError};
use order_store::OrderStoreError;
use payments::{PaymentError, PaymentStatus};
use thiserror::Error;

/// Errors that can occur during checkout and reconciliation.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The checkout request was rejected before any provider call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No session id was supplied.
    #[error("Session id is required")]
    MissingSessionId,

    /// The session id contains characters no provider issues.
    #[error("Malformed session id")]
    MalformedSessionId(SessionId),

    /// The session exists but has not been paid.
    #[error("Payment not completed for session {session_id}: status is {status}")]
    PaymentNotCompleted {
        session_id: SessionId,
        status: PaymentStatus,
    },

    /// The provider does not know the session.
    #[error("Checkout session not found: {0}")]
    SessionNotFound(SessionId),

    /// The session expired without payment.
    #[error("Checkout session expired: {0}")]
    SessionExpired(SessionId),

    /// The provider could not be reached. Retriable.
    #[error("Payment provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider rejected the call.
    #[error("Payment provider error: {0}")]
    Provider(String),

    /// The provider reported a paid session without a payment identifier.
    #[error("Paid session {0} has no payment reference")]
    MissingPaymentReference(SessionId),

    /// The session metadata does not decode into a valid checkout.
    #[error("Invalid session metadata: {0}")]
    InvalidMetadata(#[from] MetadataError),

    /// Storing or reading orders failed. Retriable.
    #[error("Order persistence failed: {0}")]
    OrderPersistenceFailed(String),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The requested status change is not part of the order lifecycle.
    #[error("{0}")]
    InvalidTransition(OrderError),
}

impl CheckoutError {
    /// Returns true if the same request may succeed when retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CheckoutError::ProviderUnavailable(_) | CheckoutError::OrderPersistenceFailed(_)
        )
    }
}

impl From<PaymentError> for CheckoutError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::SessionNotFound(id) => CheckoutError::SessionNotFound(id),
            e if e.is_transient() => CheckoutError::ProviderUnavailable(e.to_string()),
            e => CheckoutError::Provider(e.to_string()),
        }
    }
}

impl From<OrderStoreError> for CheckoutError {
    fn from(err: OrderStoreError) -> Self {
        match err {
            OrderStoreError::OrderNotFound(id) => CheckoutError::OrderNotFound(id),
            OrderStoreError::Order(e @ OrderError::InvalidStatusTransition { .. }) => {
                CheckoutError::InvalidTransition(e)
            }
            e => CheckoutError::OrderPersistenceFailed(e.to_string()),
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
