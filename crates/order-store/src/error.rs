use domain::OrderError;
use thiserror::Error;

use crate::{OrderId, PaymentReference};

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum OrderStoreError {
    /// An order already exists for this payment reference.
    #[error("Order already exists for payment reference {0}")]
    DuplicatePaymentReference(PaymentReference),

    /// The order was not found in the store.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order rejected the requested change, or a stored status is unreadable.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// The store cannot be reached.
    #[error("Order store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, OrderStoreError>;
