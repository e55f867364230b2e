//! Order records and their status lifecycle.

mod record;
mod status;

pub use record::{NewOrder, Order};
pub use status::OrderStatus;

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The requested status change is not part of the lifecycle.
    #[error("Invalid status transition: cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// A stored or submitted status string is not recognised.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}
