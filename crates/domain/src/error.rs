//! Validation errors raised before any external call is made.

use thiserror::Error;

use crate::value_objects::Money;

/// Errors describing why a checkout request was rejected.
///
/// These are user-facing form errors and are never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The cart has no line items.
    #[error("Cart is empty")]
    EmptyCart,

    /// The total is zero or negative.
    #[error("Invalid total amount: {0} (must be greater than 0)")]
    NonPositiveTotal(Money),

    /// The submitted total disagrees with the line items.
    #[error("Total amount {submitted} does not match line items total {computed}")]
    TotalMismatch { submitted: Money, computed: Money },

    /// A required customer field is missing or blank.
    #[error("Missing required customer field: {0}")]
    MissingCustomerField(&'static str),

    /// The customer email is not a plausible address.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// A line item has no product id or name.
    #[error("Line item {index} is missing its {field}")]
    IncompleteLineItem { index: usize, field: &'static str },

    /// A line item quantity is zero.
    #[error("Invalid quantity for {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: String, quantity: u32 },

    /// A line item price is zero or negative.
    #[error("Invalid price for {product_id}: {price} (must be greater than 0)")]
    InvalidPrice { product_id: String, price: Money },

    /// A line total or the cart total does not fit in the money type.
    #[error("Amount out of range for {0}")]
    AmountOverflow(String),

    /// The encoded cart does not fit the provider's metadata limits.
    #[error("Checkout data too large for payment provider metadata: {0}")]
    MetadataTooLarge(String),
}
