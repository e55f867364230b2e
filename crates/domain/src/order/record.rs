//! Durable order records.

use chrono::{DateTime, Utc};
use common::{OrderId, PaymentReference};
use serde::{Deserialize, Serialize};

use crate::customer::Customer;
use crate::metadata::CheckoutMetadata;
use crate::value_objects::{LineItem, Money};

use super::OrderStatus;

/// The durable record of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Generated order identifier.
    pub id: OrderId,

    /// Provider payment identifier; unique across orders.
    pub payment_reference: PaymentReference,

    /// Contact and shipping snapshot taken at checkout.
    pub customer: Customer,

    /// Items as captured when the checkout session was created.
    pub items: Vec<LineItem>,

    /// Sum of `unit_price * quantity` over `items`.
    pub total: Money,

    pub status: OrderStatus,

    pub created_at: DateTime<Utc>,

    /// Set by administrative status updates.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns the number of units across all line items.
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// An order that has not been persisted yet.
///
/// Built only from a confirmed payment; the store assigns nothing, so the id
/// and timestamp are fixed here and survive a retried insert unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub id: OrderId,
    pub payment_reference: PaymentReference,
    pub customer: Customer,
    pub items: Vec<LineItem>,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Builds an order from decoded checkout metadata.
    pub fn from_checkout(payment_reference: PaymentReference, checkout: CheckoutMetadata) -> Self {
        let CheckoutMetadata {
            customer,
            items,
            total,
        } = checkout;

        Self {
            id: OrderId::new(),
            payment_reference,
            customer: customer.normalized(),
            items,
            total,
            created_at: Utc::now(),
        }
    }

    /// Materializes the record as stored: status `Processing`, never updated.
    pub fn into_order(self) -> Order {
        Order {
            id: self.id,
            payment_reference: self.payment_reference,
            customer: self.customer,
            items: self.items,
            total: self.total,
            status: OrderStatus::Processing,
            created_at: self.created_at,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkout() -> CheckoutMetadata {
        CheckoutMetadata::new(
            Customer {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                address: "1 Row".to_string(),
                city: "London".to_string(),
                postal_code: "N1".to_string(),
                country: "UK".to_string(),
            },
            vec![
                LineItem::new("p1", "Tee", 2, Money::from_dollars(40)).with_variant("M"),
                LineItem::new("p2", "Cap", 1, Money::from_cents(1550)),
            ],
            Money::from_cents(9550),
        )
        .unwrap()
    }

    #[test]
    fn new_order_materializes_as_processing() {
        let order = NewOrder::from_checkout(PaymentReference::new("pi_123"), checkout());
        let id = order.id;
        let stored = order.into_order();

        assert_eq!(stored.id, id);
        assert_eq!(stored.status, OrderStatus::Processing);
        assert_eq!(stored.payment_reference.as_str(), "pi_123");
        assert_eq!(stored.total, Money::from_cents(9550));
        assert_eq!(stored.unit_count(), 3);
        assert!(stored.updated_at.is_none());
    }
}
