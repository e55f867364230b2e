use std::sync::Arc;

use async_trait::async_trait;
use domain::{NewOrder, Order, OrderStatus};

use crate::{OrderId, OrderQuery, OrderStoreError, PaymentReference, Result};

/// Core trait for order store implementations.
///
/// The store is the only place where "one order per payment reference" is
/// enforced. Implementations must reject a second insert for the same
/// reference atomically, even across processes, and report it as
/// [`OrderStoreError::DuplicatePaymentReference`].
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order with status `Processing`.
    ///
    /// Fails with `DuplicatePaymentReference` if an order already exists for
    /// the payment reference.
    async fn insert(&self, order: NewOrder) -> Result<Order>;

    /// Retrieves an order by id.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Retrieves the order recorded for a payment reference.
    async fn find_by_payment_reference(
        &self,
        payment_reference: &PaymentReference,
    ) -> Result<Option<Order>>;

    /// Retrieves orders matching a query, newest first.
    async fn query(&self, query: OrderQuery) -> Result<Vec<Order>>;

    /// Moves an order to a new status.
    ///
    /// The change is validated against the status lifecycle under the same
    /// lock or transaction that writes it.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order>;
}

#[async_trait]
impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    async fn insert(&self, order: NewOrder) -> Result<Order> {
        (**self).insert(order).await
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        (**self).get(id).await
    }

    async fn find_by_payment_reference(
        &self,
        payment_reference: &PaymentReference,
    ) -> Result<Option<Order>> {
        (**self).find_by_payment_reference(payment_reference).await
    }

    async fn query(&self, query: OrderQuery) -> Result<Vec<Order>> {
        (**self).query(query).await
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        (**self).update_status(id, status).await
    }
}

/// Result of [`OrderStoreExt::insert_or_get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// This call created the order.
    Inserted(Order),

    /// An order already existed for the payment reference.
    Existing(Order),
}

impl InsertOutcome {
    /// Returns the stored order regardless of who created it.
    pub fn order(&self) -> &Order {
        match self {
            InsertOutcome::Inserted(order) | InsertOutcome::Existing(order) => order,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            InsertOutcome::Inserted(order) | InsertOutcome::Existing(order) => order,
        }
    }
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Inserts the order, or returns the one already recorded for its payment
    /// reference.
    ///
    /// This is insert-then-catch-conflict, never check-then-insert: the
    /// lookup only runs after the store itself refused the duplicate.
    async fn insert_or_get(&self, order: NewOrder) -> Result<InsertOutcome> {
        let payment_reference = order.payment_reference.clone();
        match self.insert(order).await {
            Ok(order) => Ok(InsertOutcome::Inserted(order)),
            Err(OrderStoreError::DuplicatePaymentReference(_)) => {
                tracing::debug!(%payment_reference, "Order already recorded for payment");
                self.find_by_payment_reference(&payment_reference)
                    .await?
                    .map(InsertOutcome::Existing)
                    .ok_or_else(|| {
                        OrderStoreError::Unavailable(format!(
                            "order for payment reference {payment_reference} vanished after conflict"
                        ))
                    })
            }
            Err(e) => Err(e),
        }
    }

    /// Retrieves an order by id, failing with `OrderNotFound` if absent.
    async fn get_existing(&self, id: OrderId) -> Result<Order> {
        self.get(id).await?.ok_or(OrderStoreError::OrderNotFound(id))
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}
