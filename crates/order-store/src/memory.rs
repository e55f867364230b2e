use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use domain::{NewOrder, Order, OrderStatus};
use tokio::sync::RwLock;

use crate::{
    OrderId, OrderQuery, OrderStoreError, PaymentReference, Result, store::OrderStore,
};

#[derive(Default)]
struct State {
    orders: HashMap<OrderId, Order>,
    by_payment_reference: HashMap<PaymentReference, OrderId>,
    fail_on_insert: bool,
    fail_after_insert: bool,
}

/// In-memory order store implementation for testing and local runs.
///
/// The payment-reference index is checked and written under one write lock,
/// which gives the same guarantee as the unique constraint in PostgreSQL.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every insert fail before anything is written.
    pub async fn set_fail_on_insert(&self, fail: bool) {
        self.state.write().await.fail_on_insert = fail;
    }

    /// Makes inserts write the order and then report a failure, as when a
    /// commit lands but the acknowledgement is lost.
    pub async fn set_fail_after_insert(&self, fail: bool) {
        self.state.write().await.fail_after_insert = fail;
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Stores an order as-is, bypassing the insert path.
    ///
    /// Used to seed rows in states reconciliation never produces, such as
    /// legacy `Pending` orders.
    pub async fn seed(&self, order: Order) {
        let mut state = self.state.write().await;
        state
            .by_payment_reference
            .insert(order.payment_reference.clone(), order.id);
        state.orders.insert(order.id, order);
    }

    /// Clears all orders and failure flags.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = State::default();
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<Order> {
        let mut state = self.state.write().await;

        if state.fail_on_insert {
            return Err(OrderStoreError::Unavailable(
                "simulated insert failure".to_string(),
            ));
        }

        // Unique constraint simulation
        if state
            .by_payment_reference
            .contains_key(&order.payment_reference)
        {
            return Err(OrderStoreError::DuplicatePaymentReference(
                order.payment_reference,
            ));
        }

        let order = order.into_order();
        state
            .by_payment_reference
            .insert(order.payment_reference.clone(), order.id);
        state.orders.insert(order.id, order.clone());

        if state.fail_after_insert {
            return Err(OrderStoreError::Unavailable(
                "simulated lost acknowledgement".to_string(),
            ));
        }

        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn find_by_payment_reference(
        &self,
        payment_reference: &PaymentReference,
    ) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .by_payment_reference
            .get(payment_reference)
            .and_then(|id| state.orders.get(id))
            .cloned())
    }

    async fn query(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let state = self.state.read().await;

        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|order| query.matches(order))
            .cloned()
            .collect();

        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(&a.id.as_uuid()))
        });

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(orders.into_iter().skip(offset).take(limit).collect())
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        let mut state = self.state.write().await;

        let order = state
            .orders
            .get_mut(&id)
            .ok_or(OrderStoreError::OrderNotFound(id))?;

        order.status = order.status.transition_to(status)?;
        order.updated_at = Some(Utc::now());
        Ok(order.clone())
    }
}
