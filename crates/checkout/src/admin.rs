//! Administrative order operations.

use common::OrderId;
use domain::{Order, OrderStatus};
use order_store::{OrderQuery, OrderStore, OrderStoreExt};

use crate::error::Result;
use crate::history::Page;

/// Back-office access to every order.
///
/// Status changes go through the order lifecycle; reconciliation never uses
/// this type.
#[derive(Debug, Clone)]
pub struct OrderAdmin<S> {
    store: S,
}

impl<S: OrderStore> OrderAdmin<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists orders newest first, optionally restricted to one status.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, status: Option<OrderStatus>, page: Page) -> Result<Vec<Order>> {
        let mut query = OrderQuery::new();
        if let Some(status) = status {
            query = query.status(status);
        }
        Ok(self.store.query(page.apply(query)).await?)
    }

    /// Fetches one order.
    pub async fn get(&self, id: OrderId) -> Result<Order> {
        Ok(self.store.get_existing(id).await?)
    }

    /// Moves an order along its lifecycle.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        let order = self.store.update_status(id, status).await.inspect_err(|e| {
            tracing::info!(error = %e, "status update rejected");
        })?;

        metrics::counter!("order_status_updates_total", "status" => status.as_str()).increment(1);
        tracing::info!(order_id = %order.id, status = %order.status, "order status updated");
        Ok(order)
    }
}
