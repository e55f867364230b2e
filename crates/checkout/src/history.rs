//! Customer order history.

use domain::Order;
use order_store::{OrderQuery, OrderStore};
use serde::Deserialize;

use crate::error::Result;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: usize = 100;

/// Largest offset passed on to the store.
pub const MAX_OFFSET: usize = 1_000_000;

/// Optional pagination, as accepted in query strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Page {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Page {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// Applies the page to a query, capping the limit at [`MAX_PAGE_SIZE`]
    /// and the offset at [`MAX_OFFSET`].
    pub fn apply(self, mut query: OrderQuery) -> OrderQuery {
        query.limit = Some(self.limit.unwrap_or(MAX_PAGE_SIZE).min(MAX_PAGE_SIZE));
        query.offset = self.offset.map(|offset| offset.min(MAX_OFFSET));
        query
    }
}

/// Lists the orders a signed-in customer may see.
#[derive(Debug, Clone)]
pub struct OrderHistory<S> {
    store: S,
}

impl<S: OrderStore> OrderHistory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the customer's orders in visible statuses, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for(&self, email: &str, page: Page) -> Result<Vec<Order>> {
        if email.trim().is_empty() {
            return Ok(Vec::new());
        }

        let orders = self
            .store
            .query(page.apply(OrderQuery::visible_to(email)))
            .await?;

        tracing::debug!(count = orders.len(), "order history loaded");
        Ok(orders)
    }
}
