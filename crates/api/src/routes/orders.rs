//! Customer order history endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use checkout::Page;
use domain::{Customer, LineItem, Order};
use serde::Serialize;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::state::AppState;

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub payment_reference: String,
    pub status: String,
    pub customer: CustomerResponse,
    pub items: Vec<LineItemResponse>,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub variant: Option<String>,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl From<&Customer> for CustomerResponse {
    fn from(c: &Customer) -> Self {
        Self {
            name: c.name.clone(),
            email: c.email.clone(),
            address: c.address.clone(),
            city: c.city.clone(),
            postal_code: c.postal_code.clone(),
            country: c.country.clone(),
        }
    }
}

impl From<&LineItem> for LineItemResponse {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            product_name: item.product_name.clone(),
            variant: item.variant.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            payment_reference: order.payment_reference.to_string(),
            status: order.status.to_string(),
            customer: CustomerResponse::from(&order.customer),
            items: order.items.iter().map(LineItemResponse::from).collect(),
            total_cents: order.total.cents(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

// -- Handlers --

/// GET /orders
///
/// The caller's orders, newest first.
#[tracing::instrument(skip(state, identity), fields(user = %identity.email))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Query(page): Query<Page>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.history.orders_for(&identity.email, page).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}
