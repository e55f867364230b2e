//! Administrative order endpoints.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use checkout::Page;
use common::OrderId;
use domain::OrderStatus;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Admin;
use crate::error::ApiError;
use crate::routes::orders::OrderResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminListParams {
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

fn parse_status(raw: &str) -> Result<OrderStatus, ApiError> {
    OrderStatus::from_str(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    Uuid::parse_str(id)
        .map(OrderId::from_uuid)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))
}

/// GET /admin/orders
///
/// Every order, newest first.
#[tracing::instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Query(params): Query<AdminListParams>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let status = params.status.as_deref().map(parse_status).transpose()?;
    let page = Page {
        limit: params.limit,
        offset: params.offset,
    };

    let orders = state.admin.list(status, page).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /admin/orders/{id}
///
/// One order.
#[tracing::instrument(skip(state, _admin))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.admin.get(parse_order_id(&id)?).await?;
    Ok(Json(order.into()))
}

/// PUT /admin/orders/{id}/status
///
/// Move an order along its lifecycle.
#[tracing::instrument(skip(state, _admin, req))]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id = parse_order_id(&id)?;
    let status = parse_status(&req.status)?;

    let order = state.admin.update_status(id, status).await?;
    Ok(Json(order.into()))
}
