//! Checkout session, payment verification and order confirmation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::{CheckoutRequest, ReconcileOutcome, VerifiedSession};
use common::SessionId;
use domain::{Customer, LineItem, Money};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::error::ApiError;
use crate::routes::orders::{CustomerResponse, LineItemResponse};
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    pub items: Vec<CartItemRequest>,
    pub total_cents: i64,
    pub customer: CustomerRequest,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub quantity: u32,
    #[serde(default)]
    pub variant: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub session_id: String,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub session_id: String,
    pub payment_status: String,
    pub payment_reference: Option<String>,
    pub customer: CustomerResponse,
    pub items: Vec<LineItemResponse>,
    pub total_cents: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
}

impl From<CustomerRequest> for Customer {
    fn from(c: CustomerRequest) -> Self {
        Customer {
            name: c.name,
            email: c.email,
            address: c.address,
            city: c.city,
            postal_code: c.postal_code,
            country: c.country,
        }
    }
}

impl From<CartItemRequest> for LineItem {
    fn from(item: CartItemRequest) -> Self {
        let line = LineItem::new(
            item.id,
            item.name,
            item.quantity,
            Money::from_cents(item.price_cents),
        );
        match item.variant.filter(|v| !v.trim().is_empty()) {
            Some(variant) => line.with_variant(variant),
            None => line,
        }
    }
}

impl From<VerifiedSession> for VerifyPaymentResponse {
    fn from(session: VerifiedSession) -> Self {
        Self {
            session_id: session.session_id.to_string(),
            payment_status: session.payment_status.to_string(),
            payment_reference: session.payment_reference.map(|r| r.to_string()),
            customer: CustomerResponse::from(&session.checkout.customer),
            items: session
                .checkout
                .items
                .iter()
                .map(LineItemResponse::from)
                .collect(),
            total_cents: session.checkout.total.cents(),
        }
    }
}

// -- Handlers --

/// POST /checkout-session
///
/// Validate the cart and open a provider session.
#[tracing::instrument(skip(state, identity, req), fields(user = %identity.email))]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<CheckoutSessionRequest>,
) -> Result<Json<CheckoutSessionResponse>, ApiError> {
    let customer = Customer::from(req.customer);
    if !customer.email.trim().is_empty() && !customer.has_email(&identity.email) {
        return Err(ApiError::BadRequest(
            "Customer email must match the signed-in account".to_string(),
        ));
    }

    let request = CheckoutRequest {
        items: req.items.into_iter().map(LineItem::from).collect(),
        total: Money::from_cents(req.total_cents),
        customer,
    };

    let handle = state.initiator.start(request).await?;

    Ok(Json(CheckoutSessionResponse {
        session_id: handle.id.to_string(),
        url: handle.url,
    }))
}

/// GET /verify-payment/{session_id}
///
/// Report a session's payment status.
#[tracing::instrument(skip(state, identity), fields(user = %identity.email))]
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(session_id): Path<String>,
) -> Result<Json<VerifyPaymentResponse>, ApiError> {
    let session = state
        .reconciler
        .verifier()
        .verify_for(&SessionId::new(session_id), &identity.email)
        .await?;

    Ok(Json(session.into()))
}

/// POST /create-order
///
/// Record the order for a paid session.
///
/// Responds 200 when this call created the order and 409 with the same body
/// when it already existed; both carry the order id. Sessions placed by
/// another customer are reported as not found.
#[tracing::instrument(skip(state, identity, req), fields(user = %identity.email))]
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let outcome = state
        .reconciler
        .confirm_for(&SessionId::new(req.session_id), &identity.email)
        .await?;

    let status = match outcome {
        ReconcileOutcome::Created(_) => StatusCode::OK,
        ReconcileOutcome::AlreadyExists(_) => StatusCode::CONFLICT,
    };

    Ok((
        status,
        Json(CreateOrderResponse {
            order_id: outcome.order_id().to_string(),
        }),
    ))
}
