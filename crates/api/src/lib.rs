//! HTTP API server for the storefront checkout service.
//!
//! Provides REST endpoints for checkout sessions, payment confirmation,
//! order history and order administration, with structured logging
//! (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::InMemoryOrderStore;
use payments::InMemoryPaymentProvider;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::{IdentityResolver, StaticTokenResolver};
use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    cors_origins: &[String],
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/checkout-session", post(routes::checkout::create_session))
        .route(
            "/verify-payment/{session_id}",
            get(routes::checkout::verify_payment),
        )
        .route("/create-order", post(routes::checkout::create_order))
        .route("/orders", get(routes::orders::list))
        .route("/admin/orders", get(routes::admin::list))
        .route("/admin/orders/{id}", get(routes::admin::get))
        .route("/admin/orders/{id}/status", put(routes::admin::update_status))
        .with_state(state)
        .merge(metrics_router)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Creates application state backed by the in-memory store and provider.
///
/// The store and provider are returned too so callers can drive payments
/// and inspect orders.
pub fn create_default_state(
    identity: impl IdentityResolver + 'static,
    admin_key: Option<secrecy::SecretString>,
) -> (Arc<AppState>, InMemoryOrderStore, InMemoryPaymentProvider) {
    let store = InMemoryOrderStore::new();
    let provider = InMemoryPaymentProvider::new();

    let state = AppState::new(
        Arc::new(store.clone()),
        Arc::new(provider.clone()),
        Arc::new(identity),
        admin_key,
    );

    (Arc::new(state), store, provider)
}

/// Creates a resolver from the configured static tokens.
pub fn static_identity(config: &config::Config) -> StaticTokenResolver {
    StaticTokenResolver::new(config.auth_tokens.clone())
}
