//! Prometheus scrape endpoint and metric descriptions.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use metrics::{Unit, describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusHandle;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Registers help text for the metrics the checkout services emit.
pub fn describe() {
    describe_counter!(
        "checkout_sessions_total",
        "Checkout session requests by outcome"
    );
    describe_counter!(
        "orders_reconciled_total",
        "Paid sessions reconciled into orders by outcome"
    );
    describe_histogram!(
        "reconcile_duration_seconds",
        Unit::Seconds,
        "Time spent verifying a session and recording its order"
    );
    describe_counter!(
        "order_status_updates_total",
        "Administrative order status changes by target status"
    );
}

/// GET /metrics
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    ([(CONTENT_TYPE, PROMETHEUS_TEXT)], handle.render())
}
