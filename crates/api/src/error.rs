//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// No usable credentials were supplied.
    Unauthorized(String),
    /// Credentials were supplied but are not accepted.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Checkout or order operation error.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::Validation(_)
        | CheckoutError::MissingSessionId
        | CheckoutError::MalformedSessionId(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        CheckoutError::PaymentNotCompleted { .. } => (StatusCode::PAYMENT_REQUIRED, err.to_string()),
        CheckoutError::SessionNotFound(_)
        | CheckoutError::SessionExpired(_)
        | CheckoutError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CheckoutError::InvalidTransition(_) => (StatusCode::CONFLICT, err.to_string()),
        CheckoutError::InvalidMetadata(_) => {
            tracing::error!(error = %err, "checkout session metadata rejected");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Checkout session data is invalid".to_string(),
            )
        }
        CheckoutError::ProviderUnavailable(_)
        | CheckoutError::Provider(_)
        | CheckoutError::MissingPaymentReference(_) => {
            tracing::error!(error = %err, "payment provider error");
            (
                StatusCode::BAD_GATEWAY,
                "Payment provider unavailable, please retry".to_string(),
            )
        }
        CheckoutError::OrderPersistenceFailed(_) => {
            tracing::error!(error = %err, "order persistence failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Order could not be saved, please retry".to_string(),
            )
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}
