//! Stripe Checkout client.
//!
//! - Base URL: `https://api.stripe.com`
//! - Authentication: secret key as a bearer token
//! - Requests are form-encoded with Stripe's bracketed keys
//!   (`line_items[0][price_data][unit_amount]=4000`)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::{Metadata, Money};
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::{
    PaymentError, PaymentReference, Result, SessionId,
    provider::{PaymentProvider, PaymentStatus, SessionHandle, SessionRequest, SessionSnapshot},
};

/// Stripe API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.stripe.com";

/// Settings for the Stripe Checkout client.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: SecretString,
    pub base_url: String,

    /// Where Stripe sends the customer after paying. Stripe substitutes
    /// `{CHECKOUT_SESSION_ID}` in this URL.
    pub success_url: String,
    pub cancel_url: String,

    /// ISO currency code, lowercase.
    pub currency: String,

    /// Upper bound for each request, connect included.
    pub timeout: Duration,
}

impl StripeConfig {
    /// Creates a config with local redirect URLs, USD and a 10 second timeout.
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            secret_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            success_url: "http://localhost:3000/success?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "http://localhost:3000/cart".to_string(),
            currency: "usd".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Stripe Checkout implementation of [`PaymentProvider`].
#[derive(Clone)]
pub struct StripePaymentProvider {
    inner: Arc<StripeInner>,
}

struct StripeInner {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripePaymentProvider {
    /// Creates a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP client
    /// fails to build.
    pub fn new(config: StripeConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth_value = HeaderValue::from_str(&auth_value)
            .map_err(|e| PaymentError::Configuration(format!("Invalid secret key format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(StripeInner { client, config }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.config.base_url.trim_end_matches('/'))
    }

    /// URL of one checkout session. The id is appended as a single
    /// percent-encoded path segment and must be well formed.
    fn session_url(&self, id: &SessionId) -> Result<Url> {
        if !id.is_well_formed() {
            tracing::warn!(session_id = %id, "refusing malformed session id");
            return Err(PaymentError::SessionNotFound(id.clone()));
        }

        let mut url = Url::parse(&self.url("/v1/checkout/sessions"))
            .map_err(|e| PaymentError::Configuration(format!("Invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| PaymentError::Configuration("Base URL cannot hold a path".to_string()))?
            .push(id.as_str());
        Ok(url)
    }

    async fn read_session(
        &self,
        response: reqwest::Response,
        id: Option<&SessionId>,
    ) -> Result<StripeSession> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| PaymentError::Parse(format!("Failed to parse session: {e}")));
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(error_for_status(status.as_u16(), &body, id))
    }
}

impl std::fmt::Debug for StripePaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripePaymentProvider")
            .field("base_url", &self.inner.config.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PaymentProvider for StripePaymentProvider {
    #[tracing::instrument(skip(self, request), fields(total = %request.total))]
    async fn create_session(&self, request: SessionRequest) -> Result<SessionHandle> {
        let form = session_form(&self.inner.config, &request);
        let response = self
            .inner
            .client
            .post(self.url("/v1/checkout/sessions"))
            .form(&form)
            .send()
            .await?;

        let session = self.read_session(response, None).await?;
        tracing::info!(session_id = %session.id, "Stripe checkout session created");

        Ok(SessionHandle {
            id: SessionId::new(session.id),
            url: session.url,
        })
    }

    #[tracing::instrument(skip(self, id), fields(session_id = %id))]
    async fn retrieve_session(&self, id: &SessionId) -> Result<SessionSnapshot> {
        let response = self
            .inner
            .client
            .get(self.session_url(id)?)
            .query(&[("expand[]", "payment_intent")])
            .send()
            .await?;

        let session = self.read_session(response, Some(id)).await?;
        Ok(session.into_snapshot())
    }
}

/// Builds the form body for `POST /v1/checkout/sessions`.
pub(crate) fn session_form(config: &StripeConfig, request: &SessionRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("success_url".to_string(), config.success_url.clone()),
        ("cancel_url".to_string(), config.cancel_url.clone()),
        ("customer_email".to_string(), request.customer_email.clone()),
    ];

    for (i, item) in request.line_items.iter().enumerate() {
        let name = match &item.variant {
            Some(variant) => format!("{} ({variant})", item.product_name),
            None => item.product_name.clone(),
        };
        let prefix = format!("line_items[{i}]");
        form.push((
            format!("{prefix}[price_data][currency]"),
            config.currency.clone(),
        ));
        form.push((format!("{prefix}[price_data][product_data][name]"), name));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            item.unit_price.cents().to_string(),
        ));
        form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
    }

    for (key, value) in &request.metadata {
        form.push((format!("metadata[{key}]"), value.clone()));
    }

    form
}

/// Maps a non-success Stripe response to a [`PaymentError`].
pub(crate) fn error_for_status(status: u16, body: &str, id: Option<&SessionId>) -> PaymentError {
    let message = serde_json::from_str::<StripeErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| body.to_string());

    match (status, id) {
        (404, Some(id)) => PaymentError::SessionNotFound(id.clone()),
        (429, _) | (500..=599, _) => PaymentError::Unavailable(format!("{status}: {message}")),
        _ => PaymentError::Api { status, message },
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// A field Stripe returns either as an id or as an expanded object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    fn into_id(self) -> String {
        match self {
            Expandable::Id(id) | Expandable::Object { id } => id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    email: Option<String>,
}

/// The parts of a Stripe Checkout Session object we read.
#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    #[serde(default)]
    status: Option<String>,
    payment_status: String,
    #[serde(default)]
    payment_intent: Option<Expandable>,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    customer_details: Option<CustomerDetails>,
    #[serde(default)]
    url: Option<String>,
}

impl StripeSession {
    fn into_snapshot(self) -> SessionSnapshot {
        let payment_status = match (self.status.as_deref(), self.payment_status.as_str()) {
            (_, "paid") | (_, "no_payment_required") => PaymentStatus::Paid,
            (Some("expired"), _) => PaymentStatus::Expired,
            _ => PaymentStatus::Pending,
        };

        // Sessions that needed no payment carry no intent; the session id is
        // then the only stable reference.
        let payment_reference = match self.payment_intent {
            Some(intent) => Some(PaymentReference::new(intent.into_id())),
            None if payment_status.is_paid() => Some(PaymentReference::new(self.id.clone())),
            None => None,
        };

        let customer_email = self
            .customer_email
            .or_else(|| self.customer_details.and_then(|details| details.email));

        SessionSnapshot {
            id: SessionId::new(self.id),
            payment_status,
            payment_reference,
            metadata: self.metadata,
            amount_total: self.amount_total.map(Money::from_cents),
            customer_email,
        }
    }
}
