use std::sync::Arc;

use async_trait::async_trait;
use domain::{LineItem, Metadata, Money};
use serde::Serialize;

use crate::{PaymentReference, Result, SessionId};

/// Payment state of a checkout session as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Created, not paid yet.
    Pending,

    /// Payment captured.
    Paid,

    /// Payment attempt declined.
    Failed,

    /// Session expired without payment.
    Expired,
}

impl PaymentStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything the provider needs to open a hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Amount to charge.
    pub total: Money,

    /// Items displayed on the checkout page.
    pub line_items: Vec<LineItem>,

    /// Prefills the provider's email field and receipts.
    pub customer_email: String,

    /// Opaque flat metadata echoed back on retrieval.
    pub metadata: Metadata,
}

/// Handle to a newly created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionHandle {
    pub id: SessionId,

    /// Hosted page to redirect the customer to, when the provider offers one.
    pub url: Option<String>,
}

/// Read-only view of a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub payment_status: PaymentStatus,

    /// Identifier of the captured payment. Present once paid.
    pub payment_reference: Option<PaymentReference>,

    /// Metadata exactly as stored at creation.
    pub metadata: Metadata,

    pub amount_total: Option<Money>,
    pub customer_email: Option<String>,
}

/// Trait for hosted-checkout payment providers.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a checkout session for the given amount and metadata.
    async fn create_session(&self, request: SessionRequest) -> Result<SessionHandle>;

    /// Retrieves a checkout session by id.
    ///
    /// Read-only; safe to call any number of times.
    async fn retrieve_session(&self, id: &SessionId) -> Result<SessionSnapshot>;
}

#[async_trait]
impl<T: PaymentProvider + ?Sized> PaymentProvider for Arc<T> {
    async fn create_session(&self, request: SessionRequest) -> Result<SessionHandle> {
        (**self).create_session(request).await
    }

    async fn retrieve_session(&self, id: &SessionId) -> Result<SessionSnapshot> {
        (**self).retrieve_session(id).await
    }
}
