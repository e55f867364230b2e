use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    PaymentError, PaymentReference, Result, SessionId,
    provider::{PaymentProvider, PaymentStatus, SessionHandle, SessionRequest, SessionSnapshot},
};

#[derive(Debug, Clone)]
struct StoredSession {
    request: SessionRequest,
    status: PaymentStatus,
    payment_reference: Option<PaymentReference>,
}

#[derive(Debug, Default)]
struct InMemoryProviderState {
    sessions: HashMap<SessionId, StoredSession>,
    next_id: u32,
    create_calls: usize,
    retrieve_calls: usize,
    unavailable: bool,
}

/// In-memory payment provider for testing and local runs.
///
/// Sessions start `Pending`; tests drive them with [`mark_paid`],
/// [`mark_failed`] and [`mark_expired`] the way a customer and the provider
/// would.
///
/// [`mark_paid`]: InMemoryPaymentProvider::mark_paid
/// [`mark_failed`]: InMemoryPaymentProvider::mark_failed
/// [`mark_expired`]: InMemoryPaymentProvider::mark_expired
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentProvider {
    state: Arc<RwLock<InMemoryProviderState>>,
}

impl InMemoryPaymentProvider {
    /// Creates a new in-memory payment provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a provider outage for every call while set.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Records a successful payment. Returns false for an unknown session.
    pub async fn mark_paid(
        &self,
        id: &SessionId,
        payment_reference: impl Into<PaymentReference>,
    ) -> bool {
        let mut state = self.state.write().await;
        match state.sessions.get_mut(id) {
            Some(session) => {
                session.status = PaymentStatus::Paid;
                session.payment_reference = Some(payment_reference.into());
                true
            }
            None => false,
        }
    }

    /// Records a declined payment. Returns false for an unknown session.
    pub async fn mark_failed(&self, id: &SessionId) -> bool {
        self.set_status(id, PaymentStatus::Failed).await
    }

    /// Expires the session. Returns false for an unknown session.
    pub async fn mark_expired(&self, id: &SessionId) -> bool {
        self.set_status(id, PaymentStatus::Expired).await
    }

    /// Returns how many sessions were requested, including failed attempts.
    pub async fn create_calls(&self) -> usize {
        self.state.read().await.create_calls
    }

    /// Returns how many retrievals were requested.
    pub async fn retrieve_calls(&self) -> usize {
        self.state.read().await.retrieve_calls
    }

    /// Returns the number of sessions created.
    pub async fn session_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    /// Returns the request a session was created from.
    pub async fn request_for(&self, id: &SessionId) -> Option<SessionRequest> {
        self.state
            .read()
            .await
            .sessions
            .get(id)
            .map(|session| session.request.clone())
    }

    async fn set_status(&self, id: &SessionId, status: PaymentStatus) -> bool {
        let mut state = self.state.write().await;
        match state.sessions.get_mut(id) {
            Some(session) => {
                session.status = status;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl PaymentProvider for InMemoryPaymentProvider {
    async fn create_session(&self, request: SessionRequest) -> Result<SessionHandle> {
        let mut state = self.state.write().await;
        state.create_calls += 1;

        if state.unavailable {
            return Err(PaymentError::Unavailable(
                "simulated provider outage".to_string(),
            ));
        }

        state.next_id += 1;
        let id = SessionId::new(format!("cs_test_{:04}", state.next_id));
        state.sessions.insert(
            id.clone(),
            StoredSession {
                request,
                status: PaymentStatus::Pending,
                payment_reference: None,
            },
        );

        Ok(SessionHandle {
            url: Some(format!("https://checkout.invalid/pay/{id}")),
            id,
        })
    }

    async fn retrieve_session(&self, id: &SessionId) -> Result<SessionSnapshot> {
        let mut state = self.state.write().await;
        state.retrieve_calls += 1;

        if state.unavailable {
            return Err(PaymentError::Unavailable(
                "simulated provider outage".to_string(),
            ));
        }

        let session = state
            .sessions
            .get(id)
            .ok_or_else(|| PaymentError::SessionNotFound(id.clone()))?;

        Ok(SessionSnapshot {
            id: id.clone(),
            payment_status: session.status,
            payment_reference: session.payment_reference.clone(),
            metadata: session.request.metadata.clone(),
            amount_total: Some(session.request.total),
            customer_email: Some(session.request.customer_email.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use domain::{LineItem, Metadata, Money};

    use super::*;

    fn request() -> SessionRequest {
        let mut metadata = Metadata::new();
        metadata.insert("schema".to_string(), "1".to_string());
        SessionRequest {
            total: Money::from_dollars(80),
            line_items: vec![LineItem::new("p1", "Tee", 2, Money::from_dollars(40))],
            customer_email: "ada@example.com".to_string(),
            metadata,
        }
    }

    #[tokio::test]
    async fn test_create_and_retrieve() {
        let provider = InMemoryPaymentProvider::new();

        let handle = provider.create_session(request()).await.unwrap();
        assert_eq!(handle.id.as_str(), "cs_test_0001");
        assert!(handle.url.is_some());

        let snapshot = provider.retrieve_session(&handle.id).await.unwrap();
        assert_eq!(snapshot.payment_status, PaymentStatus::Pending);
        assert!(snapshot.payment_reference.is_none());
        assert_eq!(snapshot.metadata.get("schema").map(String::as_str), Some("1"));
        assert_eq!(snapshot.amount_total, Some(Money::from_dollars(80)));
    }

    #[tokio::test]
    async fn test_mark_paid_sets_reference() {
        let provider = InMemoryPaymentProvider::new();
        let handle = provider.create_session(request()).await.unwrap();

        assert!(provider.mark_paid(&handle.id, "pi_123").await);

        let snapshot = provider.retrieve_session(&handle.id).await.unwrap();
        assert!(snapshot.payment_status.is_paid());
        assert_eq!(
            snapshot.payment_reference,
            Some(PaymentReference::new("pi_123"))
        );
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let provider = InMemoryPaymentProvider::new();
        let result = provider.retrieve_session(&SessionId::new("cs_missing")).await;

        assert!(matches!(result, Err(PaymentError::SessionNotFound(_))));
        assert!(!provider.mark_paid(&SessionId::new("cs_missing"), "pi_1").await);
    }

    #[tokio::test]
    async fn test_outage_is_transient() {
        let provider = InMemoryPaymentProvider::new();
        provider.set_unavailable(true).await;

        let err = provider.create_session(request()).await.unwrap_err();

        assert!(err.is_transient());
        assert_eq!(provider.create_calls().await, 1);
        assert_eq!(provider.session_count().await, 0);
    }
}
