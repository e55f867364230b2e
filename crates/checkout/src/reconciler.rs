//! Exactly-once order creation from confirmed payments.

use std::time::Instant;

use common::{OrderId, SessionId};
use domain::NewOrder;
use order_store::{InsertOutcome, OrderStore, OrderStoreExt};
use payments::{PaymentProvider, PaymentStatus};

use crate::error::{CheckoutError, Result};
use crate::verifier::{PaymentVerifier, VerifiedSession};

/// Result of a successful reconciliation.
///
/// Both variants are success: the caller shows the order id and clears the
/// cart for that id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// This call recorded the order.
    Created(OrderId),

    /// The order was recorded earlier, possibly by a concurrent call.
    AlreadyExists(OrderId),
}

impl ReconcileOutcome {
    pub fn order_id(&self) -> OrderId {
        match self {
            ReconcileOutcome::Created(id) | ReconcileOutcome::AlreadyExists(id) => *id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, ReconcileOutcome::Created(_))
    }

    fn label(&self) -> &'static str {
        match self {
            ReconcileOutcome::Created(_) => "created",
            ReconcileOutcome::AlreadyExists(_) => "already_exists",
        }
    }
}

/// Turns paid checkout sessions into orders, at most one per payment.
///
/// There is no in-process locking. Two instances confirming the same session
/// race on the store's unique payment reference; the loser reads back the
/// winner's order.
#[derive(Debug, Clone)]
pub struct OrderReconciler<S, P> {
    store: S,
    verifier: PaymentVerifier<P>,
}

impl<S: OrderStore, P: PaymentProvider> OrderReconciler<S, P> {
    pub fn new(store: S, provider: P) -> Self {
        Self {
            store,
            verifier: PaymentVerifier::new(provider),
        }
    }

    /// Returns the verifier used by [`confirm`](Self::confirm).
    pub fn verifier(&self) -> &PaymentVerifier<P> {
        &self.verifier
    }

    /// Verifies the session with the provider, then reconciles it.
    ///
    /// An expired session is reported as `PaymentNotCompleted`.
    #[tracing::instrument(skip(self, session_id), fields(session_id = %session_id))]
    pub async fn confirm(&self, session_id: &SessionId) -> Result<ReconcileOutcome> {
        self.confirm_verified(session_id, None).await
    }

    /// Like [`confirm`](Self::confirm), for a signed-in customer. Sessions
    /// placed under another email are reported as not found and never
    /// reach the store.
    #[tracing::instrument(skip(self, session_id, email), fields(session_id = %session_id))]
    pub async fn confirm_for(
        &self,
        session_id: &SessionId,
        email: &str,
    ) -> Result<ReconcileOutcome> {
        self.confirm_verified(session_id, Some(email)).await
    }

    async fn confirm_verified(
        &self,
        session_id: &SessionId,
        owner: Option<&str>,
    ) -> Result<ReconcileOutcome> {
        let verified = match owner {
            Some(email) => self.verifier.verify_for(session_id, email).await,
            None => self.verifier.verify(session_id).await,
        };

        let session = match verified {
            Ok(session) => session,
            Err(CheckoutError::SessionExpired(session_id)) => {
                metrics::counter!("orders_reconciled_total", "outcome" => "not_paid").increment(1);
                return Err(CheckoutError::PaymentNotCompleted {
                    session_id,
                    status: PaymentStatus::Expired,
                });
            }
            Err(e) => return Err(e),
        };

        self.reconcile(session).await
    }

    /// Records the order for a verified session.
    ///
    /// Fails with `PaymentNotCompleted` without touching the store unless the
    /// session is paid. Safe to call repeatedly and concurrently for the same
    /// session.
    #[tracing::instrument(skip(self, session), fields(session_id = %session.session_id))]
    pub async fn reconcile(&self, session: VerifiedSession) -> Result<ReconcileOutcome> {
        let start = Instant::now();
        let result = self.reconcile_paid(session).await;

        let outcome = match &result {
            Ok(outcome) => outcome.label(),
            Err(CheckoutError::PaymentNotCompleted { .. }) => "not_paid",
            Err(_) => "failed",
        };
        metrics::counter!("orders_reconciled_total", "outcome" => outcome).increment(1);
        metrics::histogram!("reconcile_duration_seconds").record(start.elapsed().as_secs_f64());

        result
    }

    async fn reconcile_paid(&self, session: VerifiedSession) -> Result<ReconcileOutcome> {
        if !session.is_paid() {
            tracing::info!(status = %session.payment_status, "payment not completed");
            return Err(CheckoutError::PaymentNotCompleted {
                session_id: session.session_id,
                status: session.payment_status,
            });
        }

        let payment_reference = match session.payment_reference {
            Some(reference) if !reference.is_blank() => reference,
            _ => return Err(CheckoutError::MissingPaymentReference(session.session_id)),
        };

        let order = NewOrder::from_checkout(payment_reference, session.checkout);

        match self.store.insert_or_get(order).await {
            Ok(InsertOutcome::Inserted(order)) => {
                tracing::info!(
                    order_id = %order.id,
                    payment_reference = %order.payment_reference,
                    total = %order.total,
                    "order created"
                );
                Ok(ReconcileOutcome::Created(order.id))
            }
            Ok(InsertOutcome::Existing(order)) => {
                tracing::info!(
                    order_id = %order.id,
                    payment_reference = %order.payment_reference,
                    "order already recorded for payment"
                );
                Ok(ReconcileOutcome::AlreadyExists(order.id))
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to record order");
                Err(CheckoutError::OrderPersistenceFailed(e.to_string()))
            }
        }
    }
}
