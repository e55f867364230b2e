//! Payment confirmation.

use common::{PaymentReference, SessionId};
use domain::{CheckoutMetadata, MetadataError};
use payments::{PaymentProvider, PaymentStatus};

use crate::error::{CheckoutError, Result};

/// A checkout session as confirmed by the provider, with its cart decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSession {
    pub session_id: SessionId,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<PaymentReference>,
    pub checkout: CheckoutMetadata,
}

impl VerifiedSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status.is_paid()
    }

    /// Returns true if the checkout was placed under `email`.
    pub fn belongs_to(&self, email: &str) -> bool {
        self.checkout.customer.has_email(email)
    }
}

/// Reads checkout sessions back from the provider.
///
/// Read-only: calling it any number of times has no effect on the provider
/// or on stored orders.
#[derive(Debug, Clone)]
pub struct PaymentVerifier<P> {
    provider: P,
}

impl<P: PaymentProvider> PaymentVerifier<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Retrieves the session and decodes the cart it carries.
    ///
    /// Expired sessions are reported as [`CheckoutError::SessionExpired`].
    #[tracing::instrument(skip(self, session_id), fields(session_id = %session_id))]
    pub async fn verify(&self, session_id: &SessionId) -> Result<VerifiedSession> {
        if session_id.is_blank() {
            return Err(CheckoutError::MissingSessionId);
        }
        if !session_id.is_well_formed() {
            return Err(CheckoutError::MalformedSessionId(session_id.clone()));
        }

        let snapshot = self.provider.retrieve_session(session_id).await?;

        if snapshot.payment_status == PaymentStatus::Expired {
            return Err(CheckoutError::SessionExpired(snapshot.id));
        }

        let checkout = CheckoutMetadata::decode(&snapshot.metadata).inspect_err(|e| {
            tracing::error!(error = %e, "checkout session carries invalid metadata");
        })?;

        if let Some(charged) = snapshot.amount_total
            && charged != checkout.total
        {
            tracing::error!(%charged, expected = %checkout.total, "session amount disagrees with metadata");
            return Err(MetadataError::InvalidValue {
                key: "total_cents".to_string(),
                reason: format!("provider charged {charged}, metadata says {}", checkout.total),
            }
            .into());
        }

        tracing::debug!(status = %snapshot.payment_status, "checkout session verified");

        Ok(VerifiedSession {
            session_id: snapshot.id,
            payment_status: snapshot.payment_status,
            payment_reference: snapshot.payment_reference,
            checkout,
        })
    }

    /// Like [`verify`](Self::verify), for a signed-in customer.
    ///
    /// A session placed under another email is reported as
    /// [`CheckoutError::SessionNotFound`] so its contents stay private.
    pub async fn verify_for(
        &self,
        session_id: &SessionId,
        email: &str,
    ) -> Result<VerifiedSession> {
        let session = self.verify(session_id).await?;
        if !session.belongs_to(email) {
            tracing::warn!(%session_id, "checkout session requested by another customer");
            return Err(CheckoutError::SessionNotFound(session_id.clone()));
        }
        Ok(session)
    }
}
