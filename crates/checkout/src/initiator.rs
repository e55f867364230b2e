//! Checkout session initiation.

use domain::{CheckoutMetadata, Customer, LineItem, Money};
use payments::{PaymentProvider, SessionHandle, SessionRequest};

use crate::error::Result;

/// A cart submitted for payment together with the customer form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub items: Vec<LineItem>,

    /// Amount the client expects to pay.
    pub total: Money,

    pub customer: Customer,
}

/// Opens provider checkout sessions for validated carts.
///
/// The cart travels inside the session as metadata; nothing is stored
/// locally until the payment is confirmed.
#[derive(Debug, Clone)]
pub struct CheckoutInitiator<P> {
    provider: P,
}

impl<P: PaymentProvider> CheckoutInitiator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Validates the request and creates a provider session for it.
    ///
    /// Validation failures return before the provider is called.
    #[tracing::instrument(skip(self, request), fields(items = request.items.len(), total = %request.total))]
    pub async fn start(&self, request: CheckoutRequest) -> Result<SessionHandle> {
        let checkout = CheckoutMetadata::new(request.customer, request.items, request.total)
            .and_then(|checkout| checkout.encode().map(|metadata| (checkout, metadata)));

        let (checkout, metadata) = match checkout {
            Ok(validated) => validated,
            Err(e) => {
                metrics::counter!("checkout_sessions_total", "outcome" => "rejected").increment(1);
                tracing::info!(error = %e, "checkout request rejected");
                return Err(e.into());
            }
        };

        let session = SessionRequest {
            total: checkout.total,
            customer_email: checkout.customer.email.clone(),
            line_items: checkout.items,
            metadata,
        };

        let handle = self.provider.create_session(session).await.map_err(|e| {
            metrics::counter!("checkout_sessions_total", "outcome" => "provider_error")
                .increment(1);
            tracing::warn!(error = %e, "failed to create checkout session");
            e
        })?;

        metrics::counter!("checkout_sessions_total", "outcome" => "created").increment(1);
        tracing::info!(session_id = %handle.id, "checkout session created");
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use domain::ValidationError;
    use payments::InMemoryPaymentProvider;

    use super::*;
    use crate::CheckoutError;

    fn customer() -> Customer {
        Customer {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            address: "12 St James's Square".to_string(),
            city: "London".to_string(),
            postal_code: "SW1Y 4JH".to_string(),
            country: "UK".to_string(),
        }
    }

    #[tokio::test]
    async fn test_start_creates_session_with_metadata() {
        let provider = InMemoryPaymentProvider::new();
        let initiator = CheckoutInitiator::new(provider.clone());

        let handle = initiator
            .start(CheckoutRequest {
                items: vec![LineItem::new("p1", "Tee", 2, Money::from_dollars(40))],
                total: Money::from_dollars(80),
                customer: customer(),
            })
            .await
            .unwrap();

        let request = provider.request_for(&handle.id).await.unwrap();
        assert_eq!(request.total, Money::from_dollars(80));
        assert_eq!(request.customer_email, "ada@example.com");

        let decoded = CheckoutMetadata::decode(&request.metadata).unwrap();
        assert_eq!(decoded.items.len(), 1);
        assert_eq!(decoded.customer, customer());
    }

    #[tokio::test]
    async fn test_empty_cart_skips_provider() {
        let provider = InMemoryPaymentProvider::new();
        let initiator = CheckoutInitiator::new(provider.clone());

        let result = initiator
            .start(CheckoutRequest {
                items: vec![],
                total: Money::from_dollars(80),
                customer: customer(),
            })
            .await;

        assert!(matches!(
            result,
            Err(CheckoutError::Validation(ValidationError::EmptyCart))
        ));
        assert_eq!(provider.create_calls().await, 0);
    }

    #[tokio::test]
    async fn test_missing_customer_field_skips_provider() {
        let provider = InMemoryPaymentProvider::new();
        let initiator = CheckoutInitiator::new(provider.clone());
        let mut customer = customer();
        customer.postal_code = String::new();

        let result = initiator
            .start(CheckoutRequest {
                items: vec![LineItem::new("p1", "Tee", 1, Money::from_dollars(40))],
                total: Money::from_dollars(40),
                customer,
            })
            .await;

        assert!(matches!(
            result,
            Err(CheckoutError::Validation(
                ValidationError::MissingCustomerField(_)
            ))
        ));
        assert_eq!(provider.create_calls().await, 0);
    }

    #[tokio::test]
    async fn test_provider_outage_is_transient() {
        let provider = InMemoryPaymentProvider::new();
        provider.set_unavailable(true).await;
        let initiator = CheckoutInitiator::new(provider);

        let err = initiator
            .start(CheckoutRequest {
                items: vec![LineItem::new("p1", "Tee", 1, Money::from_dollars(40))],
                total: Money::from_dollars(40),
                customer: customer(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::ProviderUnavailable(_)));
        assert!(err.is_transient());
    }
}
