//! Shared application state.

use std::sync::Arc;

use checkout::{CheckoutInitiator, OrderAdmin, OrderHistory, OrderReconciler};
use order_store::OrderStore;
use payments::PaymentProvider;
use secrecy::SecretString;

use crate::auth::IdentityResolver;

/// Order store chosen at startup.
pub type SharedOrderStore = Arc<dyn OrderStore>;

/// Payment provider chosen at startup.
pub type SharedPaymentProvider = Arc<dyn PaymentProvider>;

/// Which implementations are serving requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backends {
    pub store: &'static str,
    pub provider: &'static str,
}

impl Default for Backends {
    fn default() -> Self {
        Self {
            store: "memory",
            provider: "memory",
        }
    }
}

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub initiator: CheckoutInitiator<SharedPaymentProvider>,
    pub reconciler: OrderReconciler<SharedOrderStore, SharedPaymentProvider>,
    pub history: OrderHistory<SharedOrderStore>,
    pub admin: OrderAdmin<SharedOrderStore>,
    pub identity: Arc<dyn IdentityResolver>,

    /// Admin endpoints are disabled when unset.
    pub admin_key: Option<SecretString>,

    pub backends: Backends,
}

impl AppState {
    /// Builds the checkout services over one store and one provider.
    pub fn new(
        store: SharedOrderStore,
        provider: SharedPaymentProvider,
        identity: Arc<dyn IdentityResolver>,
        admin_key: Option<SecretString>,
    ) -> Self {
        Self {
            initiator: CheckoutInitiator::new(provider.clone()),
            reconciler: OrderReconciler::new(store.clone(), provider),
            history: OrderHistory::new(store.clone()),
            admin: OrderAdmin::new(store),
            identity,
            admin_key,
            backends: Backends::default(),
        }
    }
}

impl AppState {
    /// Records which backends were selected, for the health endpoint.
    pub fn with_backends(mut self, backends: Backends) -> Self {
        self.backends = backends;
        self
    }
}
