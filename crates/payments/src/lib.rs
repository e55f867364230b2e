//! Payment provider integration.
//!
//! The checkout flow only needs two calls from a provider: create a hosted
//! checkout session carrying the cart as metadata, and read that session back
//! once the customer returns. [`PaymentProvider`] captures exactly that.
//!
//! - [`InMemoryPaymentProvider`] backs tests and local runs.
//! - [`StripePaymentProvider`] talks to Stripe Checkout over HTTPS.

pub mod error;
pub mod memory;
pub mod provider;
pub mod stripe;

pub use common::{PaymentReference, SessionId};
pub use error::{PaymentError, Result};
pub use memory::InMemoryPaymentProvider;
pub use provider::{PaymentProvider, PaymentStatus, SessionHandle, SessionRequest, SessionSnapshot};
pub use stripe::{StripeConfig, StripePaymentProvider};
