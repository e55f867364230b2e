//! Checkout and order reconciliation.
//!
//! The flow runs in one direction:
//!
//! ```text
//! Cart ──► CheckoutInitiator ──► (provider page) ──► PaymentVerifier ──► OrderReconciler
//!                                                                             │
//!                                                    OrderHistory ◄── orders ◄┘
//! ```
//!
//! Nothing is written to the order store before the provider reports the
//! session as paid. The store's uniqueness constraint on the payment
//! reference is what makes reconciliation safe to repeat.

pub mod admin;
pub mod error;
pub mod history;
pub mod initiator;
pub mod reconciler;
pub mod verifier;

pub use admin::OrderAdmin;
pub use error::{CheckoutError, Result};
pub use history::{OrderHistory, Page};
pub use initiator::{CheckoutInitiator, CheckoutRequest};
pub use reconciler::{OrderReconciler, ReconcileOutcome};
pub use verifier::{PaymentVerifier, VerifiedSession};
