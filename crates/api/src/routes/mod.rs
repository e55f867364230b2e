pub mod admin;
pub mod checkout;
pub mod health;
pub mod metrics;
pub mod orders;
