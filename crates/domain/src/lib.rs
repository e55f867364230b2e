//! Domain layer for the storefront checkout service.
//!
//! This crate provides the values that flow through checkout:
//! - Money, product ids and line items
//! - Customer contact/shipping details and their validation
//! - The client cart, with persistence behind [`CartStorage`]
//! - Order records and the order status lifecycle
//! - The metadata codec that carries a cart through the payment provider

pub mod cart;
pub mod customer;
pub mod error;
pub mod metadata;
pub mod order;
pub mod value_objects;

pub use cart::{Cart, CartError, CartSession, CartSnapshot, CartStorage, InMemoryCartStorage};
pub use customer::Customer;
pub use error::ValidationError;
pub use metadata::{CheckoutMetadata, Metadata, MetadataError};
pub use order::{NewOrder, Order, OrderError, OrderStatus};
pub use value_objects::{LineItem, Money, ProductId};
