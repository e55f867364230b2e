//! Client cart: an explicit value object with injected persistence.

mod session;
mod storage;

pub use session::CartSession;
pub use storage::{CartSnapshot, CartStorage, InMemoryCartStorage};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::customer::Customer;
use crate::error::ValidationError;
use crate::metadata::CheckoutMetadata;
use crate::value_objects::{LineItem, Money, ProductId};

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// No line item matches the product and variant.
    #[error("Item not in cart: {product_id}")]
    ItemNotFound { product_id: String },

    /// Items must be added with a quantity of at least one.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// The storage backend failed.
    #[error("Cart storage error: {0}")]
    Storage(String),

    /// The stored cart could not be (de)serialized.
    #[error("Cart serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Line items held by the client before checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cart holding the given items.
    pub fn from_items(items: Vec<LineItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of distinct product/variant lines.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the number of units across all lines.
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, item| count.saturating_add(item.quantity))
    }

    /// Returns the sum of `unit_price * quantity` over all lines.
    pub fn total(&self) -> Money {
        self.items.iter().map(LineItem::total_price).sum()
    }

    /// Adds an item, merging with an existing line for the same product and variant.
    ///
    /// A merged line keeps its original price snapshot.
    pub fn add(&mut self, item: LineItem) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Err(CartError::InvalidQuantity {
                quantity: item.quantity,
            });
        }

        match self.find_mut(&item.product_id, item.variant.as_deref()) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => self.items.push(item),
        }
        Ok(())
    }

    /// Increases a line's quantity by one.
    pub fn increment(
        &mut self,
        product_id: &ProductId,
        variant: Option<&str>,
    ) -> Result<u32, CartError> {
        let item = self.get_mut(product_id, variant)?;
        item.quantity = item.quantity.saturating_add(1);
        Ok(item.quantity)
    }

    /// Decreases a line's quantity by one, never below one.
    pub fn decrement(
        &mut self,
        product_id: &ProductId,
        variant: Option<&str>,
    ) -> Result<u32, CartError> {
        let item = self.get_mut(product_id, variant)?;
        item.quantity = item.quantity.saturating_sub(1).max(1);
        Ok(item.quantity)
    }

    /// Removes a line entirely.
    pub fn remove(
        &mut self,
        product_id: &ProductId,
        variant: Option<&str>,
    ) -> Result<LineItem, CartError> {
        let index = self
            .items
            .iter()
            .position(|item| item.same_product(product_id, variant))
            .ok_or_else(|| CartError::ItemNotFound {
                product_id: product_id.to_string(),
            })?;
        Ok(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Snapshots the cart for checkout, charging exactly the cart total.
    pub fn checkout(&self, customer: Customer) -> Result<CheckoutMetadata, ValidationError> {
        CheckoutMetadata::new(customer, self.items.clone(), self.total())
    }

    fn find_mut(&mut self, product_id: &ProductId, variant: Option<&str>) -> Option<&mut LineItem> {
        self.items
            .iter_mut()
            .find(|item| item.same_product(product_id, variant))
    }

    fn get_mut(
        &mut self,
        product_id: &ProductId,
        variant: Option<&str>,
    ) -> Result<&mut LineItem, CartError> {
        self.find_mut(product_id, variant)
            .ok_or_else(|| CartError::ItemNotFound {
                product_id: product_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tee(size: &str) -> LineItem {
        LineItem::new("p1", "Kronos Tee", 1, Money::from_dollars(40)).with_variant(size)
    }

    #[test]
    fn add_merges_same_product_and_variant() {
        let mut cart = Cart::new();
        cart.add(tee("M")).unwrap();
        cart.add(tee("M")).unwrap();
        cart.add(tee("L")).unwrap();

        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.total(), Money::from_dollars(120));
    }

    #[test]
    fn merge_keeps_original_price_snapshot() {
        let mut cart = Cart::new();
        cart.add(tee("M")).unwrap();
        let mut repriced = tee("M");
        repriced.unit_price = Money::from_dollars(55);
        cart.add(repriced).unwrap();

        assert_eq!(cart.items()[0].unit_price, Money::from_dollars(40));
        assert_eq!(cart.total(), Money::from_dollars(80));
    }

    #[test]
    fn add_rejects_zero_quantity() {
        let mut cart = Cart::new();
        let mut item = tee("M");
        item.quantity = 0;
        assert!(matches!(
            cart.add(item),
            Err(CartError::InvalidQuantity { quantity: 0 })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn quantities_saturate_instead_of_wrapping() {
        let mut cart = Cart::new();
        let mut bulk = tee("M");
        bulk.quantity = u32::MAX;
        cart.add(bulk).unwrap();
        cart.add(tee("M")).unwrap();
        cart.add(tee("L")).unwrap();

        let p1 = ProductId::new("p1");
        assert_eq!(cart.increment(&p1, Some("M")).unwrap(), u32::MAX);
        assert_eq!(cart.items()[0].quantity, u32::MAX);
        assert_eq!(cart.item_count(), u32::MAX);
    }

    #[test]
    fn decrement_stops_at_one() {
        let mut cart = Cart::new();
        cart.add(tee("M")).unwrap();
        let p1 = ProductId::new("p1");

        assert_eq!(cart.increment(&p1, Some("M")).unwrap(), 2);
        assert_eq!(cart.decrement(&p1, Some("M")).unwrap(), 1);
        assert_eq!(cart.decrement(&p1, Some("M")).unwrap(), 1);
    }

    #[test]
    fn unknown_line_is_reported() {
        let mut cart = Cart::new();
        cart.add(tee("M")).unwrap();
        let p1 = ProductId::new("p1");

        assert!(matches!(
            cart.increment(&p1, Some("XL")),
            Err(CartError::ItemNotFound { .. })
        ));
        assert!(matches!(
            cart.remove(&ProductId::new("p9"), None),
            Err(CartError::ItemNotFound { .. })
        ));
    }

    #[test]
    fn remove_drops_only_that_variant() {
        let mut cart = Cart::new();
        cart.add(tee("M")).unwrap();
        cart.add(tee("L")).unwrap();

        let removed = cart.remove(&ProductId::new("p1"), Some("M")).unwrap();
        assert_eq!(removed.variant.as_deref(), Some("M"));
        assert_eq!(cart.line_count(), 1);
    }

    #[test]
    fn checkout_snapshot_charges_cart_total() {
        let mut cart = Cart::new();
        cart.add(tee("M")).unwrap();
        cart.add(tee("M")).unwrap();

        let customer = Customer {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            address: "1 Row".to_string(),
            city: "London".to_string(),
            postal_code: "N1".to_string(),
            country: "UK".to_string(),
        };
        let checkout = cart.checkout(customer).unwrap();
        assert_eq!(checkout.total, Money::from_dollars(80));
        assert_eq!(checkout.items, cart.items());
    }

    #[test]
    fn empty_cart_cannot_check_out() {
        assert_eq!(
            Cart::new().checkout(Customer::default()),
            Err(ValidationError::EmptyCart)
        );
    }
}
