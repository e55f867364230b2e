//! Cart mutations bound to a storage backend.

use common::OrderId;

use crate::customer::Customer;
use crate::error::ValidationError;
use crate::metadata::CheckoutMetadata;
use crate::value_objects::{LineItem, ProductId};

use super::{Cart, CartError, CartSnapshot, CartStorage};

/// A cart loaded from storage; every mutation is written back.
pub struct CartSession<S: CartStorage> {
    storage: S,
    snapshot: CartSnapshot,
}

impl<S: CartStorage> CartSession<S> {
    /// Loads the cart from storage.
    pub fn open(storage: S) -> Result<Self, CartError> {
        let snapshot = storage.load()?;
        Ok(Self { storage, snapshot })
    }

    pub fn cart(&self) -> &Cart {
        &self.snapshot.cart
    }

    /// The last order this cart was cleared for.
    pub fn completed_order(&self) -> Option<OrderId> {
        self.snapshot.completed_order
    }

    pub fn add(&mut self, item: LineItem) -> Result<(), CartError> {
        self.snapshot.cart.add(item)?;
        self.persist()
    }

    pub fn increment(
        &mut self,
        product_id: &ProductId,
        variant: Option<&str>,
    ) -> Result<u32, CartError> {
        let quantity = self.snapshot.cart.increment(product_id, variant)?;
        self.persist()?;
        Ok(quantity)
    }

    pub fn decrement(
        &mut self,
        product_id: &ProductId,
        variant: Option<&str>,
    ) -> Result<u32, CartError> {
        let quantity = self.snapshot.cart.decrement(product_id, variant)?;
        self.persist()?;
        Ok(quantity)
    }

    pub fn remove(
        &mut self,
        product_id: &ProductId,
        variant: Option<&str>,
    ) -> Result<LineItem, CartError> {
        let removed = self.snapshot.cart.remove(product_id, variant)?;
        self.persist()?;
        Ok(removed)
    }

    /// Empties the cart on explicit user request.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.snapshot.cart.clear();
        self.persist()
    }

    /// Snapshots the cart for checkout.
    pub fn checkout(&self, customer: Customer) -> Result<CheckoutMetadata, ValidationError> {
        self.snapshot.cart.checkout(customer)
    }

    /// Clears the cart after an order was confirmed.
    ///
    /// Only the first call for a given order clears anything, so reloading
    /// the confirmation page never wipes items added after the purchase.
    /// Returns true if the cart was cleared by this call.
    pub fn complete_order(&mut self, order_id: OrderId) -> Result<bool, CartError> {
        if self.snapshot.completed_order == Some(order_id) {
            tracing::debug!(%order_id, "cart already cleared for order");
            return Ok(false);
        }

        self.snapshot.cart.clear();
        self.snapshot.completed_order = Some(order_id);
        self.persist()?;
        tracing::debug!(%order_id, "cart cleared after order");
        Ok(true)
    }

    fn persist(&self) -> Result<(), CartError> {
        self.storage.save(&self.snapshot)
    }
}
