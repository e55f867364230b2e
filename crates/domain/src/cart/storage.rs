//! Persistence seam for the client cart.

use std::sync::{Arc, Mutex};

use common::OrderId;
use serde::{Deserialize, Serialize};

use super::{Cart, CartError};

/// What a device keeps between page loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub cart: Cart,

    /// The last order the cart was cleared for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_order: Option<OrderId>,
}

/// Device-local storage for the cart.
///
/// Implementations store the snapshot however the device allows; the cart
/// logic never depends on a particular backend.
pub trait CartStorage: Send + Sync {
    /// Loads the stored snapshot, or an empty one if nothing is stored.
    fn load(&self) -> Result<CartSnapshot, CartError>;

    /// Replaces the stored snapshot.
    fn save(&self, snapshot: &CartSnapshot) -> Result<(), CartError>;
}

/// In-memory cart storage holding the snapshot as a JSON string, the way
/// browser local storage does.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl InMemoryCartStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw stored JSON, if any.
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl CartStorage for InMemoryCartStorage {
    fn load(&self) -> Result<CartSnapshot, CartError> {
        let slot = self
            .slot
            .lock()
            .map_err(|e| CartError::Storage(e.to_string()))?;
        match slot.as_deref() {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(CartSnapshot::default()),
        }
    }

    fn save(&self, snapshot: &CartSnapshot) -> Result<(), CartError> {
        let json = serde_json::to_string(snapshot)?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| CartError::Storage(e.to_string()))?;
        *slot = Some(json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{LineItem, Money};

    #[test]
    fn empty_storage_loads_empty_snapshot() {
        let storage = InMemoryCartStorage::new();
        assert_eq!(storage.load().unwrap(), CartSnapshot::default());
        assert!(storage.raw().is_none());
    }

    #[test]
    fn saved_snapshot_is_loaded_back() {
        let storage = InMemoryCartStorage::new();
        let snapshot = CartSnapshot {
            cart: Cart::from_items(vec![LineItem::new("p1", "Tee", 2, Money::from_cents(4000))]),
            completed_order: Some(OrderId::new()),
        };

        storage.save(&snapshot).unwrap();
        assert_eq!(storage.load().unwrap(), snapshot);
    }

    #[test]
    fn corrupt_storage_is_a_serialization_error() {
        let storage = InMemoryCartStorage::new();
        *storage.slot.lock().unwrap() = Some("not json".to_string());
        assert!(matches!(storage.load(), Err(CartError::Serialization(_))));
    }
}
