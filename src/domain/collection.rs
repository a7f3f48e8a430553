//! Cart collection and its mutation rules.
//!
//! [`CartCollection`] is a plain value: every rule about quantities and
//! identity lives here, and the store only decides *when* to apply them.
//!
//! # Rules
//!
//! - Items are unique by `id`.
//! - Every item has `quantity >= 1`; an item whose quantity would reach zero
//!   is removed instead.
//! - New items are appended. Updated items keep their position.
//! - Every price is finite.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::domain::entities::{CartItem, NewCartItem};

/// Ordered set of cart items, unique by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartCollection {
    items: Vec<CartItem>,
}

impl CartCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from persisted records.
    ///
    /// Records with `quantity == 0` are dropped, and for repeated ids the
    /// first occurrence wins. Each dropped record is logged.
    pub fn from_records(records: Vec<CartItem>) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let mut items = Vec::with_capacity(records.len());

        for record in records {
            if record.quantity == 0 {
                warn!(id = %record.id, "Dropping persisted cart item with zero quantity");
                metrics::counter!("cart_restore_dropped_total").increment(1);
                continue;
            }
            if !seen.insert(record.id.clone()) {
                warn!(id = %record.id, "Dropping duplicate persisted cart item");
                metrics::counter!("cart_restore_dropped_total").increment(1);
                continue;
            }
            items.push(record);
        }

        Self { items }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks up an item by id.
    pub fn get(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Adds a product, merging with an existing line of the same id.
    ///
    /// An existing line takes the incoming title, image and price, and its
    /// quantity is carried forward plus one.
    ///
    /// Returns false, leaving the collection untouched, if the price is NaN
    /// or infinite, since such a cart could not be stored.
    pub fn add(&mut self, item: NewCartItem) -> bool {
        if !item.price.is_finite() {
            warn!(id = %item.id, price = item.price, "Rejected cart item with non-finite price");
            return false;
        }

        match self.position(&item.id) {
            Some(index) => {
                let quantity = self.items[index].quantity.saturating_add(1);
                self.items[index] = item.with_quantity(quantity);
            }
            None => self.items.push(item.with_quantity(1)),
        }
        true
    }

    /// Raises the quantity of `id` by one.
    ///
    /// Returns false if `id` is not in the cart or the quantity is saturated.
    pub fn increment(&mut self, id: &str) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };

        match self.items[index].quantity.checked_add(1) {
            Some(quantity) => {
                self.items[index].quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Lowers the quantity of `id` by one, removing the line at one.
    ///
    /// Returns false if `id` is not in the cart.
    pub fn decrement(&mut self, id: &str) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };

        if self.items[index].quantity > 1 {
            self.items[index].quantity -= 1;
        } else {
            self.items.remove(index);
        }
        true
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }
}

impl<'a> IntoIterator for &'a CartCollection {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Immutable view of the cart at one revision.
///
/// Revision 0 is the cart as restored at startup; every applied mutation
/// bumps it by one. Cloning is cheap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartSnapshot {
    pub revision: u64,
    pub cart: Arc<CartCollection>,
}
