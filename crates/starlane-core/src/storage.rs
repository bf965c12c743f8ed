//! Item containers and item arithmetic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::item_spec;
use crate::enums::ItemId;

/// Item amounts keyed by item id.
pub type ItemCollection = BTreeMap<ItemId, f64>;

/// Tolerance for item amount comparisons.
pub const ITEM_EPSILON: f64 = 1e-6;

/// A weight-limited item container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    /// Capacity in weight units.
    pub max: f64,
    pub items: ItemCollection,
}

impl Storage {
    pub fn new(max: f64) -> Self {
        Self {
            max,
            items: ItemCollection::new(),
        }
    }

    /// Weighted total of everything stored.
    pub fn total(&self) -> f64 {
        weighted_total(&self.items)
    }

    /// Remaining capacity in weight units, never negative.
    pub fn free(&self) -> f64 {
        (self.max - self.total()).max(0.0)
    }

    pub fn count(&self, item: ItemId) -> f64 {
        self.items.get(&item).copied().unwrap_or(0.0)
    }

    pub fn has_items(&self, wanted: &ItemCollection) -> bool {
        covers(&self.items, wanted)
    }

    /// Store up to `amount` of `item`, limited by free capacity. Returns the amount stored.
    pub fn add(&mut self, item: ItemId, amount: f64) -> f64 {
        let weight = item_spec(item).weight;
        let fits = if weight > 0.0 {
            self.free() / weight
        } else {
            amount
        };
        let stored = amount.min(fits).max(0.0);
        if stored > 0.0 {
            *self.items.entry(item).or_insert(0.0) += stored;
        }
        stored
    }

    /// Take up to `amount` of `item`. Returns the amount taken.
    pub fn remove(&mut self, item: ItemId, amount: f64) -> f64 {
        let held = self.count(item);
        let taken = amount.min(held).max(0.0);
        if taken > 0.0 {
            let left = held - taken;
            if left > ITEM_EPSILON {
                self.items.insert(item, left);
            } else {
                self.items.remove(&item);
            }
        }
        taken
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Sum of amount x weight.
pub fn weighted_total(items: &ItemCollection) -> f64 {
    items
        .iter()
        .map(|(item, amount)| amount * item_spec(*item).weight)
        .sum()
}

/// Whether `held` contains at least every amount listed in `wanted`.
pub fn covers(held: &ItemCollection, wanted: &ItemCollection) -> bool {
    wanted
        .iter()
        .all(|(item, amount)| held.get(item).copied().unwrap_or(0.0) + ITEM_EPSILON >= *amount)
}

/// Multiply every amount by `factor`.
pub fn scale_items(items: &ItemCollection, factor: f64) -> ItemCollection {
    items
        .iter()
        .map(|(item, amount)| (*item, amount * factor))
        .collect()
}

/// Build a collection from static recipe pairs.
pub fn collect_items(pairs: &[(ItemId, f64)]) -> ItemCollection {
    let mut items = ItemCollection::new();
    for (item, amount) in pairs {
        *items.entry(*item).or_insert(0.0) += amount;
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_respects_weight() {
        let mut storage = Storage::new(10.0);
        // minerals weigh 0.5, so 20 fit
        let stored = storage.add(ItemId::Minerals, 50.0);
        assert_eq!(stored, 20.0);
        assert_eq!(storage.free(), 0.0);
        assert_eq!(storage.add(ItemId::Metal, 1.0), 0.0, "full storage accepts nothing");
    }

    #[test]
    fn test_storage_remove_drops_empty_entries() {
        let mut storage = Storage::new(100.0);
        storage.add(ItemId::Metal, 5.0);
        assert_eq!(storage.remove(ItemId::Metal, 8.0), 5.0);
        assert!(storage.items.is_empty());
    }

    #[test]
    fn test_covers() {
        let held = collect_items(&[(ItemId::Metal, 10.0), (ItemId::Fuel, 2.0)]);
        assert!(covers(&held, &collect_items(&[(ItemId::Metal, 10.0)])));
        assert!(!covers(&held, &collect_items(&[(ItemId::Fuel, 3.0)])));
        assert!(!covers(&held, &collect_items(&[(ItemId::Minerals, 1.0)])));
    }
}
