//! Per-event record of reserved inventory.

use std::collections::BTreeMap;

use serde::Serialize;

use eventdesk_core::{DomainError, DomainResult, ItemId};

/// Quantity of each inventory item reserved for one event.
///
/// Entries are always strictly positive; an entry that reaches zero is removed.
/// The mutators keep only this side of the books: the matching item counter is
/// moved by `eventdesk_inventory::AllocationEngine`, which is the only caller
/// that should use them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Allocations(BTreeMap<ItemId, u32>);

impl Allocations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted entries. Zero quantities and repeated keys are rejected.
    pub fn from_entries(entries: impl IntoIterator<Item = (ItemId, u32)>) -> DomainResult<Self> {
        let mut map = BTreeMap::new();
        for (item, qty) in entries {
            if qty == 0 {
                return Err(DomainError::validation(format!(
                    "allocation for item {item} must be positive"
                )));
            }
            if map.insert(item, qty).is_some() {
                return Err(DomainError::duplicate(format!(
                    "allocation for item {item} listed twice"
                )));
            }
        }
        Ok(Self(map))
    }

    /// Quantity reserved for `item` (0 if none).
    pub fn get(&self, item: ItemId) -> u32 {
        self.0.get(&item).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u32)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Add `qty` to the entry for `item`, creating it if absent.
    pub fn credit(&mut self, item: ItemId, qty: u32) {
        if qty == 0 {
            return;
        }
        *self.0.entry(item).or_insert(0) += qty;
    }

    /// Remove up to `qty` from the entry for `item`; returns the amount removed.
    pub fn debit(&mut self, item: ItemId, qty: u32) -> u32 {
        let Some(held) = self.0.get_mut(&item) else {
            return 0;
        };
        let actual = qty.min(*held);
        *held -= actual;
        if *held == 0 {
            self.0.remove(&item);
        }
        actual
    }

    /// Drop the entry for `item` entirely; returns what it held.
    pub fn forget(&mut self, item: ItemId) -> u32 {
        self.0.remove(&item).unwrap_or(0)
    }
}
