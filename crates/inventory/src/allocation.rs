//! Reservation of inventory by events.
//!
//! Every unit reserved for an event is recorded twice: once in the event's
//! allocation map and once in the item's `allocated_quantity`. The functions
//! here move both sides together, so for every item
//!
//! ```text
//! item.allocated_quantity == Σ over events of event.allocations[item.id]
//! ```
//!
//! holds after every call. Nothing else in the workspace should touch either
//! counter.

use std::collections::BTreeMap;

use eventdesk_core::{DomainError, DomainResult, Entity, EventId, ItemId};
use eventdesk_events::Event;

use crate::InventoryItem;

/// Resolve an item by id for bulk operations.
pub trait ItemLookup {
    fn item_mut(&mut self, id: ItemId) -> Option<&mut InventoryItem>;
}

impl ItemLookup for [InventoryItem] {
    fn item_mut(&mut self, id: ItemId) -> Option<&mut InventoryItem> {
        self.iter_mut().find(|item| item.id() == id)
    }
}

impl ItemLookup for Vec<InventoryItem> {
    fn item_mut(&mut self, id: ItemId) -> Option<&mut InventoryItem> {
        self.as_mut_slice().item_mut(id)
    }
}

/// What load-time reconciliation had to repair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Allocation entries dropped because their item does not exist: (event, item, qty).
    pub dangling: Vec<(EventId, ItemId, u32)>,
    /// Items whose stored counter disagreed with the events: (item, stored, recomputed).
    pub corrected: Vec<(ItemId, u32, u32)>,
    /// Items whose total had to be raised to cover what events hold.
    pub raised_totals: Vec<ItemId>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty() && self.corrected.is_empty() && self.raised_totals.is_empty()
    }
}

/// Sole mutator of allocation state.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationEngine;

impl AllocationEngine {
    /// Reserve `qty` units of `item` for `event`.
    ///
    /// Fails with `Validation` for a non-positive quantity and with
    /// `InsufficientInventory` when fewer than `qty` units are available.
    /// On failure nothing changes.
    pub fn allocate(item: &mut InventoryItem, event: &mut Event, qty: i64) -> DomainResult<()> {
        let available = item.available_quantity();
        let qty = requested(qty)?;
        let Ok(qty) = u32::try_from(qty) else {
            return Err(DomainError::insufficient(u32::MAX, available));
        };
        if qty > available {
            return Err(DomainError::insufficient(qty, available));
        }

        item.reserve(qty);
        event.allocations_mut().credit(item.id(), qty);
        Ok(())
    }

    /// Release up to `qty` units of `item` held by `event`.
    ///
    /// Over-requesting is not an error: only what the event holds is released,
    /// and the amount actually released is returned (0 if the event held none).
    pub fn deallocate(item: &mut InventoryItem, event: &mut Event, qty: i64) -> DomainResult<u32> {
        let qty = u32::try_from(requested(qty)?).unwrap_or(u32::MAX);
        let actual = event.allocations_mut().debit(item.id(), qty);
        item.release(actual);
        Ok(actual)
    }

    /// Release everything `event` holds and clear its map. Returns the units released.
    ///
    /// Entries whose item cannot be found are dropped; there is no counter to
    /// give them back to.
    pub fn deallocate_all_for_event<L>(items: &mut L, event: &mut Event) -> u32
    where
        L: ItemLookup + ?Sized,
    {
        let entries: Vec<(ItemId, u32)> = event.allocations().iter().collect();
        let mut released = 0;
        for (item_id, qty) in entries {
            match items.item_mut(item_id) {
                Some(item) => {
                    let actual = event.allocations_mut().debit(item_id, qty);
                    item.release(actual);
                    released += actual;
                }
                None => {
                    event.allocations_mut().forget(item_id);
                }
            }
        }
        debug_assert!(event.allocations().is_empty());
        released
    }

    /// Restore the conservation invariant over freshly loaded data.
    ///
    /// Events are authoritative: entries naming unknown items are dropped and
    /// each item's counter is recomputed from the events. If events hold more
    /// than an item's total, the total is raised to match.
    pub fn reconcile(items: &mut [InventoryItem], events: &mut [Event]) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut sums: BTreeMap<ItemId, u32> = items.iter().map(|i| (i.id(), 0)).collect();

        for event in events.iter_mut() {
            let event_id = event.id();
            let entries: Vec<(ItemId, u32)> = event.allocations().iter().collect();
            for (item_id, qty) in entries {
                match sums.get_mut(&item_id) {
                    Some(sum) => *sum = sum.saturating_add(qty),
                    None => {
                        event.allocations_mut().forget(item_id);
                        report.dangling.push((event_id, item_id, qty));
                    }
                }
            }
        }

        for item in items.iter_mut() {
            let sum = sums.get(&item.id()).copied().unwrap_or(0);
            if sum != item.allocated_quantity() {
                report.corrected.push((item.id(), item.allocated_quantity(), sum));
            }
            if sum > item.total_quantity() {
                report.raised_totals.push(item.id());
            }
            item.force_allocated(sum);
        }

        report
    }
}

fn requested(qty: i64) -> DomainResult<i64> {
    if qty <= 0 {
        return Err(DomainError::validation("quantity must be positive"));
    }
    Ok(qty)
}
