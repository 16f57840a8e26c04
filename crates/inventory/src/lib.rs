//! Inventory domain module.
//!
//! This crate contains the business rules for stock and its reservation by
//! events, implemented purely as deterministic domain logic (no IO, no storage).

pub mod allocation;
pub mod item;

pub use allocation::{AllocationEngine, ItemLookup, ReconcileReport};
pub use item::InventoryItem;
