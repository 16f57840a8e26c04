use serde::Serialize;

use eventdesk_core::{DomainError, DomainResult, Entity, ItemId};

/// A stock-keeping inventory item.
///
/// # Invariants
/// - `name` is non-empty; uniqueness (case-insensitive) is enforced by the store.
/// - `0 <= allocated_quantity <= total_quantity`, except for a freshly
///   restored item whose counters have not been reconciled yet.
/// - `allocated_quantity` only moves through [`AllocationEngine`](crate::AllocationEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItem {
    id: ItemId,
    name: String,
    total_quantity: u32,
    allocated_quantity: u32,
    description: String,
}

impl InventoryItem {
    /// A new item with nothing allocated.
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        total_quantity: i64,
        description: impl Into<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            total_quantity: quantity(total_quantity)?,
            allocated_quantity: 0,
            description: description.into(),
        })
    }

    /// Rebuild a persisted item. Counters are taken as written; an allocated
    /// quantity above the total is left for
    /// [`AllocationEngine::reconcile`](crate::AllocationEngine::reconcile) to repair.
    pub fn restore(
        id: ItemId,
        name: String,
        total_quantity: u32,
        allocated_quantity: u32,
        description: String,
    ) -> DomainResult<Self> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            total_quantity,
            allocated_quantity,
            description,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn total_quantity(&self) -> u32 {
        self.total_quantity
    }

    pub fn allocated_quantity(&self) -> u32 {
        self.allocated_quantity
    }

    /// Derived; never stored.
    pub fn available_quantity(&self) -> u32 {
        self.total_quantity.saturating_sub(self.allocated_quantity)
    }

    /// Case-insensitive name comparison used for uniqueness.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Change the total stock. It may not go negative or below what is allocated.
    pub fn set_total_quantity(&mut self, new_total: i64) -> DomainResult<()> {
        let new_total = quantity(new_total)?;
        if new_total < self.allocated_quantity {
            return Err(DomainError::validation(format!(
                "total {new_total} is below the {} units currently allocated",
                self.allocated_quantity
            )));
        }
        self.total_quantity = new_total;
        Ok(())
    }

    pub(crate) fn reserve(&mut self, qty: u32) {
        debug_assert!(qty <= self.available_quantity());
        self.allocated_quantity += qty;
    }

    pub(crate) fn release(&mut self, qty: u32) {
        self.allocated_quantity = self.allocated_quantity.saturating_sub(qty);
    }

    pub(crate) fn force_allocated(&mut self, allocated: u32) {
        self.allocated_quantity = allocated;
        if allocated > self.total_quantity {
            self.total_quantity = allocated;
        }
    }
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }
}

fn quantity(value: i64) -> DomainResult<u32> {
    if value < 0 {
        return Err(DomainError::validation("quantity cannot be negative"));
    }
    u32::try_from(value).map_err(|_| DomainError::validation(format!("quantity {value} is too large")))
}
