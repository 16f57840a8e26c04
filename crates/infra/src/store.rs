//! Authoritative in-memory collections.
//!
//! `EntityStore` owns every record and enforces the single-collection rules
//! (id and secondary-key uniqueness, field validation). Rules that span
//! collections are sequenced by [`IntegrityCoordinator`](crate::IntegrityCoordinator);
//! allocation counters only move through `AllocationEngine`.
//!
//! Collections are plain vectors kept in insertion order (which is also the
//! on-disk order); lookups are linear.

use eventdesk_auth::{Principal, Role, User};
use eventdesk_core::{
    AttendeeId, DomainError, DomainResult, Entity, EntityKind, EventId, IdentityRegistry, ItemId,
    SequencedId, UserId,
};
use eventdesk_events::{Attendee, Event, EventDraft, EventPatch};
use eventdesk_inventory::{AllocationEngine, InventoryItem, ReconcileReport};

/// An item whose counter disagrees with the per-event allocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConservationViolation {
    pub item_id: ItemId,
    pub allocated: u32,
    pub allocated_by_events: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    users: Vec<User>,
    events: Vec<Event>,
    attendees: Vec<Attendee>,
    inventory: Vec<InventoryItem>,
    ids: IdentityRegistry,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── snapshots ────────────────────────────────────────────────────────────

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn attendees(&self) -> &[Attendee] {
        &self.attendees
    }

    pub fn inventory(&self) -> &[InventoryItem] {
        &self.inventory
    }

    pub fn ids(&self) -> &IdentityRegistry {
        &self.ids
    }

    // ── lookups ──────────────────────────────────────────────────────────────

    pub fn find_user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id() == id)
    }

    /// Case-sensitive.
    pub fn find_user_by_username(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username() == username)
    }

    pub fn find_event(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id() == id)
    }

    /// Event names are not unique; every exact match is returned.
    pub fn find_events_by_name(&self, name: &str) -> Vec<&Event> {
        self.events.iter().filter(|e| e.name() == name).collect()
    }

    pub fn search_events(&self, keyword: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.matches_keyword(keyword))
            .collect()
    }

    pub fn find_attendee(&self, id: AttendeeId) -> Option<&Attendee> {
        self.attendees.iter().find(|a| a.id() == id)
    }

    pub fn find_item(&self, id: ItemId) -> Option<&InventoryItem> {
        self.inventory.iter().find(|i| i.id() == id)
    }

    /// Case-insensitive.
    pub fn find_item_by_name(&self, name: &str) -> Option<&InventoryItem> {
        self.inventory.iter().find(|i| i.name_matches(name))
    }

    // ── creation ─────────────────────────────────────────────────────────────

    pub fn create_user(
        &mut self,
        username: &str,
        password: &str,
        role: Role,
    ) -> DomainResult<UserId> {
        if self.find_user_by_username(username).is_some() {
            return Err(DomainError::duplicate(format!("username '{username}'")));
        }
        self.skip_bridged_ids(EntityKind::User);
        let user = self.mint(|id| User::new(id, username, password, role))?;
        let id = user.id();
        self.users.push(user);
        Ok(id)
    }

    pub fn create_event(&mut self, draft: EventDraft) -> DomainResult<EventId> {
        let details = draft.validate()?;
        let event = self.mint(|id| Ok(Event::new(id, details)))?;
        let id = event.id();
        self.events.push(event);
        Ok(id)
    }

    pub fn create_inventory_item(
        &mut self,
        name: &str,
        total_quantity: i64,
        description: &str,
    ) -> DomainResult<ItemId> {
        if self.find_item_by_name(name).is_some() {
            return Err(DomainError::duplicate(format!("inventory item '{name}'")));
        }
        let item = self.mint(|id| InventoryItem::new(id, name, total_quantity, description))?;
        let id = item.id();
        self.inventory.push(item);
        Ok(id)
    }

    /// Create a guest attendee under a freshly minted id.
    pub fn create_guest_attendee(
        &mut self,
        name: &str,
        contact: &str,
        primary_event: Option<EventId>,
    ) -> DomainResult<AttendeeId> {
        self.skip_bridged_ids(EntityKind::Attendee);
        let attendee = self.mint(|id| Attendee::new(id, name, contact, primary_event))?;
        let id = attendee.id();
        self.attendees.push(attendee);
        Ok(id)
    }

    /// Advance `kind`'s sequence past every number held by a user or an attendee.
    ///
    /// User and attendee ids share one number space through the identity
    /// bridge: a new user must not land on a guest's (or a deleted user's
    /// leftover) attendee record, and a new guest must not take a number a
    /// user already bridges into.
    fn skip_bridged_ids(&mut self, kind: EntityKind) {
        loop {
            let raw = self.ids.peek(kind);
            let taken = self.find_user(UserId::new(raw)).is_some()
                || self.find_attendee(AttendeeId::new(raw)).is_some();
            if !taken {
                break;
            }
            self.ids.next_raw(kind);
        }
    }

    /// Validate with the next id of `I`, consuming it only on success.
    fn mint<I, T>(&mut self, build: impl FnOnce(I) -> DomainResult<T>) -> DomainResult<T>
    where
        I: SequencedId,
    {
        let record = build(I::from_raw(self.ids.peek(I::KIND)))?;
        self.ids.next_raw(I::KIND);
        Ok(record)
    }

    // ── insertion of existing records (load, identity bridge) ────────────────

    pub fn insert_user(&mut self, user: User) -> DomainResult<()> {
        if self.find_user(user.id()).is_some() {
            return Err(DomainError::duplicate(format!("user id {}", user.id())));
        }
        if self.find_user_by_username(user.username()).is_some() {
            return Err(DomainError::duplicate(format!(
                "username '{}'",
                user.username()
            )));
        }
        self.ids.observe(EntityKind::User, user.id().get());
        self.users.push(user);
        Ok(())
    }

    pub fn insert_event(&mut self, event: Event) -> DomainResult<()> {
        if self.find_event(event.id()).is_some() {
            return Err(DomainError::duplicate(format!("event id {}", event.id())));
        }
        self.ids.observe(EntityKind::Event, event.id().get());
        self.events.push(event);
        Ok(())
    }

    pub fn insert_item(&mut self, item: InventoryItem) -> DomainResult<()> {
        if self.find_item(item.id()).is_some() {
            return Err(DomainError::duplicate(format!("inventory item id {}", item.id())));
        }
        if self.find_item_by_name(item.name()).is_some() {
            return Err(DomainError::duplicate(format!(
                "inventory item '{}'",
                item.name()
            )));
        }
        self.ids.observe(EntityKind::Item, item.id().get());
        self.inventory.push(item);
        Ok(())
    }

    pub fn insert_attendee(&mut self, attendee: Attendee) -> DomainResult<()> {
        if self.find_attendee(attendee.id()).is_some() {
            return Err(DomainError::duplicate(format!("attendee id {}", attendee.id())));
        }
        self.ids.observe(EntityKind::Attendee, attendee.id().get());
        self.attendees.push(attendee);
        Ok(())
    }

    /// Re-seed every id sequence to one past the largest id held.
    pub fn reseed_identities(&mut self) {
        let max_user = self.users.iter().map(|u| u.id().get()).max();
        let max_event = self.events.iter().map(|e| e.id().get()).max();
        let max_attendee = self.attendees.iter().map(|a| a.id().get()).max();
        let max_item = self.inventory.iter().map(|i| i.id().get()).max();

        self.ids.reseed(EntityKind::User, max_user);
        self.ids.reseed(EntityKind::Event, max_event);
        self.ids.reseed(EntityKind::Attendee, max_attendee);
        self.ids.reseed(EntityKind::Item, max_item);
    }

    /// Bring loaded allocation counters back in line with the events.
    pub fn reconcile_allocations(&mut self) -> ReconcileReport {
        AllocationEngine::reconcile(&mut self.inventory, &mut self.events)
    }

    // ── updates ──────────────────────────────────────────────────────────────

    /// Remove a user account. A caller may not delete their own account.
    pub fn delete_user(&mut self, username: &str, caller: &Principal) -> DomainResult<User> {
        if caller.username == username {
            return Err(DomainError::policy("cannot delete the account you are signed in with"));
        }
        let idx = self
            .users
            .iter()
            .position(|u| u.username() == username)
            .ok_or_else(|| DomainError::not_found(format!("user '{username}'")))?;
        Ok(self.users.remove(idx))
    }

    pub fn change_password(&mut self, user_id: UserId, new_password: &str) -> DomainResult<()> {
        self.user_mut(user_id)?.change_password(new_password)
    }

    pub fn update_event(&mut self, event_id: EventId, patch: EventPatch) -> DomainResult<()> {
        self.event_mut(event_id)?.apply_patch(patch)
    }

    pub fn update_inventory_total_quantity(
        &mut self,
        item_id: ItemId,
        new_total: i64,
    ) -> DomainResult<()> {
        self.item_mut(item_id)?.set_total_quantity(new_total)
    }

    pub fn update_inventory_description(
        &mut self,
        item_id: ItemId,
        description: &str,
    ) -> DomainResult<()> {
        self.item_mut(item_id)?.set_description(description);
        Ok(())
    }

    pub fn update_contact_info(&mut self, attendee_id: AttendeeId, contact: &str) -> DomainResult<()> {
        self.attendee_mut(attendee_id)?.set_contact(contact);
        Ok(())
    }

    // ── invariant checks ─────────────────────────────────────────────────────

    /// Items whose counter is not the sum of event allocations or exceeds the total.
    pub fn conservation_violations(&self) -> Vec<ConservationViolation> {
        self.inventory
            .iter()
            .filter_map(|item| {
                let by_events: u32 = self
                    .events
                    .iter()
                    .map(|e| e.allocations().get(item.id()))
                    .sum();
                let ok = by_events == item.allocated_quantity()
                    && item.allocated_quantity() <= item.total_quantity();
                (!ok).then(|| ConservationViolation {
                    item_id: item.id(),
                    allocated: item.allocated_quantity(),
                    allocated_by_events: by_events,
                    total: item.total_quantity(),
                })
            })
            .collect()
    }

    // ── crate-internal mutable access for the coordinator ────────────────────

    pub(crate) fn user_mut(&mut self, id: UserId) -> DomainResult<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.id() == id)
            .ok_or_else(|| DomainError::not_found(format!("user {id}")))
    }

    pub(crate) fn event_mut(&mut self, id: EventId) -> DomainResult<&mut Event> {
        self.events
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or_else(|| DomainError::not_found(format!("event {id}")))
    }

    pub(crate) fn attendee_mut(&mut self, id: AttendeeId) -> DomainResult<&mut Attendee> {
        self.attendees
            .iter_mut()
            .find(|a| a.id() == id)
            .ok_or_else(|| DomainError::not_found(format!("attendee {id}")))
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> DomainResult<&mut InventoryItem> {
        self.inventory
            .iter_mut()
            .find(|i| i.id() == id)
            .ok_or_else(|| DomainError::not_found(format!("inventory item {id}")))
    }

    /// Disjoint borrows of one item and one event.
    pub(crate) fn item_and_event_mut(
        &mut self,
        item_id: ItemId,
        event_id: EventId,
    ) -> DomainResult<(&mut InventoryItem, &mut Event)> {
        let item = self
            .inventory
            .iter_mut()
            .find(|i| i.id() == item_id)
            .ok_or_else(|| DomainError::not_found(format!("inventory item {item_id}")))?;
        let event = self
            .events
            .iter_mut()
            .find(|e| e.id() == event_id)
            .ok_or_else(|| DomainError::not_found(format!("event {event_id}")))?;
        Ok((item, event))
    }

    /// Disjoint borrows of the whole inventory and one event.
    pub(crate) fn inventory_and_event_mut(
        &mut self,
        event_id: EventId,
    ) -> DomainResult<(&mut Vec<InventoryItem>, &mut Event)> {
        let event = self
            .events
            .iter_mut()
            .find(|e| e.id() == event_id)
            .ok_or_else(|| DomainError::not_found(format!("event {event_id}")))?;
        Ok((&mut self.inventory, event))
    }

    /// Disjoint borrows of one event and the attendee collection.
    pub(crate) fn event_and_attendees_mut(
        &mut self,
        event_id: EventId,
    ) -> DomainResult<(&mut Event, &mut Vec<Attendee>)> {
        let event = self
            .events
            .iter_mut()
            .find(|e| e.id() == event_id)
            .ok_or_else(|| DomainError::not_found(format!("event {event_id}")))?;
        Ok((event, &mut self.attendees))
    }

    pub(crate) fn remove_event(&mut self, event_id: EventId) -> Option<Event> {
        let idx = self.events.iter().position(|e| e.id() == event_id)?;
        Some(self.events.remove(idx))
    }
}
