//! Operations that touch more than one collection of the store.
//!
//! Each function validates everything it needs before mutating, so a failed
//! call leaves the store exactly as it found it.

use tracing::{debug, info, warn};

use eventdesk_auth::Principal;
use eventdesk_core::{AttendeeId, DomainError, DomainResult, Entity, EventId, ItemId};
use eventdesk_events::{Attendee, Event, EventStatus};
use eventdesk_inventory::AllocationEngine;

use crate::store::EntityStore;

/// Who is being registered for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registrant {
    /// The caller themselves, attending under their own user id. `contact` is
    /// only used when no attendee record exists yet.
    Caller { contact: String },
    /// A third party entered by an operator; always gets a new attendee id.
    Guest { name: String, contact: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub attendee_id: AttendeeId,
    /// `false` when the attendee was already registered for the event.
    pub newly_added: bool,
}

pub struct IntegrityCoordinator;

impl IntegrityCoordinator {
    /// Release every allocation the event holds, then remove it.
    ///
    /// Attendees whose primary event was this one keep the stale reference.
    pub fn delete_event(store: &mut EntityStore, event_id: EventId) -> DomainResult<Event> {
        let (inventory, event) = store.inventory_and_event_mut(event_id)?;

        for item_id in event.allocations().items() {
            if !inventory.iter().any(|i| i.id() == item_id) {
                warn!(event = %event_id, item = %item_id, "dropping allocation for unknown inventory item");
            }
        }
        let released = AllocationEngine::deallocate_all_for_event(inventory, event);

        let removed = store
            .remove_event(event_id)
            .ok_or_else(|| DomainError::not_found(format!("event {event_id}")))?;

        let stale = store
            .attendees()
            .iter()
            .filter(|a| a.primary_event() == Some(event_id))
            .count();
        info!(event = %event_id, released, stale_primary_refs = stale, "event deleted");
        Ok(removed)
    }

    /// Add an attendee to an event's attendee set.
    ///
    /// Refused on completed or canceled events, and on full ones. Registering
    /// someone who is already in the set changes nothing, even when full.
    pub fn register_attendee_for_event(
        store: &mut EntityStore,
        caller: &Principal,
        event_id: EventId,
        registrant: Registrant,
    ) -> DomainResult<Registration> {
        let event = store
            .find_event(event_id)
            .ok_or_else(|| DomainError::not_found(format!("event {event_id}")))?;
        event.ensure_open()?;
        if let Registrant::Caller { .. } = registrant {
            let attendee_id = caller.attendee_id();
            if event.has_attendee(attendee_id) {
                debug!(event = %event_id, attendee = %attendee_id, "already registered");
                return Ok(Registration {
                    attendee_id,
                    newly_added: false,
                });
            }
        }
        event.ensure_has_room()?;

        let attendee_id = match registrant {
            Registrant::Caller { contact } => {
                let id = caller.attendee_id();
                if store.find_attendee(id).is_some() {
                    store.attendee_mut(id)?.adopt_primary_event(event_id);
                } else {
                    let attendee =
                        Attendee::new(id, caller.username.as_str(), contact, Some(event_id))?;
                    store.insert_attendee(attendee)?;
                }
                id
            }
            Registrant::Guest { name, contact } => {
                store.create_guest_attendee(&name, &contact, Some(event_id))?
            }
        };

        let newly_added = store.event_mut(event_id)?.add_attendee(attendee_id);
        debug!(event = %event_id, attendee = %attendee_id, newly_added, "attendee registered");
        Ok(Registration {
            attendee_id,
            newly_added,
        })
    }

    /// Remove an attendee from an event; clears their primary event if it was this one.
    pub fn cancel_registration(
        store: &mut EntityStore,
        attendee_id: AttendeeId,
        event_id: EventId,
    ) -> DomainResult<()> {
        let (event, attendees) = store.event_and_attendees_mut(event_id)?;
        event.ensure_open()?;
        if !event.remove_attendee(attendee_id) {
            return Err(DomainError::not_found(format!(
                "attendee {attendee_id} in event {event_id}"
            )));
        }
        if let Some(attendee) = attendees.iter_mut().find(|a| a.id() == attendee_id) {
            attendee.release_primary_event(event_id);
        }
        debug!(event = %event_id, attendee = %attendee_id, "registration canceled");
        Ok(())
    }

    /// Mark a registered attendee as checked in. Returns `false` if they already were.
    pub fn check_in(
        store: &mut EntityStore,
        attendee_id: AttendeeId,
        event_id: EventId,
    ) -> DomainResult<bool> {
        let (event, attendees) = store.event_and_attendees_mut(event_id)?;
        if event.status() == EventStatus::Canceled {
            return Err(DomainError::policy(format!("event {event_id} is canceled")));
        }
        if !event.has_attendee(attendee_id) {
            return Err(DomainError::not_found(format!(
                "attendee {attendee_id} in event {event_id}"
            )));
        }
        let attendee = attendees
            .iter_mut()
            .find(|a| a.id() == attendee_id)
            .ok_or_else(|| DomainError::not_found(format!("attendee {attendee_id}")))?;
        Ok(attendee.check_in())
    }

    /// Reserve stock for an open event.
    pub fn allocate(
        store: &mut EntityStore,
        item_id: ItemId,
        event_id: EventId,
        qty: i64,
    ) -> DomainResult<()> {
        let (item, event) = store.item_and_event_mut(item_id, event_id)?;
        event.ensure_open()?;
        AllocationEngine::allocate(item, event, qty)
    }

    /// Return stock from an event; allowed whatever the event's status.
    pub fn deallocate(
        store: &mut EntityStore,
        item_id: ItemId,
        event_id: EventId,
        qty: i64,
    ) -> DomainResult<u32> {
        let (item, event) = store.item_and_event_mut(item_id, event_id)?;
        AllocationEngine::deallocate(item, event, qty)
    }
}
