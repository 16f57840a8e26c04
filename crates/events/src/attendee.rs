use serde::Serialize;

use eventdesk_core::{AttendeeId, DomainError, DomainResult, Entity, EventId};

/// A person attending one or more events.
///
/// A user who registers themselves attends under their own user id; guests
/// registered by an operator get a freshly minted id. `primary_event` is a
/// soft reference: it may outlive the event it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attendee {
    id: AttendeeId,
    name: String,
    contact: String,
    primary_event: Option<EventId>,
    checked_in: bool,
}

impl Attendee {
    pub fn new(
        id: AttendeeId,
        name: impl Into<String>,
        contact: impl Into<String>,
        primary_event: Option<EventId>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("attendee name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            contact: contact.into(),
            primary_event,
            checked_in: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }

    pub fn primary_event(&self) -> Option<EventId> {
        self.primary_event
    }

    pub fn is_checked_in(&self) -> bool {
        self.checked_in
    }

    pub fn set_contact(&mut self, contact: impl Into<String>) {
        self.contact = contact.into();
    }

    /// Point at `event` unless a primary event is already recorded.
    pub fn adopt_primary_event(&mut self, event: EventId) {
        if self.primary_event.is_none() {
            self.primary_event = Some(event);
        }
    }

    /// Mark as checked in. One-way; returns `false` if already checked in.
    pub fn check_in(&mut self) -> bool {
        !std::mem::replace(&mut self.checked_in, true)
    }

    /// Drop the primary-event reference if it points at `event`, resetting check-in.
    pub fn release_primary_event(&mut self, event: EventId) -> bool {
        if self.primary_event != Some(event) {
            return false;
        }
        self.primary_event = None;
        self.checked_in = false;
        true
    }
}

impl Entity for Attendee {
    type Id = AttendeeId;

    fn id(&self) -> AttendeeId {
        self.id
    }
}
