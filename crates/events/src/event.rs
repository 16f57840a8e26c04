use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use eventdesk_core::{AttendeeId, DomainError, DomainResult, Entity, EventId};

use crate::{Allocations, EventStatus};

/// Calendar date format (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Wall-clock time format (`HH:MM`, 24h).
pub const TIME_FORMAT: &str = "%H:%M";

/// Unvalidated event input as typed by an operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub name: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub description: String,
    pub category: String,
    /// Most attendees the event accepts; must be positive.
    pub capacity: u32,
}

impl EventDraft {
    pub fn validate(self) -> DomainResult<EventDetails> {
        let name = validate_name(self.name)?;
        Ok(EventDetails {
            name,
            date: parse_date(&self.date)?,
            time: parse_time(&self.time)?,
            location: self.location,
            description: self.description,
            category: self.category,
            capacity: validate_capacity(self.capacity)?,
        })
    }
}

/// Validated descriptive fields of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDetails {
    pub name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub description: String,
    pub category: String,
    pub capacity: u32,
}

/// Partial update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub name: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub capacity: Option<u32>,
    pub status: Option<EventStatus>,
}

/// A scheduled event.
///
/// # Invariants
/// - `name` is non-empty (names are not required to be unique).
/// - Each attendee id appears at most once.
/// - New registrations stop once `capacity` attendees are registered.
/// - Allocation entries are positive and mirror the item-side counters
///   (maintained by the allocation engine, not by this type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    id: EventId,
    #[serde(flatten)]
    details: EventDetails,
    status: EventStatus,
    attendees: BTreeSet<AttendeeId>,
    allocations: Allocations,
}

impl Event {
    /// A freshly created event: `Upcoming`, no attendees, nothing allocated.
    pub fn new(id: EventId, details: EventDetails) -> Self {
        Self {
            id,
            details,
            status: EventStatus::Upcoming,
            attendees: BTreeSet::new(),
            allocations: Allocations::new(),
        }
    }

    /// Rebuild a persisted event.
    pub fn restore(
        id: EventId,
        details: EventDetails,
        status: EventStatus,
        attendees: BTreeSet<AttendeeId>,
        allocations: Allocations,
    ) -> Self {
        Self {
            id,
            details,
            status,
            attendees,
            allocations,
        }
    }

    pub fn details(&self) -> &EventDetails {
        &self.details
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    pub fn attendees(&self) -> &BTreeSet<AttendeeId> {
        &self.attendees
    }

    pub fn has_attendee(&self, attendee: AttendeeId) -> bool {
        self.attendees.contains(&attendee)
    }

    pub fn allocations(&self) -> &Allocations {
        &self.allocations
    }

    /// Mutable allocation map, for the allocation engine only.
    pub fn allocations_mut(&mut self) -> &mut Allocations {
        &mut self.allocations
    }

    /// Refuse changes to attendance once the event is completed or canceled.
    pub fn ensure_open(&self) -> DomainResult<()> {
        if self.status.is_closed() {
            return Err(DomainError::policy(format!(
                "event {} is {}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    pub fn capacity(&self) -> u32 {
        self.details.capacity
    }

    pub fn is_full(&self) -> bool {
        self.attendees.len() >= self.details.capacity as usize
    }

    /// Refuse a new registration when every seat is taken.
    pub fn ensure_has_room(&self) -> DomainResult<()> {
        if self.is_full() {
            return Err(DomainError::policy(format!(
                "event {} is full ({} attendees)",
                self.id, self.details.capacity
            )));
        }
        Ok(())
    }

    /// Add an attendee; returns `false` if already present.
    pub fn add_attendee(&mut self, attendee: AttendeeId) -> bool {
        self.attendees.insert(attendee)
    }

    /// Remove an attendee; returns `false` if not present.
    pub fn remove_attendee(&mut self, attendee: AttendeeId) -> bool {
        self.attendees.remove(&attendee)
    }

    pub fn set_status(&mut self, status: EventStatus) {
        self.status = status;
    }

    /// Apply a partial update. Every field is validated before anything changes.
    pub fn apply_patch(&mut self, patch: EventPatch) -> DomainResult<()> {
        let name = patch.name.map(validate_name).transpose()?;
        let date = patch.date.as_deref().map(parse_date).transpose()?;
        let time = patch.time.as_deref().map(parse_time).transpose()?;
        let capacity = patch.capacity.map(validate_capacity).transpose()?;
        if let Some(capacity) = capacity {
            if (capacity as usize) < self.attendees.len() {
                return Err(DomainError::validation(format!(
                    "capacity {capacity} is below the {} registered attendees",
                    self.attendees.len()
                )));
            }
        }

        if let Some(name) = name {
            self.details.name = name;
        }
        if let Some(date) = date {
            self.details.date = date;
        }
        if let Some(time) = time {
            self.details.time = time;
        }
        if let Some(location) = patch.location {
            self.details.location = location;
        }
        if let Some(description) = patch.description {
            self.details.description = description;
        }
        if let Some(category) = patch.category {
            self.details.category = category;
        }
        if let Some(capacity) = capacity {
            self.details.capacity = capacity;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        Ok(())
    }

    /// Case-sensitive substring match on name or formatted date.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        self.details.name.contains(keyword)
            || self.details.date.format(DATE_FORMAT).to_string().contains(keyword)
    }
}

impl Entity for Event {
    type Id = EventId;

    fn id(&self) -> EventId {
        self.id
    }
}

fn validate_name(name: String) -> DomainResult<String> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("event name cannot be empty"));
    }
    Ok(name)
}

fn validate_capacity(capacity: u32) -> DomainResult<u32> {
    if capacity == 0 {
        return Err(DomainError::validation("capacity must be positive"));
    }
    Ok(capacity)
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> DomainResult<NaiveDate> {
    let invalid = || DomainError::validation(format!("invalid date '{s}', expected YYYY-MM-DD"));
    if s.len() != 10 {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| invalid())
}

/// Parse a strict 24h `HH:MM` time.
pub fn parse_time(s: &str) -> DomainResult<NaiveTime> {
    let invalid = || DomainError::validation(format!("invalid time '{s}', expected HH:MM"));
    if s.len() != 5 {
        return Err(invalid());
    }
    NaiveTime::parse_from_str(s, TIME_FORMAT).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> EventDraft {
        EventDraft {
            name: "Tech Conference".to_string(),
            date: "2025-03-14".to_string(),
            time: "09:00".to_string(),
            location: "Hall A".to_string(),
            description: "Annual technology conference".to_string(),
            category: "Conference".to_string(),
            capacity: 2,
        }
    }

    fn event() -> Event {
        Event::new(EventId::new(1), draft().validate().unwrap())
    }

    #[test]
    fn new_event_is_upcoming_and_empty() {
        let event = event();
        assert_eq!(event.status(), EventStatus::Upcoming);
        assert!(event.attendees().is_empty());
        assert!(event.allocations().is_empty());
        assert_eq!(event.name(), "Tech Conference");
    }

    #[test]
    fn draft_rejects_bad_date_and_time() {
        let mut bad_date = draft();
        bad_date.date = "2025-02-30".to_string();
        assert!(matches!(bad_date.validate(), Err(DomainError::Validation(_))));

        let mut short_date = draft();
        short_date.date = "2025-3-14".to_string();
        assert!(short_date.validate().is_err());

        let mut bad_time = draft();
        bad_time.time = "25:00".to_string();
        assert!(bad_time.validate().is_err());

        let mut blank_name = draft();
        blank_name.name = " ".to_string();
        assert!(blank_name.validate().is_err());

        let mut no_seats = draft();
        no_seats.capacity = 0;
        assert!(matches!(no_seats.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn patch_is_all_or_nothing() {
        let mut event = event();
        let before = event.clone();

        let err = event
            .apply_patch(EventPatch {
                location: Some("Hall B".to_string()),
                time: Some("9am".to_string()),
                ..EventPatch::default()
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(event, before);

        event
            .apply_patch(EventPatch {
                location: Some("Hall B".to_string()),
                status: Some(EventStatus::Ongoing),
                ..EventPatch::default()
            })
            .unwrap();
        assert_eq!(event.details().location, "Hall B");
        assert_eq!(event.status(), EventStatus::Ongoing);
        assert_eq!(event.details().category, "Conference");
    }

    #[test]
    fn attendee_membership_is_a_set() {
        let mut event = event();
        assert!(event.add_attendee(AttendeeId::new(5)));
        assert!(!event.add_attendee(AttendeeId::new(5)));
        assert_eq!(event.attendees().len(), 1);
        assert!(event.remove_attendee(AttendeeId::new(5)));
        assert!(!event.remove_attendee(AttendeeId::new(5)));
    }

    #[test]
    fn closed_events_refuse_changes() {
        let mut event = event();
        assert!(event.ensure_open().is_ok());
        event.set_status(EventStatus::Canceled);
        assert!(matches!(event.ensure_open(), Err(DomainError::PolicyViolation(_))));
    }

    #[test]
    fn keyword_matches_name_or_date() {
        let event = event();
        assert!(event.matches_keyword("Tech"));
        assert!(event.matches_keyword("2025-03"));
        assert!(!event.matches_keyword("tech"));
    }

    #[test]
    fn full_event_refuses_room_until_a_seat_frees() {
        let mut event = event();
        event.add_attendee(AttendeeId::new(1));
        assert!(event.ensure_has_room().is_ok());
        event.add_attendee(AttendeeId::new(2));
        assert!(event.is_full());
        assert!(matches!(event.ensure_has_room(), Err(DomainError::PolicyViolation(_))));

        event.remove_attendee(AttendeeId::new(1));
        assert!(event.ensure_has_room().is_ok());
    }

    #[test]
    fn capacity_cannot_drop_below_registrations() {
        let mut event = event();
        event.add_attendee(AttendeeId::new(1));
        event.add_attendee(AttendeeId::new(2));

        let err = event
            .apply_patch(EventPatch {
                capacity: Some(1),
                ..EventPatch::default()
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(event.capacity(), 2);

        event
            .apply_patch(EventPatch {
                capacity: Some(50),
                ..EventPatch::default()
            })
            .unwrap();
        assert_eq!(event.capacity(), 50);
        assert!(!event.is_full());
    }
}
