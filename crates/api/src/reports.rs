//! Read-only reports over a store snapshot. Rendering is left to the caller.

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::Serialize;

use eventdesk_core::{AttendeeId, DomainError, DomainResult, Entity, EventId, ItemId};
use eventdesk_events::{DATE_FORMAT, Event, EventStatus, TIME_FORMAT};
use eventdesk_infra::EntityStore;

const RULE: &str = "----------------------------------------";
const EXPORT_RULE: &str = "------------------------------------------------";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceRow {
    pub event_id: EventId,
    pub event_name: String,
    pub status: EventStatus,
    pub capacity: u32,
    pub total_attendees: usize,
    pub checked_in: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventAllocation {
    pub event_id: EventId,
    pub event_name: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryRow {
    pub item_id: ItemId,
    pub name: String,
    pub total: u32,
    pub allocated: u32,
    pub available: u32,
    pub allocations: Vec<EventAllocation>,
}

/// Per event: how many attendees are registered and how many checked in.
pub fn attendance_report(store: &EntityStore) -> Vec<AttendanceRow> {
    store
        .events()
        .iter()
        .map(|event| {
            let checked_in = event
                .attendees()
                .iter()
                .filter_map(|id| store.find_attendee(*id))
                .filter(|a| a.is_checked_in())
                .count();
            AttendanceRow {
                event_id: event.id(),
                event_name: event.name().to_string(),
                status: event.status(),
                capacity: event.capacity(),
                total_attendees: event.attendees().len(),
                checked_in,
            }
        })
        .collect()
}

/// Per item: stock levels and which events hold how much.
pub fn inventory_report(store: &EntityStore) -> Vec<InventoryRow> {
    store
        .inventory()
        .iter()
        .map(|item| {
            let allocations = store
                .events()
                .iter()
                .filter_map(|event| {
                    let quantity = event.allocations().get(item.id());
                    (quantity > 0).then(|| EventAllocation {
                        event_id: event.id(),
                        event_name: event.name().to_string(),
                        quantity,
                    })
                })
                .collect();
            InventoryRow {
                item_id: item.id(),
                name: item.name().to_string(),
                total: item.total_quantity(),
                allocated: item.allocated_quantity(),
                available: item.available_quantity(),
                allocations,
            }
        })
        .collect()
}

/// Plain-text attendee list for one event: header, one tab-separated line
/// per attendee, then the total.
pub fn export_attendee_list(store: &EntityStore, event_id: EventId) -> DomainResult<String> {
    let event = store
        .find_event(event_id)
        .ok_or_else(|| DomainError::not_found(format!("event {event_id}")))?;

    let mut doc = String::new();
    let _ = writeln!(doc, "Attendees for event: {}", event.name());
    let _ = writeln!(doc, "{RULE}");
    let _ = writeln!(doc, "Name\tContact Info\tChecked In");
    let _ = writeln!(doc, "{RULE}");

    let mut count = 0;
    for attendee in event.attendees().iter().filter_map(|id| store.find_attendee(*id)) {
        let _ = writeln!(
            doc,
            "{}\t{}\t{}",
            attendee.name(),
            attendee.contact(),
            if attendee.is_checked_in() { "Yes" } else { "No" }
        );
        count += 1;
    }

    let _ = writeln!(doc, "{RULE}");
    let _ = writeln!(doc, "Total attendees: {count}");
    Ok(doc)
}

/// Every event, one block of `Field: value` lines each, under a dated header.
pub fn export_events(store: &EntityStore, as_of: NaiveDate) -> String {
    let mut doc = export_header("Events", as_of);
    for event in store.events() {
        let d = event.details();
        let _ = writeln!(doc, "Name: {}", d.name);
        let _ = writeln!(doc, "Date: {}", d.date.format(DATE_FORMAT));
        let _ = writeln!(doc, "Time: {}", d.time.format(TIME_FORMAT));
        let _ = writeln!(doc, "Location: {}", d.location);
        let _ = writeln!(doc, "Description: {}", d.description);
        let _ = writeln!(doc, "Category: {}", d.category);
        let _ = writeln!(doc, "Capacity: {}", d.capacity);
        let _ = writeln!(doc, "Registered: {}", event.attendees().len());
        let _ = writeln!(doc, "Status: {}", event.status());
        let _ = writeln!(doc, "{EXPORT_RULE}");
    }
    doc
}

/// Every attendee record with the name of its primary event.
pub fn export_attendees(store: &EntityStore, as_of: NaiveDate) -> String {
    let mut doc = export_header("Attendees", as_of);
    for attendee in store.attendees() {
        let event = attendee
            .primary_event()
            .and_then(|id| store.find_event(id))
            .map_or("None", Event::name);
        let _ = writeln!(doc, "Name: {}", attendee.name());
        let _ = writeln!(doc, "Contact Info: {}", attendee.contact());
        let _ = writeln!(doc, "Event: {event}");
        let _ = writeln!(
            doc,
            "Checked In: {}",
            if attendee.is_checked_in() { "Yes" } else { "No" }
        );
        let _ = writeln!(doc, "{EXPORT_RULE}");
    }
    doc
}

/// Every item with its stock levels and the events holding it.
pub fn export_inventory(store: &EntityStore, as_of: NaiveDate) -> String {
    let mut doc = export_header("Inventory", as_of);
    for row in inventory_report(store) {
        let holders = if row.allocations.is_empty() {
            "None".to_string()
        } else {
            row.allocations
                .iter()
                .map(|a| format!("{} ({})", a.event_name, a.quantity))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let description = store
            .find_item(row.item_id)
            .map_or("", |item| item.description());
        let _ = writeln!(doc, "Name: {}", row.name);
        let _ = writeln!(doc, "Quantity: {}", row.total);
        let _ = writeln!(doc, "Allocated: {}", row.allocated);
        let _ = writeln!(doc, "Available: {}", row.available);
        let _ = writeln!(doc, "Description: {description}");
        let _ = writeln!(doc, "Allocated Events: {holders}");
        let _ = writeln!(doc, "{EXPORT_RULE}");
    }
    doc
}

fn export_header(title: &str, as_of: NaiveDate) -> String {
    let mut doc = String::new();
    let _ = writeln!(doc, "{title} Export - {}", as_of.format(DATE_FORMAT));
    let _ = writeln!(doc, "{EXPORT_RULE}");
    doc
}

/// Events whose attendee set contains `attendee`.
pub fn registrations_of(store: &EntityStore, attendee: AttendeeId) -> Vec<Event> {
    store
        .events()
        .iter()
        .filter(|e| e.has_attendee(attendee))
        .cloned()
        .collect()
}
