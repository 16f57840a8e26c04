//! One-record-per-line text codec.
//!
//! Layout of a line:
//!
//! ```text
//! user:      id|role|username|password
//! event:     id|status|date|time|capacity|attendees|allocations|name|location|category|description
//! attendee:  id|primary_event|checked_in|name|contact
//! inventory: id|total|allocated|name|description
//! ```
//!
//! Fields are separated by `|`. The last field runs to the end of the line and
//! is never split, so it may contain `|` verbatim. Free text in any earlier
//! field is escaped (`\\`, `\|`, `\n`, `\r`); the last field escapes only
//! `\\`, `\n` and `\r`. Multi-valued fields use `;` between entries and `:`
//! between a map key and its value; an empty collection is an empty field.
//! Role and status are written as their integer codes. A primary-event of `0`
//! means none.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::str::FromStr;

use thiserror::Error;

use eventdesk_auth::{Role, User};
use eventdesk_core::{AttendeeId, DomainError, EntityKind, Entity, EventId, ItemId, UserId};
use eventdesk_events::{
    Allocations, Attendee, DATE_FORMAT, Event, EventDraft, EventStatus, TIME_FORMAT,
};
use eventdesk_inventory::InventoryItem;

pub const FIELD_SEP: char = '|';
pub const ENTRY_SEP: char = ';';
pub const PAIR_SEP: char = ':';

/// Why a persisted line could not be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("field '{field}': invalid number '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field '{field}': unknown code '{code}'")]
    UnknownCode { field: &'static str, code: String },

    #[error("field '{field}': malformed entry '{entry}'")]
    MalformedEntry { field: &'static str, entry: String },

    #[error("invalid escape sequence at byte {0}")]
    BadEscape(usize),

    #[error("field '{field}': {source}")]
    Invalid {
        field: &'static str,
        #[source]
        source: DomainError,
    },
}

/// A record that can be written to and read from a single text line.
pub trait LineCodec: Sized {
    const KIND: EntityKind;
    const FIELDS: usize;

    fn encode(&self) -> String;

    fn decode(line: &str) -> Result<Self, DecodeError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

impl LineCodec for User {
    const KIND: EntityKind = EntityKind::User;
    const FIELDS: usize = 4;

    fn encode(&self) -> String {
        let mut line = String::new();
        let _ = write!(line, "{}|{}|", self.id(), self.role().code());
        push_field(&mut line, self.username());
        push_terminal(&mut line, self.password());
        line
    }

    fn decode(line: &str) -> Result<Self, DecodeError> {
        let f = split_line(line, Self::FIELDS)?;
        let id = UserId::new(parse_id(&f[0], "id")?);
        let role_code: u8 = parse_number(&f[1], "role")?;
        let role = Role::from_code(role_code).ok_or_else(|| DecodeError::UnknownCode {
            field: "role",
            code: f[1].clone(),
        })?;
        User::new(id, f[2].as_str(), f[3].as_str(), role).map_err(invalid("user"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Event
// ─────────────────────────────────────────────────────────────────────────────

impl LineCodec for Event {
    const KIND: EntityKind = EntityKind::Event;
    const FIELDS: usize = 11;

    fn encode(&self) -> String {
        let d = self.details();
        let mut line = String::new();
        let _ = write!(
            line,
            "{}|{}|{}|{}|{}|",
            self.id(),
            self.status().code(),
            d.date.format(DATE_FORMAT),
            d.time.format(TIME_FORMAT),
            d.capacity,
        );

        let attendees: Vec<String> = self.attendees().iter().map(|a| a.to_string()).collect();
        line.push_str(&attendees.join(&ENTRY_SEP.to_string()));
        line.push(FIELD_SEP);

        let allocations: Vec<String> = self
            .allocations()
            .iter()
            .map(|(item, qty)| format!("{item}{PAIR_SEP}{qty}"))
            .collect();
        line.push_str(&allocations.join(&ENTRY_SEP.to_string()));
        line.push(FIELD_SEP);

        push_field(&mut line, &d.name);
        push_field(&mut line, &d.location);
        push_field(&mut line, &d.category);
        push_terminal(&mut line, &d.description);
        line
    }

    fn decode(line: &str) -> Result<Self, DecodeError> {
        let mut f = split_line(line, Self::FIELDS)?;
        let id = EventId::new(parse_id(&f[0], "id")?);
        let status_code: u8 = parse_number(&f[1], "status")?;
        let status = EventStatus::from_code(status_code).ok_or_else(|| DecodeError::UnknownCode {
            field: "status",
            code: f[1].clone(),
        })?;
        let capacity: u32 = parse_number(&f[4], "capacity")?;
        let attendees = parse_id_set(&f[5], "attendees")?;
        let allocations = parse_allocations(&f[6], "allocations")?;

        let details = EventDraft {
            name: std::mem::take(&mut f[7]),
            date: std::mem::take(&mut f[2]),
            time: std::mem::take(&mut f[3]),
            location: std::mem::take(&mut f[8]),
            category: std::mem::take(&mut f[9]),
            description: std::mem::take(&mut f[10]),
            capacity,
        }
        .validate()
        .map_err(invalid("event"))?;

        Ok(Event::restore(id, details, status, attendees, allocations))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Attendee
// ─────────────────────────────────────────────────────────────────────────────

impl LineCodec for Attendee {
    const KIND: EntityKind = EntityKind::Attendee;
    const FIELDS: usize = 5;

    fn encode(&self) -> String {
        let mut line = String::new();
        let _ = write!(
            line,
            "{}|{}|{}|",
            self.id(),
            self.primary_event().map_or(0, EventId::get),
            u8::from(self.is_checked_in()),
        );
        push_field(&mut line, self.name());
        push_terminal(&mut line, self.contact());
        line
    }

    fn decode(line: &str) -> Result<Self, DecodeError> {
        let f = split_line(line, Self::FIELDS)?;
        let id = AttendeeId::new(parse_id(&f[0], "id")?);
        let primary: u64 = parse_number(&f[1], "primary_event")?;
        let primary_event = (primary != 0).then_some(EventId::new(primary));
        let checked_in = match f[2].as_str() {
            "0" => false,
            "1" => true,
            other => {
                return Err(DecodeError::UnknownCode {
                    field: "checked_in",
                    code: other.to_string(),
                });
            }
        };

        let mut attendee = Attendee::new(id, f[3].as_str(), f[4].as_str(), primary_event)
            .map_err(invalid("attendee"))?;
        if checked_in {
            attendee.check_in();
        }
        Ok(attendee)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InventoryItem
// ─────────────────────────────────────────────────────────────────────────────

impl LineCodec for InventoryItem {
    const KIND: EntityKind = EntityKind::Item;
    const FIELDS: usize = 5;

    fn encode(&self) -> String {
        let mut line = String::new();
        let _ = write!(
            line,
            "{}|{}|{}|",
            self.id(),
            self.total_quantity(),
            self.allocated_quantity()
        );
        push_field(&mut line, self.name());
        push_terminal(&mut line, self.description());
        line
    }

    fn decode(line: &str) -> Result<Self, DecodeError> {
        let mut f = split_line(line, Self::FIELDS)?;
        let id = ItemId::new(parse_id(&f[0], "id")?);
        let total = parse_number(&f[1], "total_quantity")?;
        let allocated = parse_number(&f[2], "allocated_quantity")?;
        InventoryItem::restore(
            id,
            std::mem::take(&mut f[3]),
            total,
            allocated,
            std::mem::take(&mut f[4]),
        )
        .map_err(invalid("inventory"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Append an escaped non-terminal field followed by the separator.
fn push_field(line: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\\' => line.push_str("\\\\"),
            FIELD_SEP => line.push_str("\\|"),
            '\n' => line.push_str("\\n"),
            '\r' => line.push_str("\\r"),
            c => line.push(c),
        }
    }
    line.push(FIELD_SEP);
}

/// Append the terminal field; the separator is left as is.
fn push_terminal(line: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\\' => line.push_str("\\\\"),
            '\n' => line.push_str("\\n"),
            '\r' => line.push_str("\\r"),
            c => line.push(c),
        }
    }
}

/// Split into exactly `n` unescaped fields; the last one takes the rest of the line.
fn split_line(line: &str, n: usize) -> Result<Vec<String>, DecodeError> {
    let mut fields = Vec::with_capacity(n);
    let mut current = String::new();
    let mut chars = line.char_indices();

    while fields.len() + 1 < n {
        match chars.next() {
            None => {
                return Err(DecodeError::FieldCount {
                    expected: n,
                    found: fields.len() + 1,
                });
            }
            Some((_, FIELD_SEP)) => fields.push(std::mem::take(&mut current)),
            Some((pos, '\\')) => current.push(unescape(chars.next(), pos)?),
            Some((_, c)) => current.push(c),
        }
    }

    while let Some((pos, c)) = chars.next() {
        match c {
            '\\' => current.push(unescape(chars.next(), pos)?),
            c => current.push(c),
        }
    }
    fields.push(current);
    Ok(fields)
}

fn unescape(next: Option<(usize, char)>, pos: usize) -> Result<char, DecodeError> {
    match next.map(|(_, c)| c) {
        Some('\\') => Ok('\\'),
        Some(FIELD_SEP) => Ok(FIELD_SEP),
        Some('n') => Ok('\n'),
        Some('r') => Ok('\r'),
        _ => Err(DecodeError::BadEscape(pos)),
    }
}

/// Plain unsigned decimal: no sign, no whitespace.
fn parse_number<T: FromStr>(value: &str, field: &'static str) -> Result<T, DecodeError> {
    let bad = || DecodeError::InvalidNumber {
        field,
        value: value.to_string(),
    };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    value.parse().map_err(|_| bad())
}

fn parse_id(value: &str, field: &'static str) -> Result<u64, DecodeError> {
    let id: u64 = parse_number(value, field)?;
    if id == 0 {
        return Err(DecodeError::InvalidNumber {
            field,
            value: value.to_string(),
        });
    }
    Ok(id)
}

fn parse_id_set(value: &str, field: &'static str) -> Result<BTreeSet<AttendeeId>, DecodeError> {
    let mut set = BTreeSet::new();
    if value.is_empty() {
        return Ok(set);
    }
    for entry in value.split(ENTRY_SEP) {
        let id = AttendeeId::new(parse_id(entry, field)?);
        if !set.insert(id) {
            return Err(DecodeError::MalformedEntry {
                field,
                entry: entry.to_string(),
            });
        }
    }
    Ok(set)
}

fn parse_allocations(value: &str, field: &'static str) -> Result<Allocations, DecodeError> {
    if value.is_empty() {
        return Ok(Allocations::new());
    }
    let entries = value
        .split(ENTRY_SEP)
        .map(|entry| {
            let (item, qty) = entry
                .split_once(PAIR_SEP)
                .ok_or_else(|| DecodeError::MalformedEntry {
                    field,
                    entry: entry.to_string(),
                })?;
            Ok((ItemId::new(parse_id(item, field)?), parse_number(qty, field)?))
        })
        .collect::<Result<Vec<(ItemId, u32)>, DecodeError>>()?;
    Allocations::from_entries(entries).map_err(invalid(field))
}

fn invalid(field: &'static str) -> impl Fn(DomainError) -> DecodeError {
    move |source| DecodeError::Invalid { field, source }
}
