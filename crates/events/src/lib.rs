//! Events and attendees.
//!
//! Pure domain records (no IO, no storage). Cross-entity effects such as
//! cascading deletes live in `eventdesk-infra`; allocation arithmetic lives in
//! `eventdesk-inventory`.

pub mod allocations;
pub mod attendee;
pub mod event;
pub mod status;

pub use allocations::Allocations;
pub use attendee::Attendee;
pub use event::{
    DATE_FORMAT, Event, EventDetails, EventDraft, EventPatch, TIME_FORMAT, parse_date, parse_time,
};
pub use status::EventStatus;
