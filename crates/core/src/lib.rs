//! `eventdesk-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the shared error model, numeric identifiers and the per-kind id sequences.

pub mod entity;
pub mod error;
pub mod id;
pub mod identity;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AttendeeId, EntityKind, EventId, ItemId, SequencedId, UserId};
pub use identity::IdentityRegistry;
