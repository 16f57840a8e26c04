//! Strongly-typed identifiers used across the domain.
//!
//! Every entity kind draws its ids from its own monotonic sequence, so the same
//! number may legitimately name a user and an attendee at once (the identity
//! bridge between a user and their own attendee record relies on this).

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The four persisted entity kinds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    Event,
    Attendee,
    Item,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::User,
        EntityKind::Event,
        EntityKind::Attendee,
        EntityKind::Item,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            EntityKind::User => 0,
            EntityKind::Event => 1,
            EntityKind::Attendee => 2,
            EntityKind::Item => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Event => "event",
            EntityKind::Attendee => "attendee",
            EntityKind::Item => "inventory item",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An identifier minted from a per-kind sequence.
pub trait SequencedId: Copy {
    const KIND: EntityKind;

    fn from_raw(raw: u64) -> Self;

    fn raw(self) -> u64;
}

/// Identifier of a user account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

/// Identifier of an event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(u64);

/// Identifier of an attendee record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendeeId(u64);

/// Identifier of an inventory item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

macro_rules! impl_numeric_id {
    ($t:ty, $kind:expr, $name:literal) => {
        impl $t {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl SequencedId for $t {
            const KIND: EntityKind = $kind;

            fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            fn raw(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<u64> for $t {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for u64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| DomainError::validation(format!("{}: {}", $name, e)))?;
                Ok(Self(raw))
            }
        }
    };
}

impl_numeric_id!(UserId, EntityKind::User, "UserId");
impl_numeric_id!(EventId, EntityKind::Event, "EventId");
impl_numeric_id!(AttendeeId, EntityKind::Attendee, "AttendeeId");
impl_numeric_id!(ItemId, EntityKind::Item, "ItemId");

impl From<UserId> for AttendeeId {
    /// Identity bridge: a self-registering user attends under their own id.
    fn from(value: UserId) -> Self {
        Self(value.0)
    }
}
