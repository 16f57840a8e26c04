use core::str::FromStr;

use serde::{Deserialize, Serialize};

use eventdesk_core::DomainError;

/// Lifecycle status of an event.
///
/// Any transition is permitted; only the *closed* statuses carry meaning for
/// other operations (registration and allocation are refused on them).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EventStatus {
    #[default]
    Upcoming,
    Ongoing,
    Completed,
    Canceled,
}

impl EventStatus {
    pub const ALL: [EventStatus; 4] = [
        EventStatus::Upcoming,
        EventStatus::Ongoing,
        EventStatus::Completed,
        EventStatus::Canceled,
    ];

    /// Fixed integer code used by the persisted format.
    pub fn code(self) -> u8 {
        match self {
            EventStatus::Upcoming => 0,
            EventStatus::Ongoing => 1,
            EventStatus::Completed => 2,
            EventStatus::Canceled => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Upcoming => "Upcoming",
            EventStatus::Ongoing => "Ongoing",
            EventStatus::Completed => "Completed",
            EventStatus::Canceled => "Canceled",
        }
    }

    /// Completed and canceled events no longer accept registrations.
    pub fn is_closed(self) -> bool {
        matches!(self, EventStatus::Completed | EventStatus::Canceled)
    }
}

impl core::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                DomainError::validation(
                    "status must be one of: Upcoming, Ongoing, Completed, Canceled",
                )
            })
    }
}
