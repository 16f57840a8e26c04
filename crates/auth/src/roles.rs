use serde::{Deserialize, Serialize};

/// Role of a user account.
///
/// A plain tag on the single [`User`](crate::User) record; behavior differences
/// are routed through the policy table in [`authorize`](crate::authorize).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    Admin,
    #[default]
    RegularUser,
}

impl Role {
    /// Fixed integer code used by the persisted format.
    pub fn code(self) -> u8 {
        match self {
            Role::RegularUser => 0,
            Role::Admin => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Role::RegularUser),
            1 => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::RegularUser => "user",
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
