use serde::Serialize;

use eventdesk_core::{AttendeeId, Entity, UserId};

use crate::{Role, User};

/// The authenticated caller of an operation.
///
/// Threaded explicitly through every operation that needs authorization; the
/// core never holds an ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self::new(user.id(), user.username(), user.role())
    }

    /// The attendee id this caller registers under (identity bridge).
    pub fn attendee_id(&self) -> AttendeeId {
        AttendeeId::from(self.user_id)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
