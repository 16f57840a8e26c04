//! User account record.

use serde::Serialize;

use eventdesk_core::{DomainError, DomainResult, Entity, UserId};

use crate::Role;

/// Minimum accepted password length (in characters).
pub const MIN_PASSWORD_LEN: usize = 6;

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A user account.
///
/// # Invariants
/// - `username` is non-empty and unique (case-sensitive) within a store.
/// - `password` is at least [`MIN_PASSWORD_LEN`] characters.
/// - After creation only the password may change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    id: UserId,
    username: String,
    #[serde(skip_serializing)]
    password: String,
    role: Role,
}

impl User {
    /// Build a validated user record.
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        password: impl Into<String>,
        role: Role,
    ) -> DomainResult<Self> {
        let username = username.into();
        let password = password.into();

        if username.trim().is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        validate_password(&password)?;

        Ok(Self {
            id,
            username,
            password,
            role,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Opaque stored secret; exposed for persistence only.
    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn verify_password(&self, candidate: &str) -> bool {
        self.password == candidate
    }

    pub fn change_password(&mut self, new_password: impl Into<String>) -> DomainResult<()> {
        let new_password = new_password.into();
        validate_password(&new_password)?;
        self.password = new_password;
        Ok(())
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
