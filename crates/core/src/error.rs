//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// uniqueness, policy). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A secondary key (username, item name, record id) is already taken.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A requested record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// An allocation asked for more stock than is currently available.
    #[error("insufficient inventory: requested {requested}, available {available}")]
    InsufficientInventory { requested: u32, available: u32 },

    /// The operation is refused by a domain policy (self-delete, closed event, role).
    #[error("policy violation: {0}")]
    PolicyViolation(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::DuplicateKey(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn policy(msg: impl Into<String>) -> Self {
        Self::PolicyViolation(msg.into())
    }

    pub fn insufficient(requested: u32, available: u32) -> Self {
        Self::InsufficientInventory {
            requested,
            available,
        }
    }
}
