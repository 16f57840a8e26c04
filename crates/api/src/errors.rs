use thiserror::Error;

use eventdesk_auth::{AuthError, AuthzError};
use eventdesk_core::DomainError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Everything an [`EventDesk`](crate::EventDesk) operation can fail with.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    /// The change was rolled back because it could not be written.
    #[error("persistence failed: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl ServiceError {
    /// Short machine-readable code, for front ends that map errors to messages.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Domain(DomainError::Validation(_)) => "validation_error",
            ServiceError::Domain(DomainError::DuplicateKey(_)) => "duplicate_key",
            ServiceError::Domain(DomainError::NotFound(_)) => "not_found",
            ServiceError::Domain(DomainError::InsufficientInventory { .. }) => {
                "insufficient_inventory"
            }
            ServiceError::Domain(DomainError::PolicyViolation(_)) => "policy_violation",
            ServiceError::Auth(_) => "invalid_credentials",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::Persistence(_) => "persistence_error",
        }
    }
}
