//! `eventdesk-auth` — user accounts, caller identity and role-keyed authorization.
//!
//! This crate is intentionally decoupled from storage and from any front end:
//! it validates credentials against records handed to it and answers policy
//! questions for an explicit [`Principal`].

pub mod authorize;
pub mod credentials;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, authorize, permissions_for};
pub use credentials::{AuthError, authenticate};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::Role;
pub use user::{MIN_PASSWORD_LEN, User};
