//! Credential check against a set of user records.

use thiserror::Error;

use crate::{Principal, User};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown username or wrong password; deliberately indistinguishable.
    #[error("invalid username or password")]
    InvalidCredentials,
}

/// Resolve `username`/`password` to a caller identity.
///
/// Usernames match case-sensitively. The caller owns the resulting
/// [`Principal`]; no session state is kept here.
pub fn authenticate<'a, I>(users: I, username: &str, password: &str) -> Result<Principal, AuthError>
where
    I: IntoIterator<Item = &'a User>,
{
    users
        .into_iter()
        .find(|u| u.username() == username)
        .filter(|u| u.verify_password(password))
        .map(Principal::from_user)
        .ok_or(AuthError::InvalidCredentials)
}
