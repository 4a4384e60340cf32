//! This file defines a user of the application and its supporting types.

use std::{fmt::Display, str::FromStr};

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserID(i64);

impl UserID {
    /// Create a user ID from an integer.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The underlying integer ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application as stored in the database.
///
/// Carries the password hash, so this type is for internal use only and
/// deliberately does not implement `Serialize`. Anything leaving the server
/// must go through [UserView] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    /// The user's ID in the database.
    pub id: UserID,
    /// The email address associated with the user.
    pub email: EmailAddress,
    /// The user's display name.
    pub name: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}

/// The public projection of a user.
///
/// Constructed from a [UserRecord] at the repository boundary; never carries
/// the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    /// The user's ID in the database.
    pub id: UserID,
    /// The email address associated with the user.
    pub email: EmailAddress,
    /// The user's display name.
    pub name: String,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&UserRecord> for UserView {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email.clone(),
            name: record.name.clone(),
            created_at: record.created_at,
        }
    }
}

/// Normalize and validate an email address from client input.
///
/// The address is trimmed and lowercased before validation so that the
/// store-level uniqueness check cannot be sidestepped by case or whitespace
/// variations.
///
/// # Errors
/// Returns an [Error::MissingField] if `raw_email` is empty after trimming,
/// or an [Error::InvalidEmail] if it does not parse as an email address.
pub fn parse_email(raw_email: &str) -> Result<EmailAddress, Error> {
    let normalized = raw_email.trim().to_lowercase();

    if normalized.is_empty() {
        return Err(Error::MissingField("email"));
    }

    EmailAddress::from_str(&normalized).map_err(|error| Error::InvalidEmail(error.to_string()))
}

/// Validate a display name from client input.
///
/// # Errors
/// Returns an [Error::EmptyName] if `raw_name` is empty after trimming.
pub fn parse_name(raw_name: &str) -> Result<String, Error> {
    let trimmed = raw_name.trim();

    if trimmed.is_empty() {
        return Err(Error::EmptyName);
    }

    Ok(trimmed.to_string())
}
