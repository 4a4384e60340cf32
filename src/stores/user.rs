//! Defines the user store trait.

use email_address::EmailAddress;

use crate::{
    Error,
    auth::PasswordHash,
    models::{UserID, UserRecord},
};

/// Handles the creation and retrieval of users.
pub trait UserStore {
    /// Create a new user.
    ///
    /// Returns [Error::DuplicateEmail] if a user with `email` already
    /// exists.
    fn create(
        &mut self,
        email: EmailAddress,
        name: String,
        password_hash: PasswordHash,
    ) -> Result<UserRecord, Error>;

    /// Get a user by their ID.
    ///
    /// Returns [Error::NotFound] if no user with the given ID exists.
    fn get(&self, id: UserID) -> Result<UserRecord, Error>;

    /// Get a user by their email, including the password hash.
    ///
    /// This is the only read path that exposes the hash. It exists for
    /// password verification during log-in and must not be used to build
    /// client responses directly; convert to a
    /// [UserView](crate::models::UserView) first.
    ///
    /// Returns [Error::NotFound] if no user with the given email exists.
    fn get_by_email(&self, email: &EmailAddress) -> Result<UserRecord, Error>;
}
