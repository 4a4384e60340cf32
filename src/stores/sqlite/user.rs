//! Implements a SQLite backed user store.

use std::sync::{Arc, Mutex};

use email_address::EmailAddress;
use rusqlite::{Connection, Row, types::Type};

use crate::{
    Error,
    auth::PasswordHash,
    db::{CreateTable, MapRow, timestamp},
    models::{UserID, UserRecord},
    stores::UserStore,
};

/// Handles the creation and retrieval of users.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new user store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserStore for SQLiteUserStore {
    /// Create and insert a new user into the database.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    ///
    /// Returns an [Error::DuplicateEmail] if the given email address is
    /// already in use, or an [Error::SqlError] if an SQL related error
    /// occurred.
    fn create(
        &mut self,
        email: EmailAddress,
        name: String,
        password_hash: PasswordHash,
    ) -> Result<UserRecord, Error> {
        let user = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "INSERT INTO user (email, name, password, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id, email, name, password, created_at",
            )?
            .query_row(
                (
                    email.as_str(),
                    &name,
                    password_hash.to_string(),
                    timestamp::encode(time::OffsetDateTime::now_utc()),
                ),
                Self::map_row,
            )?;

        Ok(user)
    }

    /// Get the user from the database that has the specified `id`.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    ///
    /// Returns an [Error::NotFound] error if there is no user with the
    /// specified ID, or an [Error::SqlError] if there are SQL related
    /// errors.
    fn get(&self, id: UserID) -> Result<UserRecord, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare("SELECT id, email, name, password, created_at FROM user WHERE id = :id")?
            .query_row(&[(":id", &id.as_i64())], Self::map_row)
            .map_err(|e| e.into())
    }

    /// Get the user from the database that has the specified `email`
    /// address.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    ///
    /// Returns an [Error::NotFound] error if there is no user with the
    /// specified email, or an [Error::SqlError] if there are SQL related
    /// errors.
    fn get_by_email(&self, email: &EmailAddress) -> Result<UserRecord, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare("SELECT id, email, name, password, created_at FROM user WHERE email = :email")?
            .query_row(&[(":email", &email.as_str())], Self::map_row)
            .map_err(|e| e.into())
    }
}

impl CreateTable for SQLiteUserStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    email TEXT UNIQUE NOT NULL,
                    name TEXT NOT NULL,
                    password TEXT NOT NULL,
                    created_at TEXT NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteUserStore {
    type ReturnType = UserRecord;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_id = row.get(offset)?;
        let raw_email: String = row.get(offset + 1)?;
        let name = row.get(offset + 2)?;
        let raw_password_hash: String = row.get(offset + 3)?;
        let raw_created_at: String = row.get(offset + 4)?;

        let created_at = timestamp::decode(&raw_created_at).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(offset + 4, Type::Text, Box::new(error))
        })?;

        Ok(UserRecord {
            id: UserID::new(raw_id),
            email: EmailAddress::new_unchecked(raw_email),
            name,
            password_hash: PasswordHash::new_unchecked(&raw_password_hash),
            created_at,
        })
    }
}

#[cfg(test)]
mod user_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use email_address::EmailAddress;
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::PasswordHash,
        db::CreateTable,
        models::UserID,
        stores::UserStore,
    };

    use super::SQLiteUserStore;

    fn get_store() -> SQLiteUserStore {
        let conn = Connection::open_in_memory().unwrap();
        SQLiteUserStore::create_table(&conn).unwrap();

        SQLiteUserStore::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn insert_user_succeeds() {
        let mut store = get_store();

        let email = EmailAddress::from_str("hello@world.com").unwrap();
        let password_hash = PasswordHash::new_unchecked("hunter2");

        let inserted_user = store
            .create(email.clone(), "Hello".to_string(), password_hash.clone())
            .unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, email);
        assert_eq!(inserted_user.name, "Hello");
        assert_eq!(inserted_user.password_hash, password_hash);
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let mut store = get_store();

        let email = EmailAddress::from_str("hello@world.com").unwrap();

        assert!(
            store
                .create(
                    email.clone(),
                    "Hello".to_string(),
                    PasswordHash::new_unchecked("hunter2")
                )
                .is_ok()
        );

        assert_eq!(
            store.create(
                email.clone(),
                "Other".to_string(),
                PasswordHash::new_unchecked("hunter3")
            ),
            Err(Error::DuplicateEmail)
        );
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let store = get_store();

        let id = UserID::new(42);

        assert_eq!(store.get(id), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let mut store = get_store();

        let test_user = store
            .create(
                EmailAddress::from_str("foo@bar.baz").unwrap(),
                "Foo".to_string(),
                PasswordHash::new_unchecked("hunter2"),
            )
            .unwrap();

        let retrieved_user = store.get(test_user.id).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_fails_with_non_existent_email() {
        let store = get_store();

        // This email is not in the database.
        let email = EmailAddress::from_str("notavalidemail@foo.bar").unwrap();

        assert_eq!(store.get_by_email(&email), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_email() {
        let mut store = get_store();

        let test_user = store
            .create(
                EmailAddress::from_str("foo@bar.baz").unwrap(),
                "Foo".to_string(),
                PasswordHash::new_unchecked("hunter2"),
            )
            .unwrap();

        let retrieved_user = store.get_by_email(&test_user.email).unwrap();

        assert_eq!(retrieved_user, test_user);
    }
}
