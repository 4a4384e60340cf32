//! Implements a SQLite backed transaction store.

use std::{str::FromStr, sync::{Arc, Mutex}};

use rusqlite::{Connection, Row, params_from_iter, types::{Type, Value}};
use time::OffsetDateTime;

use crate::{
    Error,
    db::{CreateTable, MapRow, timestamp},
    models::{NewTransaction, Transaction, TransactionId, TransactionPatch, TransactionType},
    stores::TransactionStore,
};

const TRANSACTION_COLUMNS: &str =
    "id, kind, amount, category, description, date, created_at, updated_at";

/// Stores transactions in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Create a new transaction in the database.
    ///
    /// The creation and update timestamps are set to the current time.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL related error.
    fn create(&mut self, new_transaction: NewTransaction) -> Result<Transaction, Error> {
        let now = timestamp::encode(OffsetDateTime::now_utc());

        let transaction = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "INSERT INTO \"transaction\" (kind, amount, category, description, date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_row(
                (
                    new_transaction.kind.to_string(),
                    new_transaction.amount,
                    &new_transaction.category,
                    &new_transaction.description,
                    timestamp::encode(new_transaction.date),
                    &now,
                    &now,
                ),
                Self::map_row,
            )?;

        Ok(transaction)
    }

    /// Retrieve all transactions, newest first.
    ///
    /// The timestamp columns are written in a fixed-width UTC format, so the
    /// TEXT ordering used here is the chronological ordering.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL related error.
    fn list(&self) -> Result<Vec<Transaction>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
                 ORDER BY date DESC, created_at DESC"
            ))?
            .query_map([], Self::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(|e| e.into()))
            .collect()
    }

    /// Apply `patch` to the transaction `id`.
    ///
    /// The merged document is re-validated before it is written, and the
    /// update timestamp is bumped.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    /// This function will return an:
    /// - [Error::NotFound] if `id` does not refer to a stored transaction,
    /// - [Error::InvalidAmount] or [Error::EmptyCategory] if the patched
    ///   document violates the corresponding invariant,
    /// - [Error::SqlError] if there is some other SQL error.
    fn update(
        &mut self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, Error> {
        let connection = self.connection.lock().unwrap();

        let mut transaction = connection
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
            ))?
            .query_row(&[(":id", &id)], Self::map_row)
            .map_err(Error::from)?;

        patch.apply(&mut transaction);
        transaction.validate()?;

        let updated = connection
            .prepare(&format!(
                "UPDATE \"transaction\"
                 SET kind = ?1, amount = ?2, category = ?3, description = ?4, date = ?5, updated_at = ?6
                 WHERE id = ?7
                 RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_row(
                (
                    transaction.kind.to_string(),
                    transaction.amount,
                    &transaction.category,
                    &transaction.description,
                    timestamp::encode(transaction.date),
                    timestamp::encode(OffsetDateTime::now_utc()),
                    id,
                ),
                Self::map_row,
            )?;

        Ok(updated)
    }

    /// Delete the transaction `id` and return the deleted record.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if `id` does not refer to a stored
    /// transaction, or an [Error::SqlError] if there is some other SQL
    /// error.
    fn delete(&mut self, id: TransactionId) -> Result<Transaction, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "DELETE FROM \"transaction\" WHERE id = :id RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_row(&[(":id", &id)], Self::map_row)
            .map_err(|e| e.into())
    }

    /// Delete every transaction and return how many were deleted.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL related error.
    fn delete_all(&mut self) -> Result<usize, Error> {
        self.connection
            .lock()
            .unwrap()
            .execute("DELETE FROM \"transaction\"", ())
            .map_err(|e| e.into())
    }

    /// Apply the same patch to every transaction whose ID is in `ids`.
    ///
    /// The patch is validated once up front; IDs that do not match a stored
    /// transaction are skipped. An empty patch modifies nothing.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    /// This function will return an:
    /// - [Error::InvalidAmount] or [Error::EmptyCategory] if a provided
    ///   patch field violates the corresponding invariant,
    /// - [Error::SqlError] if there is an SQL related error.
    fn bulk_update(
        &mut self,
        ids: &[TransactionId],
        patch: TransactionPatch,
    ) -> Result<usize, Error> {
        patch.validate()?;

        let mut set_parts = vec![];
        let mut parameters: Vec<Value> = vec![];

        if let Some(kind) = patch.kind {
            set_parts.push(format!("kind = ?{}", parameters.len() + 1));
            parameters.push(Value::Text(kind.to_string()));
        }

        if let Some(amount) = patch.amount {
            set_parts.push(format!("amount = ?{}", parameters.len() + 1));
            parameters.push(Value::Real(amount));
        }

        if let Some(ref category) = patch.category {
            set_parts.push(format!("category = ?{}", parameters.len() + 1));
            parameters.push(Value::Text(category.trim().to_string()));
        }

        if let Some(ref description) = patch.description {
            set_parts.push(format!("description = ?{}", parameters.len() + 1));
            let trimmed = description.trim();
            parameters.push(if trimmed.is_empty() {
                Value::Null
            } else {
                Value::Text(trimmed.to_string())
            });
        }

        if let Some(date) = patch.date {
            set_parts.push(format!("date = ?{}", parameters.len() + 1));
            parameters.push(Value::Text(timestamp::encode(date)));
        }

        if set_parts.is_empty() || ids.is_empty() {
            return Ok(0);
        }

        set_parts.push(format!("updated_at = ?{}", parameters.len() + 1));
        parameters.push(Value::Text(timestamp::encode(OffsetDateTime::now_utc())));

        let id_placeholders = ids
            .iter()
            .map(|id| {
                parameters.push(Value::Integer(*id));
                format!("?{}", parameters.len())
            })
            .collect::<Vec<_>>()
            .join(", ");

        let query_string = format!(
            "UPDATE \"transaction\" SET {} WHERE id IN ({})",
            set_parts.join(", "),
            id_placeholders
        );

        self.connection
            .lock()
            .unwrap()
            .execute(&query_string, params_from_iter(parameters.iter()))
            .map_err(|e| e.into())
    }
}

impl CreateTable for SQLiteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    kind TEXT NOT NULL,
                    amount REAL NOT NULL,
                    category TEXT NOT NULL,
                    description TEXT,
                    date TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                    )",
            (),
        )?;

        connection.execute(
            "CREATE INDEX IF NOT EXISTS transaction_kind_date ON \"transaction\" (kind, date DESC)",
            (),
        )?;

        connection.execute(
            "CREATE INDEX IF NOT EXISTS transaction_category ON \"transaction\" (category)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteTransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;
        let raw_kind: String = row.get(offset + 1)?;
        let amount = row.get(offset + 2)?;
        let category = row.get(offset + 3)?;
        let description = row.get(offset + 4)?;
        let raw_date: String = row.get(offset + 5)?;
        let raw_created_at: String = row.get(offset + 6)?;
        let raw_updated_at: String = row.get(offset + 7)?;

        let kind = TransactionType::from_str(&raw_kind).map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 1,
                Type::Text,
                format!("unknown transaction type \"{raw_kind}\"").into(),
            )
        })?;

        let decode_datetime = |column: usize, raw: &str| {
            timestamp::decode(raw).map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(error))
            })
        };

        Ok(Transaction {
            id,
            kind,
            amount,
            category,
            description,
            date: decode_datetime(offset + 5, &raw_date)?,
            created_at: decode_datetime(offset + 6, &raw_created_at)?,
            updated_at: decode_datetime(offset + 7, &raw_updated_at)?,
        })
    }
}
