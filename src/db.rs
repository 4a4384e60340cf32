//! Defines and implements traits for setting up and reading from the
//! application's database.

use rusqlite::{Connection, Row, Transaction as SqlTransaction};

use crate::{
    Error,
    stores::sqlite::{SQLiteTransactionStore, SQLiteUserStore},
};

/// A trait for adding an object schema to a database.
pub trait CreateTable {
    /// Create the table(s) for the model.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;
}

/// A trait for mapping from a `rusqlite::Row` from a SQLite database to a concrete rust type.
pub trait MapRow {
    /// The type that rows are mapped to.
    type ReturnType;

    /// Convert a row into a concrete type.
    ///
    /// **Note:** This function expects that the row object contains all the
    /// table columns in the order they were defined.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the
    /// corresponding rust type, or if an invalid column index was used.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert a row into a concrete type, reading from the column `offset`.
    ///
    /// The `offset` is useful in cases where tables have been joined and you
    /// want to construct two different types from the one query.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the
    /// corresponding rust type, or if an invalid column index was used.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error>;
}

/// Create the tables for all of the application's models.
///
/// Runs inside an exclusive SQL transaction so that concurrent start-ups
/// cannot observe a half-initialized schema.
///
/// # Errors
/// Returns an error if the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    SQLiteUserStore::create_table(&transaction)?;
    SQLiteTransactionStore::create_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

pub(crate) mod timestamp {
    //! Encodes and decodes the date-time columns.
    //!
    //! Timestamps are normalized to UTC and written with a fixed-width
    //! subsecond field so that the TEXT ordering SQLite applies in `ORDER BY`
    //! is also the chronological ordering. RFC 3339 does not have this
    //! property because its subsecond field is variable width.

    use time::{
        OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::BorrowedFormatItem,
        macros::format_description,
    };

    /// Column format for date-times, e.g. "2026-08-07 09:30:00.000000".
    const FORMAT: &[BorrowedFormatItem] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");

    /// Format `datetime` for storage, normalizing to UTC.
    pub fn encode(datetime: OffsetDateTime) -> String {
        let utc = datetime.to_offset(UtcOffset::UTC);

        PrimitiveDateTime::new(utc.date(), utc.time())
            .format(FORMAT)
            .expect("formatting a date-time with a constant format should not fail")
    }

    /// Parse a date-time previously written by [encode].
    pub fn decode(text: &str) -> Result<OffsetDateTime, time::error::Parse> {
        PrimitiveDateTime::parse(text, FORMAT).map(|datetime| datetime.assume_utc())
    }

    #[cfg(test)]
    mod timestamp_tests {
        use time::macros::datetime;

        use super::{decode, encode};

        #[test]
        fn encode_normalizes_to_utc() {
            let with_offset = datetime!(2026-01-02 13:30:00 +13:00);

            let encoded = encode(with_offset);

            assert_eq!(encoded, "2026-01-02 00:30:00.000000");
        }

        #[test]
        fn round_trip_preserves_instant() {
            let datetime = datetime!(2026-01-02 03:04:05.678901 UTC);

            let decoded = decode(&encode(datetime)).unwrap();

            assert_eq!(decoded, datetime);
        }

        #[test]
        fn encoded_text_sorts_chronologically() {
            let earlier = encode(datetime!(2026-01-02 03:04:05.5 UTC));
            let later = encode(datetime!(2026-01-02 03:04:06 UTC));

            assert!(earlier < later);
        }
    }
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn creates_all_tables() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(name) FROM sqlite_master
                 WHERE type = 'table' AND name IN ('user', 'transaction')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(table_count, 2);
    }
}
