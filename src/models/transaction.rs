//! This file defines the type `Transaction`, the core type of the budgeting
//! part of the application, along with its validation rules.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// Alias for the integer type used for mapping to transaction database IDs.
pub type TransactionId = i64;

/// Whether a transaction describes money earned or money spent.
///
/// This is a closed set: any other value is rejected at the validation
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(Error::InvalidTransactionType),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Income => write!(f, "income"),
            Self::Expense => write!(f, "expense"),
        }
    }
}

/// An income or expense record.
///
/// To create a new transaction, validate the client's input with
/// [NewTransaction::new] and insert it via a
/// [TransactionStore](crate::stores::TransactionStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction in the database.
    pub id: TransactionId,
    /// Whether this is an income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The amount of money earned or spent. Never negative.
    pub amount: f64,
    /// A short label grouping related transactions, e.g. "Groceries".
    pub category: String,
    /// An optional free-form note.
    pub description: Option<String>,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// When the record was created. Maintained by the store.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the record was last modified. Maintained by the store.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Check that the transaction still satisfies the model invariants.
    ///
    /// Used to re-validate a document after a partial update has been
    /// applied to it.
    ///
    /// # Errors
    /// Returns an [Error::InvalidAmount] or [Error::EmptyCategory] if the
    /// corresponding invariant is violated.
    pub fn validate(&self) -> Result<(), Error> {
        validate_amount(self.amount)?;

        if self.category.trim().is_empty() {
            return Err(Error::EmptyCategory);
        }

        Ok(())
    }
}

/// A transaction that has been validated, but not yet stored.
///
/// Construct with [NewTransaction::new], which enforces the model
/// invariants independently of the persistence layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Whether this is an income or an expense.
    pub kind: TransactionType,
    /// The amount of money earned or spent.
    pub amount: f64,
    /// A short label grouping related transactions.
    pub category: String,
    /// An optional free-form note.
    pub description: Option<String>,
    /// When the transaction happened.
    pub date: OffsetDateTime,
}

impl NewTransaction {
    /// Validate the fields for a new transaction.
    ///
    /// `category` and `description` are trimmed; a `description` that is
    /// empty after trimming is treated as absent. `date` defaults to the
    /// current time when omitted.
    ///
    /// # Errors
    /// This function will return an:
    /// - [Error::InvalidAmount] if `amount` is negative or not finite,
    /// - [Error::EmptyCategory] if `category` is empty after trimming.
    pub fn new(
        kind: TransactionType,
        amount: f64,
        category: String,
        description: Option<String>,
        date: Option<OffsetDateTime>,
    ) -> Result<Self, Error> {
        let amount = validate_amount(amount)?;

        let category = category.trim().to_string();
        if category.is_empty() {
            return Err(Error::EmptyCategory);
        }

        Ok(Self {
            kind,
            amount,
            category,
            description: normalize_description(description),
            date: date.unwrap_or_else(OffsetDateTime::now_utc),
        })
    }
}

/// A partial update to one or more transactions.
///
/// Fields left as `None` are untouched. Setting `description` to an empty
/// string clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    /// Replacement transaction type.
    pub kind: Option<TransactionType>,
    /// Replacement amount.
    pub amount: Option<f64>,
    /// Replacement category.
    pub category: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement date.
    pub date: Option<OffsetDateTime>,
}

impl TransactionPatch {
    /// Check the provided fields against the same rules as
    /// [NewTransaction::new].
    ///
    /// Bulk updates apply one patch to many documents, so the patch itself
    /// is validated once up front rather than per document.
    ///
    /// # Errors
    /// Returns an [Error::InvalidAmount] or [Error::EmptyCategory] if a
    /// provided field violates the corresponding invariant.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }

        if let Some(ref category) = self.category
            && category.trim().is_empty()
        {
            return Err(Error::EmptyCategory);
        }

        Ok(())
    }

    /// Overwrite the fields of `transaction` that this patch provides.
    pub fn apply(&self, transaction: &mut Transaction) {
        if let Some(kind) = self.kind {
            transaction.kind = kind;
        }

        if let Some(amount) = self.amount {
            transaction.amount = amount;
        }

        if let Some(ref category) = self.category {
            transaction.category = category.trim().to_string();
        }

        if let Some(ref description) = self.description {
            transaction.description = normalize_description(Some(description.clone()));
        }

        if let Some(date) = self.date {
            transaction.date = date;
        }
    }
}

fn validate_amount(amount: f64) -> Result<f64, Error> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount);
    }

    Ok(amount)
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
