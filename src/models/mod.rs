//! This module defines the domain data types.

mod transaction;
mod user;

pub use transaction::{
    NewTransaction, Transaction, TransactionId, TransactionPatch, TransactionType,
};
pub use user::{UserID, UserRecord, UserView, parse_email, parse_name};
