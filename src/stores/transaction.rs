//! Defines the transaction store trait.

use crate::{
    Error,
    models::{NewTransaction, Transaction, TransactionId, TransactionPatch},
};

/// Handles the creation, retrieval, and mutation of transactions.
pub trait TransactionStore {
    /// Create a new transaction in the store.
    fn create(&mut self, new_transaction: NewTransaction) -> Result<Transaction, Error>;

    /// Retrieve all transactions, ordered by date descending and tie-broken
    /// by creation time descending.
    fn list(&self) -> Result<Vec<Transaction>, Error>;

    /// Apply a partial update to the transaction `id` and return the updated
    /// record.
    ///
    /// The document that results from applying the patch is re-validated
    /// against the model invariants before it is written.
    ///
    /// Returns [Error::NotFound] if no transaction with the given ID exists.
    fn update(&mut self, id: TransactionId, patch: TransactionPatch)
    -> Result<Transaction, Error>;

    /// Delete the transaction `id` and return the deleted record.
    ///
    /// Returns [Error::NotFound] if no transaction with the given ID exists.
    fn delete(&mut self, id: TransactionId) -> Result<Transaction, Error>;

    /// Delete every transaction in the store and return how many were
    /// deleted.
    ///
    /// Destructive and unconditional; callers are responsible for gating
    /// this behind an explicit confirmation.
    fn delete_all(&mut self) -> Result<usize, Error>;

    /// Apply the same partial update to every transaction whose ID is in
    /// `ids` and return how many records were modified.
    ///
    /// IDs that do not match a stored transaction are skipped and do not
    /// count towards the total. The patch must have been validated with
    /// [TransactionPatch::validate](crate::models::TransactionPatch::validate)
    /// semantics; implementations validate it once up front rather than per
    /// document.
    fn bulk_update(
        &mut self,
        ids: &[TransactionId],
        patch: TransactionPatch,
    ) -> Result<usize, Error>;
}
