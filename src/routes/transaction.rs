//! This file defines the routes for creating, listing, updating, and
//! deleting transactions.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    Error,
    models::{NewTransaction, Transaction, TransactionId, TransactionPatch, TransactionType},
    state::AppState,
    stores::{TransactionStore, UserStore},
};

/// The envelope for responses that carry transaction data.
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    /// The requested or affected record(s).
    pub data: T,
}

/// The response body for a bulk update.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedResponse {
    /// How many records the update modified.
    pub modified_count: usize,
}

/// The response body for a bulk delete.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    /// How many records were deleted.
    pub deleted_count: usize,
}

/// The request body for creating a transaction.
///
/// All fields are optional at the parsing stage so that missing fields
/// produce a 400 with a useful message; `type` and `date` arrive as strings
/// and go through the explicit validation functions.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTransactionData {
    /// "income" or "expense".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// The amount of money earned or spent.
    pub amount: Option<f64>,
    /// A short label grouping related transactions.
    pub category: Option<String>,
    /// An optional free-form note.
    pub description: Option<String>,
    /// When the transaction happened, as an RFC 3339 string. Defaults to
    /// the current time.
    pub date: Option<String>,
}

/// A partial update to a transaction, as sent by the client.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TransactionPatchData {
    /// Replacement transaction type.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Replacement amount.
    pub amount: Option<f64>,
    /// Replacement category.
    pub category: Option<String>,
    /// Replacement description. An empty string clears the description.
    pub description: Option<String>,
    /// Replacement date as an RFC 3339 string.
    pub date: Option<String>,
}

impl TryFrom<TransactionPatchData> for TransactionPatch {
    type Error = Error;

    fn try_from(data: TransactionPatchData) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: data.kind.map(|raw| raw.parse()).transpose()?,
            amount: data.amount,
            category: data.category,
            description: data.description,
            date: data.date.map(|raw| parse_date(&raw)).transpose()?,
        })
    }
}

/// The query parameters for the bulk delete route.
#[derive(Debug, Deserialize)]
pub struct WipeParams {
    /// Must be `true` for the wipe to proceed.
    pub confirm: Option<bool>,
}

fn parse_date(raw: &str) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::parse(raw, &Rfc3339).map_err(|_| Error::InvalidDate(raw.to_string()))
}

/// A route handler for listing all transactions, newest first.
pub async fn get_transactions<U, T>(
    State(state): State<AppState<U, T>>,
) -> Result<Json<DataResponse<Vec<Transaction>>>, Error>
where
    U: UserStore + Send + Sync,
    T: TransactionStore + Send + Sync,
{
    let transactions = state.transaction_store.list()?;

    Ok(Json(DataResponse { data: transactions }))
}

/// A route handler for creating a new transaction.
pub async fn create_transaction<U, T>(
    State(mut state): State<AppState<U, T>>,
    Json(data): Json<CreateTransactionData>,
) -> Result<(StatusCode, Json<DataResponse<Transaction>>), Error>
where
    U: UserStore + Send + Sync,
    T: TransactionStore + Send + Sync,
{
    let kind: TransactionType = data
        .kind
        .ok_or(Error::MissingField("type"))?
        .parse()?;
    let amount = data.amount.ok_or(Error::MissingField("amount"))?;
    let category = data.category.ok_or(Error::MissingField("category"))?;
    let date = data.date.map(|raw| parse_date(&raw)).transpose()?;

    let new_transaction = NewTransaction::new(kind, amount, category, data.description, date)?;
    let transaction = state.transaction_store.create(new_transaction)?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: transaction }),
    ))
}

/// A route handler for deleting every transaction.
///
/// Destructive, so the client must opt in explicitly with `?confirm=true`;
/// without it the request is rejected and nothing is deleted.
pub async fn delete_all_transactions<U, T>(
    State(mut state): State<AppState<U, T>>,
    Query(params): Query<WipeParams>,
) -> Result<Json<DeletedResponse>, Error>
where
    U: UserStore + Send + Sync,
    T: TransactionStore + Send + Sync,
{
    if params.confirm != Some(true) {
        return Err(Error::UnconfirmedWipe);
    }

    let deleted_count = state.transaction_store.delete_all()?;

    Ok(Json(DeletedResponse { deleted_count }))
}

/// The request body for the bulk update route.
#[derive(Debug, Serialize, Deserialize)]
pub struct BulkUpdateData {
    /// The IDs of the transactions to update.
    pub ids: Option<Vec<TransactionId>>,
    /// The patch to apply to every matching transaction.
    pub update: Option<TransactionPatchData>,
}

/// A route handler for applying one patch to many transactions.
///
/// Responds with how many records were modified; IDs that do not match a
/// stored transaction are skipped.
pub async fn bulk_update_transactions<U, T>(
    State(mut state): State<AppState<U, T>>,
    Json(data): Json<BulkUpdateData>,
) -> Result<Json<ModifiedResponse>, Error>
where
    U: UserStore + Send + Sync,
    T: TransactionStore + Send + Sync,
{
    let ids = data
        .ids
        .filter(|ids| !ids.is_empty())
        .ok_or(Error::EmptyIdList)?;
    let patch: TransactionPatch = data
        .update
        .ok_or(Error::MissingField("update"))?
        .try_into()?;

    let modified_count = state.transaction_store.bulk_update(&ids, patch)?;

    Ok(Json(ModifiedResponse { modified_count }))
}

/// A route handler for applying a partial update to a single transaction.
pub async fn update_transaction<U, T>(
    State(mut state): State<AppState<U, T>>,
    Path(id): Path<TransactionId>,
    Json(data): Json<TransactionPatchData>,
) -> Result<Json<DataResponse<Transaction>>, Error>
where
    U: UserStore + Send + Sync,
    T: TransactionStore + Send + Sync,
{
    let patch = TransactionPatch::try_from(data)?;
    let transaction = state.transaction_store.update(id, patch)?;

    Ok(Json(DataResponse { data: transaction }))
}

/// A route handler for deleting a transaction by its ID.
///
/// Responds with the deleted record.
pub async fn delete_transaction<U, T>(
    State(mut state): State<AppState<U, T>>,
    Path(id): Path<TransactionId>,
) -> Result<Json<DataResponse<Transaction>>, Error>
where
    U: UserStore + Send + Sync,
    T: TransactionStore + Send + Sync,
{
    let transaction = state.transaction_store.delete(id)?;

    Ok(Json(DataResponse { data: transaction }))
}
