//! Implements a struct that holds the state of the REST server.

use axum::extract::FromRef;

use crate::{
    auth::JwtKeys,
    stores::{TransactionStore, UserStore},
};

/// The state of the REST server.
///
/// Owns the token-signing keys and the store handles. Constructed once at
/// startup, after the database has been initialized, and shared by cloning
/// (the stores share one connection handle internally).
#[derive(Clone)]
pub struct AppState<U, T>
where
    U: UserStore + Send + Sync,
    T: TransactionStore + Send + Sync,
{
    /// The keys for signing and verifying bearer tokens.
    pub jwt_keys: JwtKeys,
    /// The store for managing [users](crate::models::UserRecord).
    pub user_store: U,
    /// The store for managing [transactions](crate::models::Transaction).
    pub transaction_store: T,
}

impl<U, T> AppState<U, T>
where
    U: UserStore + Send + Sync,
    T: TransactionStore + Send + Sync,
{
    /// Create a new [AppState].
    ///
    /// `jwt_secret` is the server-held secret for signing bearer tokens.
    pub fn new(jwt_secret: &str, user_store: U, transaction_store: T) -> Self {
        Self {
            jwt_keys: JwtKeys::from_secret(jwt_secret),
            user_store,
            transaction_store,
        }
    }
}

// This impl lets the `Claims` extractor get the verification key from our
// state.
impl<U, T> FromRef<AppState<U, T>> for JwtKeys
where
    U: UserStore + Send + Sync,
    T: TransactionStore + Send + Sync,
{
    fn from_ref(state: &AppState<U, T>) -> Self {
        state.jwt_keys.clone()
    }
}
