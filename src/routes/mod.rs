//! This module defines the REST API's routes and their handlers.

use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    Error, endpoints,
    state::AppState,
    stores::{TransactionStore, UserStore},
};

mod auth;
mod transaction;

/// Return a router with all the app's routes.
pub fn build_router<U, T>(state: AppState<U, T>) -> Router
where
    U: UserStore + Clone + Send + Sync + 'static,
    T: TransactionStore + Clone + Send + Sync + 'static,
{
    Router::new()
        .route(endpoints::REGISTER, post(auth::register::<U, T>))
        .route(endpoints::LOG_IN, post(auth::log_in::<U, T>))
        .route(endpoints::ME, get(auth::get_me::<U, T>))
        .route(
            endpoints::TRANSACTIONS,
            get(transaction::get_transactions::<U, T>)
                .post(transaction::create_transaction::<U, T>)
                .delete(transaction::delete_all_transactions::<U, T>)
                .patch(transaction::bulk_update_transactions::<U, T>),
        )
        .route(
            endpoints::TRANSACTION,
            axum::routing::put(transaction::update_transaction::<U, T>)
                .delete(transaction::delete_transaction::<U, T>),
        )
        .fallback(not_found)
        .with_state(state)
}

/// The fallback handler, so unknown paths get the same JSON error shape as
/// everything else.
async fn not_found() -> Error {
    Error::NotFound
}


#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;

    use super::test_utils::test_server;

    #[tokio::test]
    async fn unknown_path_returns_json_error() {
        let server = test_server();

        let response = server.get("/definitely/not/a/route").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert!(body.get("error").is_some());
    }
}
