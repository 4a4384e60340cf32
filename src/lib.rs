//! Cashflow is a personal finance tracker: users register, log in, and
//! record their income and expenses.
//!
//! This library provides a REST API that serves JSON. See [build_router] for
//! the available routes.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod auth;
mod db;
mod endpoints;
mod models;
mod routes;
mod state;

pub mod stores;

pub use auth::{Claims, JwtKeys, PasswordHash};
pub use db::initialize as initialize_db;
pub use models::{Transaction, TransactionType, UserID, UserRecord, UserView};
pub use routes::build_router;
pub use state::AppState;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required request field was absent or empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The email address could not be parsed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// The password does not meet the minimum length requirement.
    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),

    /// An empty string was used for the user's display name.
    #[error("name must not be empty")]
    EmptyName,

    /// The transaction type was not one of the permitted values.
    #[error("transaction type must be either income or expense")]
    InvalidTransactionType,

    /// A negative (or non-finite) amount was used for a transaction.
    #[error("amount must be a non-negative number")]
    InvalidAmount,

    /// An empty string was used for a transaction category.
    #[error("category must not be empty")]
    EmptyCategory,

    /// A date string could not be parsed as RFC 3339.
    #[error("could not parse \"{0}\" as an RFC 3339 date-time")]
    InvalidDate(String),

    /// A bulk update was requested with an empty or missing id list.
    #[error("ids must be a non-empty array")]
    EmptyIdList,

    /// A bulk delete was requested without the explicit confirmation flag.
    #[error("deleting all transactions requires confirm=true")]
    UnconfirmedWipe,

    /// The email used to register is already taken. The client should try
    /// again with a different email address.
    #[error("a user with this email already exists")]
    DuplicateEmail,

    /// The email and password combination did not match a user.
    ///
    /// Deliberately covers both an unknown email and a wrong password so the
    /// client cannot tell which of the two failed.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The request did not carry a bearer token.
    #[error("missing bearer token")]
    TokenMissing,

    /// The bearer token's expiry has passed.
    #[error("token has expired")]
    TokenExpired,

    /// The bearer token failed signature or format checks.
    #[error("invalid token")]
    TokenMalformed,

    /// Signing a new token failed.
    ///
    /// The inner string should only be logged on the server, never sent to
    /// the client.
    #[error("token creation failed: {0}")]
    TokenCreation(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The inner string should only be logged on the server, never sent to
    /// the client.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The requested resource was not found.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => Error::SqlError(error),
        }
    }
}

impl Error {
    /// The HTTP status code this error maps to.
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingField(_)
            | Error::InvalidEmail(_)
            | Error::PasswordTooShort(_)
            | Error::EmptyName
            | Error::InvalidTransactionType
            | Error::InvalidAmount
            | Error::EmptyCategory
            | Error::InvalidDate(_)
            | Error::EmptyIdList
            | Error::UnconfirmedWipe => StatusCode::BAD_REQUEST,
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::InvalidCredentials
            | Error::TokenMissing
            | Error::TokenExpired
            | Error::TokenMalformed => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::TokenCreation(_) | Error::HashingError(_) | Error::SqlError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        // Internal details must not reach the client.
        let message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {self}");
            "internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::http::StatusCode;

    use super::Error;

    #[test]
    fn validation_errors_map_to_bad_request() {
        for error in [
            Error::MissingField("email"),
            Error::InvalidTransactionType,
            Error::InvalidAmount,
            Error::EmptyCategory,
            Error::UnconfirmedWipe,
        ] {
            assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn auth_errors_map_to_unauthorized() {
        for error in [
            Error::InvalidCredentials,
            Error::TokenMissing,
            Error::TokenExpired,
            Error::TokenMalformed,
        ] {
            assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn duplicate_email_maps_to_conflict() {
        assert_eq!(Error::DuplicateEmail.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn no_rows_becomes_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }
}
