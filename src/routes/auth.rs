//! This file defines the routes for registering a user, logging in, and
//! fetching the authenticated user's profile.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::{Claims, PasswordHash, encode_token},
    models::{UserView, parse_email, parse_name},
    state::AppState,
    stores::{TransactionStore, UserStore},
};

/// The request body for registration.
///
/// All fields are optional at the parsing stage so that missing fields
/// produce a 400 with a useful message instead of the extractor's default
/// rejection.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterData {
    /// The email to register with.
    pub email: Option<String>,
    /// The plaintext password to register with.
    pub password: Option<String>,
    /// The user's display name.
    pub name: Option<String>,
}

/// The request body for log-in.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogInData {
    /// The email entered during sign-in.
    pub email: Option<String>,
    /// The password entered during sign-in.
    pub password: Option<String>,
}

/// The response body for a successful registration or log-in.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// A bearer token asserting the user's identity.
    pub token: String,
    /// The public projection of the user.
    pub user: UserView,
}

/// The response body for the profile route.
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    /// The public projection of the authenticated user.
    pub user: UserView,
}

/// A route handler for registering a new user.
///
/// On success, responds with 201 and the new user plus a bearer token, so
/// the client is logged in immediately.
pub async fn register<U, T>(
    State(mut state): State<AppState<U, T>>,
    Json(data): Json<RegisterData>,
) -> Result<(StatusCode, Json<AuthResponse>), Error>
where
    U: UserStore + Send + Sync,
    T: TransactionStore + Send + Sync,
{
    let email = parse_email(data.email.as_deref().unwrap_or_default())?;
    let raw_password = data
        .password
        .filter(|password| !password.is_empty())
        .ok_or(Error::MissingField("password"))?;
    let name = parse_name(data.name.as_deref().unwrap_or_default())?;

    let password_hash = PasswordHash::from_raw_password(&raw_password, PasswordHash::DEFAULT_COST)?;

    let user = state.user_store.create(email, name, password_hash)?;
    let token = encode_token(user.id, &user.email, &state.jwt_keys)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserView::from(&user),
        }),
    ))
}

/// A route handler for signing in a user.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email or password field is missing (400).
/// - The email does not belong to a registered user (401).
/// - The password is not correct (401).
///
/// The two 401 cases deliberately produce identical responses so the client
/// cannot tell whether the email or the password was wrong.
pub async fn log_in<U, T>(
    State(state): State<AppState<U, T>>,
    Json(data): Json<LogInData>,
) -> Result<Json<AuthResponse>, Error>
where
    U: UserStore + Send + Sync,
    T: TransactionStore + Send + Sync,
{
    let raw_email = data
        .email
        .filter(|email| !email.is_empty())
        .ok_or(Error::MissingField("email"))?;
    let raw_password = data
        .password
        .filter(|password| !password.is_empty())
        .ok_or(Error::MissingField("password"))?;

    let email = parse_email(&raw_email).map_err(|_| Error::InvalidCredentials)?;

    let user = state
        .user_store
        .get_by_email(&email)
        .map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            error => error,
        })?;

    if !user.password_hash.verify(&raw_password) {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_token(user.id, &user.email, &state.jwt_keys)?;

    Ok(Json(AuthResponse {
        token,
        user: UserView::from(&user),
    }))
}

/// A route handler for fetching the profile of the authenticated user.
///
/// The bearer token is verified by the [Claims] extractor; a missing or
/// invalid token never reaches this function body.
pub async fn get_me<U, T>(
    State(state): State<AppState<U, T>>,
    claims: Claims,
) -> Result<Json<MeResponse>, Error>
where
    U: UserStore + Send + Sync,
    T: TransactionStore + Send + Sync,
{
    let user = state.user_store.get(claims.sub)?;

    Ok(Json(MeResponse {
        user: UserView::from(&user),
    }))
}

#[cfg(test)]
mod auth_route_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{endpoints, routes::test_utils::test_server};

    use super::{AuthResponse, MeResponse};

    #[tokio::test]
    async fn register_succeeds_and_hides_password() {
        let server = test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "email": "a@b.com",
                "password": "secret1",
                "name": "A",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);

        let body: serde_json::Value = response.json();
        assert!(!body["token"].as_str().unwrap().is_empty());
        assert_eq!(body["user"]["email"], "a@b.com");
        assert_eq!(body["user"]["name"], "A");

        let user_object = body["user"].as_object().unwrap();
        assert!(!user_object.contains_key("password"));
        assert!(!user_object.contains_key("passwordHash"));
    }

    #[tokio::test]
    async fn register_normalizes_email() {
        let server = test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "email": "  Foo@Bar.BAZ ",
                "password": "secret1",
                "name": "Foo",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<AuthResponse>().user.email.as_str(), "foo@bar.baz");
    }

    #[tokio::test]
    async fn register_fails_with_missing_fields() {
        let server = test_server();

        for body in [
            json!({ "password": "secret1", "name": "A" }),
            json!({ "email": "a@b.com", "name": "A" }),
            json!({ "email": "a@b.com", "password": "secret1" }),
        ] {
            server
                .post(endpoints::REGISTER)
                .json(&body)
                .await
                .assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn register_fails_with_short_password() {
        let server = test_server();

        server
            .post(endpoints::REGISTER)
            .json(&json!({
                "email": "a@b.com",
                "password": "five5",
                "name": "A",
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_fails_with_duplicate_email() {
        let server = test_server();
        let body = json!({
            "email": "a@b.com",
            "password": "secret1",
            "name": "A",
        });

        server
            .post(endpoints::REGISTER)
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post(endpoints::REGISTER)
            .json(&body)
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn log_in_round_trip_returns_same_user() {
        let server = test_server();

        let registered: AuthResponse = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "email": "a@b.com",
                "password": "secret1",
                "name": "A",
            }))
            .await
            .json();

        let wrong_password_response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "a@b.com", "password": "wrong1" }))
            .await;
        wrong_password_response.assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "a@b.com", "password": "secret1" }))
            .await;
        response.assert_status_ok();

        assert_eq!(response.json::<AuthResponse>().user.id, registered.user.id);
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_fields() {
        let server = test_server();

        server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "a@b.com" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .post(endpoints::LOG_IN)
            .json(&json!({ "password": "secret1" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let server = test_server();

        server
            .post(endpoints::REGISTER)
            .json(&json!({
                "email": "a@b.com",
                "password": "secret1",
                "name": "A",
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let wrong_password = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "a@b.com", "password": "wrong1" }))
            .await;
        let unknown_email = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "nobody@b.com", "password": "secret1" }))
            .await;

        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        unknown_email.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.text(), unknown_email.text());
    }

    #[tokio::test]
    async fn get_me_returns_profile_for_valid_token() {
        let server = test_server();

        let registered: AuthResponse = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "email": "a@b.com",
                "password": "secret1",
                "name": "A",
            }))
            .await
            .json();

        let response = server
            .get(endpoints::ME)
            .authorization_bearer(registered.token)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<MeResponse>().user, registered.user);
    }

    #[tokio::test]
    async fn get_me_fails_with_missing_header() {
        let server = test_server();

        server
            .get(endpoints::ME)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_me_fails_with_garbage_token() {
        let server = test_server();

        server
            .get(endpoints::ME)
            .authorization_bearer("not.a.token")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
