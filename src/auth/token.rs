//! Issues and verifies the signed bearer tokens that prove a user's
//! identity between requests.

use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use email_address::EmailAddress;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, models::UserID};

/// How long a bearer token stays valid after it is issued.
pub const TOKEN_DURATION: Duration = Duration::days(7);

/// The keys for signing and verifying bearer tokens.
///
/// Derived once at startup from the server-held secret. A missing secret is a
/// fatal startup condition, not a per-request error, so this type offers no
/// fallible constructor.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Derive the signing and verification keys from `secret`.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }
}

/// The contents of a bearer token.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: UserID,
    /// The email address of the user the token was issued to.
    pub email: String,
    /// The time the token was issued as a unix timestamp.
    pub iat: usize,
    /// The expiry time of the token as a unix timestamp.
    pub exp: usize,
}

/// Create a signed token asserting the identity of the user `user_id`.
///
/// The token expires [TOKEN_DURATION] after issue.
///
/// # Errors
/// Returns an [Error::TokenCreation] if signing fails. The error detail
/// should only be logged on the server.
pub fn encode_token(
    user_id: UserID,
    email: &EmailAddress,
    keys: &JwtKeys,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        iat: now.unix_timestamp() as usize,
        exp: (now + TOKEN_DURATION).unix_timestamp() as usize,
    };

    encode(&Header::default(), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Check the signature and expiry of `token` and return its claims.
///
/// # Errors
/// Returns an [Error::TokenExpired] if the token's expiry has passed, or an
/// [Error::TokenMalformed] for any other verification failure. The two cases
/// are reported separately for logging but both map to a 401 response.
pub fn decode_token(token: &str, keys: &JwtKeys) -> Result<Claims, Error> {
    decode::<Claims>(token, &keys.decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| match error.kind() {
            ErrorKind::ExpiredSignature => Error::TokenExpired,
            _ => Error::TokenMalformed,
        })
}

impl<S> FromRequestParts<S> for Claims
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| Error::TokenMissing)?;

        let keys = JwtKeys::from_ref(state);

        decode_token(bearer.token(), &keys)
    }
}

#[cfg(test)]
mod token_tests {
    use jsonwebtoken::{Header, encode};
    use time::OffsetDateTime;

    use crate::{Error, models::UserID};

    use super::{Claims, JwtKeys, decode_token, encode_token};

    fn test_keys() -> JwtKeys {
        JwtKeys::from_secret("foobar")
    }

    #[test]
    fn decode_returns_issued_claims() {
        let keys = test_keys();
        let user_id = UserID::new(42);
        let email = "averyemail@email.com".parse().unwrap();

        let token = encode_token(user_id, &email, &keys).unwrap();
        let claims = decode_token(&token, &keys).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "averyemail@email.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn decode_fails_on_expired_token() {
        let keys = test_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: UserID::new(1),
            email: "foo@bar.baz".to_string(),
            iat: (now - 7200) as usize,
            exp: (now - 3600) as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding_key).unwrap();

        assert_eq!(decode_token(&token, &keys), Err(Error::TokenExpired));
    }

    #[test]
    fn decode_fails_on_garbage_token() {
        let keys = test_keys();

        assert_eq!(
            decode_token("not.a.token", &keys),
            Err(Error::TokenMalformed)
        );
    }

    #[test]
    fn decode_fails_on_token_signed_with_other_secret() {
        let user_id = UserID::new(7);
        let email = "foo@bar.baz".parse().unwrap();
        let token = encode_token(user_id, &email, &JwtKeys::from_secret("hunter2")).unwrap();

        assert_eq!(
            decode_token(&token, &JwtKeys::from_secret("hunter3")),
            Err(Error::TokenMalformed)
        );
    }
}
