//! Password hashing and bearer-token authentication.

mod password;
mod token;

pub use password::PasswordHash;
pub use token::{Claims, JwtKeys, TOKEN_DURATION, encode_token};
