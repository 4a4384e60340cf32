//! The API endpoint URIs.

/// The route for registering a new user.
pub const REGISTER: &str = "/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/auth/login";
/// The route for getting the profile of the authenticated user.
pub const ME: &str = "/auth/me";
/// The route to access the transaction collection.
pub const TRANSACTIONS: &str = "/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/transactions/{id}";
