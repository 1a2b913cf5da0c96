//! Authentication error taxonomy.

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Recoverable, user-facing authentication failures.
///
/// `InvalidCredentials` is deliberately shared between the unknown-email and
/// wrong-password cases so login responses carry no enumeration signal.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Login with {0} is not supported")]
    UnsupportedProvider(String),

    #[error("Email not provided by OAuth2 provider")]
    MissingEmail,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token issuance failed: {0}")]
    Token(String),

    #[error("User store error: {0}")]
    Store(String),
}
