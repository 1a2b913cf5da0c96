//! OAuth2 flow error types.

use thiserror::Error;

pub type OAuth2Result<T> = Result<T, OAuth2Error>;

#[derive(Debug, Error)]
pub enum OAuth2Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unsupported OAuth2 provider: {0}")]
    UnsupportedProvider(String),

    /// No session for the callback's session id, or it has expired.
    #[error("OAuth2 session not found or expired")]
    SessionNotFound,

    /// The callback's state parameter does not match the stored one.
    /// Treated as a potential CSRF attempt, never downgraded to a
    /// generic error.
    #[error("State parameter mismatch")]
    StateMismatch,

    /// The session was already exchanged, never authenticated, or expired.
    #[error("Invalid or expired session")]
    InvalidOrExpiredSession,

    #[error("Provider callback error: {0}")]
    CallbackError(String),

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("User info request failed: {0}")]
    UserInfoFailed(String),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("Invalid user info response: {0}")]
    InvalidUserInfoResponse(String),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Identity error: {0}")]
    Identity(#[from] mt_identity_core::AuthError),

    #[error("Token error: {0}")]
    Token(#[from] mt_identity_session::TokenError),
}
