//! Bearer token issuance and validation.
//!
//! Tokens are compact HS256 JWTs carrying the user's id, email and username,
//! with the email as subject. They are stateless: validity is determined
//! purely by signature and expiry at verification time, with no server-side
//! lookup and no revocation list. Rotating the secret invalidates every
//! previously issued token.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mt_identity_core::User;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Claim extraction was attempted on a token that does not validate.
    #[error("Invalid token")]
    InvalidToken,
}

/// Claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user's email, their stable login identifier.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub user_id: String,
    pub email: String,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub expiry_hours: i64,
    pub algorithm: Algorithm,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            expiry_hours: 1,
            algorithm: Algorithm::HS256,
        }
    }
}

impl TokenConfig {
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    pub fn with_expiry_hours(mut self, hours: i64) -> Self {
        self.expiry_hours = hours;
        self
    }
}

/// Issues and validates bearer tokens.
///
/// Contract: [`TokenService::validate`] returns `false` for any token that is
/// malformed, tampered with, unsigned, empty, **or expired** — expiry is part
/// of validation, not a separate gate callers can forget. [`is_expired`]
/// exists for callers that want to distinguish a stale token from a forged
/// one; it too fails closed on unparseable input.
///
/// [`is_expired`]: TokenService::is_expired
pub struct TokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Mint a token for an authenticated user.
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.config.expiry_hours);

        let claims = TokenClaims {
            sub: user.email.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            user_id: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
        };

        let token = encode(
            &Header::new(self.config.algorithm),
            &claims,
            &self.encoding_key,
        )?;

        debug!(user_id = %user.id, "issued bearer token");
        Ok(token)
    }

    /// True if the token is well-formed, correctly signed, and unexpired.
    pub fn validate(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation(true)).is_ok()
    }

    /// True if the token's expiry has passed, or the token cannot be parsed
    /// and signature-checked at all.
    ///
    /// The boundary matches [`validate`]: a token whose `exp` equals the
    /// current second is still valid and not yet expired.
    ///
    /// [`validate`]: TokenService::validate
    pub fn is_expired(&self, token: &str) -> bool {
        match decode::<TokenClaims>(token, &self.decoding_key, &self.validation(false)) {
            Ok(data) => data.claims.exp < Utc::now().timestamp(),
            Err(_) => true,
        }
    }

    /// Extract the subject (email) from a valid token.
    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        self.claims(token).map(|claims| claims.sub)
    }

    /// Extract the user id from a valid token.
    pub fn extract_user_id(&self, token: &str) -> Result<String, TokenError> {
        self.claims(token).map(|claims| claims.user_id)
    }

    /// Decode with full validation; any failure collapses to `InvalidToken`.
    fn claims(&self, token: &str) -> Result<TokenClaims, TokenError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation(true))
            .map(|data| data.claims)
            .map_err(|_| TokenError::InvalidToken)
    }

    fn validation(&self, validate_exp: bool) -> Validation {
        let mut validation = Validation::new(self.config.algorithm);
        validation.validate_exp = validate_exp;
        validation.leeway = 0;
        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mt_identity_core::User;

    fn test_user() -> User {
        User::new(
            "test@example.com".to_string(),
            "testuser".to_string(),
            Some("hash".to_string()),
        )
    }

    fn service() -> TokenService {
        TokenService::new(TokenConfig::default().with_secret("test-secret"))
    }

    #[test]
    fn issue_then_validate_and_extract() {
        let tokens = service();
        let user = test_user();

        let token = tokens.issue(&user).unwrap();

        assert!(tokens.validate(&token));
        assert!(!tokens.is_expired(&token));
        assert_eq!(tokens.extract_subject(&token).unwrap(), "test@example.com");
        assert_eq!(tokens.extract_user_id(&token).unwrap(), user.id);
    }

    #[test]
    fn validate_rejects_garbage_without_panicking() {
        let tokens = service();

        assert!(!tokens.validate(""));
        assert!(!tokens.validate("not-a-jwt"));
        assert!(!tokens.validate("a.b.c"));
        assert!(tokens.is_expired("not-a-jwt"));
    }

    #[test]
    fn validate_rejects_tampered_token() {
        let tokens = service();
        let token = tokens.issue(&test_user()).unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('x');
        assert!(!tokens.validate(&tampered));
        assert!(tokens.extract_subject(&tampered).is_err());
    }

    #[test]
    fn validate_rejects_token_signed_with_other_secret() {
        let token = service().issue(&test_user()).unwrap();
        let other = TokenService::new(TokenConfig::default().with_secret("rotated"));

        assert!(!other.validate(&token));
        assert!(matches!(
            other.extract_user_id(&token),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn validity_checks_agree_at_the_expiry_boundary() {
        let tokens = service();
        let user = test_user();

        // Mint a token expiring this very second; whichever side of the
        // boundary the checks run on, they must agree.
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: user.email.clone(),
            exp: now,
            iat: now,
            user_id: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("test-secret".as_bytes()),
        )
        .unwrap();

        assert_eq!(tokens.validate(&token), !tokens.is_expired(&token));
    }

    #[test]
    fn expired_token_fails_validation_and_reports_expired() {
        let tokens = service();
        let user = test_user();

        // Force the expiry into the past by minting with a negative ttl.
        let stale =
            TokenService::new(TokenConfig::default().with_secret("test-secret").with_expiry_hours(-2));
        let token = stale.issue(&user).unwrap();

        assert!(tokens.is_expired(&token));
        assert!(!tokens.validate(&token));
        // Extraction follows the validation contract: expired means invalid.
        assert!(tokens.extract_subject(&token).is_err());
    }
}
