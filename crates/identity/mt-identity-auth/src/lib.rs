//! User authentication: password registration/login and OAuth2 identity
//! resolution.
//!
//! Passwords are hashed with Argon2. Login failures for an unknown email and
//! for a wrong password are indistinguishable, both in the returned error and
//! in cost: the unknown-email path verifies against a fixed dummy hash so the
//! two branches take comparable time.

mod provider_info;

pub use provider_info::{ProviderUserInfo, extract as extract_provider_info};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::Utc;
use mt_identity_core::{AuthError, AuthResult, User, UserStore};
use mt_identity_session::TokenService;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

// A real Argon2 hash of an unrelated password, verified against when the
// email does not resolve to a user.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$9QsJRKgzJkKaOUvlp7gl2Q$qmE3qIFBNJ6nZYbLYXEI2uo0zZc7T0Q8LU1ZsqsZ3QE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Result of a successful password authentication: a bearer token plus the
/// authenticated user.
#[derive(Debug, Clone)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

pub struct AuthenticationService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
}

impl AuthenticationService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    /// Register a new account with a password credential.
    ///
    /// Uniqueness of email and username is checked before any write.
    pub async fn register_with_password(&self, input: RegisterInput) -> AuthResult<AuthPayload> {
        if self.users.exists_by_email(&input.email).await? {
            return Err(AuthError::DuplicateEmail);
        }
        if self.users.exists_by_username(&input.username).await? {
            return Err(AuthError::DuplicateUsername);
        }

        let password_hash = hash_password(&input.password)?;
        let mut user = User::new(input.email, input.username, Some(password_hash));
        user.first_name = input.first_name;
        user.last_name = input.last_name;

        let user = self.users.save(user).await?;
        let token = self.issue_token(&user)?;

        info!(user_id = %user.id, "registered new user");
        Ok(AuthPayload { token, user })
    }

    /// Authenticate a password credential.
    ///
    /// Check order: lookup, active flag, password match. Unknown email and
    /// wrong password both fail with the identical `InvalidCredentials`.
    pub async fn login_with_password(&self, email: &str, password: &str) -> AuthResult<AuthPayload> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => {
                // Burn an Argon2 verification so this branch costs the same
                // as a wrong password.
                let _ = verify_password(password, DUMMY_HASH);
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        let matches = user
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(password, hash));
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, "user logged in");
        Ok(AuthPayload { token, user })
    }

    /// Resolve the local user for a third-party identity, creating one on
    /// first sight.
    ///
    /// Existing users keep their first provider linkage; name fields are
    /// refreshed from non-empty provider values. New users get a username
    /// derived from the email local part (suffixed until unique) and a
    /// random unusable password hash. `last_login` is updated on every call.
    pub async fn resolve_or_create_from_provider(
        &self,
        provider: &str,
        attributes: &Value,
    ) -> AuthResult<User> {
        let user_info = provider_info::extract(provider, attributes)?;
        let email = user_info
            .email
            .clone()
            .filter(|email| !email.is_empty())
            .ok_or(AuthError::MissingEmail)?;

        let mut user = match self.users.find_by_email(&email).await? {
            Some(user) => update_existing_user(user, &user_info, provider),
            None => self.create_user_from_provider(&email, &user_info, provider).await?,
        };

        user.last_login = Some(Utc::now());
        let user = self.users.save(user).await?;

        info!(user_id = %user.id, provider, "resolved OAuth2 user");
        Ok(user)
    }

    async fn create_user_from_provider(
        &self,
        email: &str,
        user_info: &ProviderUserInfo,
        provider: &str,
    ) -> AuthResult<User> {
        let username = self.unique_username_from_email(email).await?;
        // Provider-authenticated users have no local password; store a hash
        // of a random value so the password path can never match.
        let password_hash = hash_password(&Uuid::new_v4().to_string())?;

        let mut user = User::new(email.to_string(), username, Some(password_hash));
        user.first_name = user_info.first_name.clone();
        user.last_name = user_info.last_name.clone();
        user.provider = Some(provider.to_string());
        user.provider_id = user_info.id.clone();
        Ok(user)
    }

    /// Derive a username from the email local part, appending an incrementing
    /// suffix until it is free.
    async fn unique_username_from_email(&self, email: &str) -> AuthResult<String> {
        let base = email.split('@').next().unwrap_or(email);
        let mut username = base.to_string();
        let mut counter = 1;

        while self.users.exists_by_username(&username).await? {
            username = format!("{base}{counter}");
            counter += 1;
        }

        Ok(username)
    }

    fn issue_token(&self, user: &User) -> AuthResult<String> {
        self.tokens
            .issue(user)
            .map_err(|e| AuthError::Token(e.to_string()))
    }
}

fn update_existing_user(mut user: User, user_info: &ProviderUserInfo, provider: &str) -> User {
    // First provider wins: linkage is only set when absent.
    if user.provider.is_none() {
        user.provider = Some(provider.to_string());
        user.provider_id = user_info.id.clone();
    }

    if let Some(first_name) = user_info.first_name.clone().filter(|n| !n.is_empty()) {
        user.first_name = Some(first_name);
    }
    if let Some(last_name) = user_info.last_name.clone().filter(|n| !n.is_empty()) {
        user.last_name = Some(last_name);
    }

    user
}

fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut rand_core::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
