//! User persistence seam.

use crate::error::AuthResult;
use crate::user::User;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Persistence operations the authentication services need from a user store.
///
/// Implementations must be safe to call from concurrent request contexts.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    async fn exists_by_email(&self, email: &str) -> AuthResult<bool>;

    async fn exists_by_username(&self, username: &str) -> AuthResult<bool>;

    /// Insert or update by user id, returning the stored record.
    async fn save(&self, user: User) -> AuthResult<User>;
}

/// In-memory [`UserStore`] keyed by user id.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> AuthResult<bool> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.email == email))
    }

    async fn exists_by_username(&self, username: &str) -> AuthResult<bool> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.username == username))
    }

    async fn save(&self, mut user: User) -> AuthResult<User> {
        user.updated_at = Utc::now();
        let mut users = self.users.write().await;
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}
