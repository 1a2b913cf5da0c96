//! User model shared by the password and OAuth2 authentication paths.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    /// Absent only conceptually: provider-created users get a random
    /// unusable hash so the password path can never match.
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    /// First OAuth2 provider this account was linked to, if any.
    pub provider: Option<String>,
    pub provider_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(email: String, username: String, password_hash: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            username,
            password_hash,
            first_name: None,
            last_name: None,
            is_active: true,
            provider: None,
            provider_id: None,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }
}

/// Minimal user projection safe to hand to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub username: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_is_active_with_fresh_id() {
        let user = User::new(
            "test@example.com".to_string(),
            "testuser".to_string(),
            Some("hash".to_string()),
        );

        assert!(user.is_active);
        assert!(user.provider.is_none());
        assert!(user.last_login.is_none());
        assert!(!user.id.is_empty());

        let other = User::new(
            "other@example.com".to_string(),
            "other".to_string(),
            None,
        );
        assert_ne!(user.id, other.id);
    }

    #[test]
    fn summary_projects_public_fields() {
        let user = User::new(
            "test@example.com".to_string(),
            "testuser".to_string(),
            Some("hash".to_string()),
        );

        let summary = UserSummary::from(&user);
        assert_eq!(summary.id, user.id);
        assert_eq!(summary.email, "test@example.com");
        assert_eq!(summary.username, "testuser");

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
