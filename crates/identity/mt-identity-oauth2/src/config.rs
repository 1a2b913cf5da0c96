//! OAuth2 provider and flow configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for one OAuth2 provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2ProviderConfig {
    pub provider_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// Additional parameters to include in the authorization request
    pub auth_params: HashMap<String, String>,
}

impl OAuth2ProviderConfig {
    /// Google preset with the standard endpoints.
    pub fn google(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: "google".to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_endpoint: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            redirect_uri: redirect_uri.into(),
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
            auth_params: HashMap::new(),
        }
    }
}

/// Flow-level configuration: the provider registry plus HTTP behavior.
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    pub providers: HashMap<String, OAuth2ProviderConfig>,
    pub http_timeout_seconds: u64,
}

impl Default for OAuth2Config {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            http_timeout_seconds: 30,
        }
    }
}

impl OAuth2Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_provider(mut self, config: OAuth2ProviderConfig) -> Self {
        self.providers.insert(config.provider_id.clone(), config);
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = seconds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_provider_registers_by_id() {
        let config = OAuth2Config::new()
            .add_provider(OAuth2ProviderConfig::google("id", "secret", "http://localhost/cb"));

        assert!(config.providers.contains_key("google"));
        let google = &config.providers["google"];
        assert!(google.authorization_endpoint.contains("accounts.google.com"));
        assert_eq!(google.scopes, vec!["openid", "email", "profile"]);
    }
}
