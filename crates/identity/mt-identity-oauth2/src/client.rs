//! Provider-side HTTP: authorization-code exchange and userinfo retrieval.

use crate::config::{OAuth2Config, OAuth2ProviderConfig};
use crate::error::{OAuth2Error, OAuth2Result};
use crate::types::TokenResponse;
use async_trait::async_trait;
use std::time::Duration;

/// The flow coordinator's single suspension point against the provider:
/// trade the authorization code for the user's identity attributes.
#[async_trait]
pub trait IdentityExchanger: Send + Sync {
    async fn fetch_identity(
        &self,
        provider: &OAuth2ProviderConfig,
        code: &str,
        code_verifier: &str,
    ) -> OAuth2Result<serde_json::Value>;
}

/// reqwest-backed exchanger talking to the provider's real endpoints.
pub struct HttpIdentityExchanger {
    http_client: reqwest::Client,
}

impl HttpIdentityExchanger {
    pub fn new(timeout_seconds: u64) -> OAuth2Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self { http_client })
    }

    /// Build an exchanger honoring the flow config's HTTP timeout.
    pub fn from_config(config: &OAuth2Config) -> OAuth2Result<Self> {
        Self::new(config.http_timeout_seconds)
    }

    /// POST the code and PKCE verifier to the token endpoint.
    pub async fn exchange_code(
        &self,
        provider: &OAuth2ProviderConfig,
        code: &str,
        code_verifier: &str,
    ) -> OAuth2Result<TokenResponse> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
            ("redirect_uri", provider.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ];

        let response = self
            .http_client
            .post(&provider.token_endpoint)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuth2Error::TokenExchangeFailed(format!(
                "{status}: {body}"
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuth2Error::InvalidTokenResponse(e.to_string()))
    }

    /// GET the userinfo endpoint with the provider access token.
    pub async fn get_user_info(
        &self,
        provider: &OAuth2ProviderConfig,
        access_token: &str,
    ) -> OAuth2Result<serde_json::Value> {
        let response = self
            .http_client
            .get(&provider.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuth2Error::UserInfoFailed(format!("{status}: {body}")));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| OAuth2Error::InvalidUserInfoResponse(e.to_string()))
    }
}

#[async_trait]
impl IdentityExchanger for HttpIdentityExchanger {
    async fn fetch_identity(
        &self,
        provider: &OAuth2ProviderConfig,
        code: &str,
        code_verifier: &str,
    ) -> OAuth2Result<serde_json::Value> {
        let token_response = self.exchange_code(provider, code, code_verifier).await?;
        self.get_user_info(provider, &token_response.access_token)
            .await
    }
}
