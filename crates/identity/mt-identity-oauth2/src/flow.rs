//! Coordinates a full authorization-code flow: initiation, callback
//! completion, and the final one-time session exchange.

use crate::client::IdentityExchanger;
use crate::config::{OAuth2Config, OAuth2ProviderConfig};
use crate::error::{OAuth2Error, OAuth2Result};
use crate::pkce::{CODE_CHALLENGE_METHOD, PkceParams};
use crate::session::OAuthSessionStore;
use crate::types::{CallbackParams, FlowInitiation, SessionExchange};
use mt_identity_auth::AuthenticationService;
use mt_identity_core::UserSummary;
use mt_identity_session::TokenService;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

pub struct OAuthFlowCoordinator {
    config: OAuth2Config,
    sessions: Arc<OAuthSessionStore>,
    auth: Arc<AuthenticationService>,
    tokens: Arc<TokenService>,
    exchanger: Arc<dyn IdentityExchanger>,
}

impl OAuthFlowCoordinator {
    pub fn new(
        config: OAuth2Config,
        sessions: Arc<OAuthSessionStore>,
        auth: Arc<AuthenticationService>,
        tokens: Arc<TokenService>,
        exchanger: Arc<dyn IdentityExchanger>,
    ) -> Self {
        Self {
            config,
            sessions,
            auth,
            tokens,
            exchanger,
        }
    }

    fn provider(&self, provider_id: &str) -> OAuth2Result<&OAuth2ProviderConfig> {
        self.config
            .providers
            .get(provider_id)
            .ok_or_else(|| OAuth2Error::UnsupportedProvider(provider_id.to_string()))
    }

    /// Start a flow: generate PKCE parameters, persist a pending session, and
    /// build the provider authorization URL.
    pub async fn initiate(&self, provider_id: &str) -> OAuth2Result<FlowInitiation> {
        let provider = self.provider(provider_id)?;

        let pkce = PkceParams::generate();
        let session_id = self
            .sessions
            .create_session(
                pkce.state.clone(),
                pkce.code_verifier.clone(),
                provider_id.to_string(),
            )
            .await;

        let authorization_url = build_authorization_url(provider, &pkce)?;

        info!(provider = provider_id, session_id = %session_id, "initiated OAuth2 flow");
        Ok(FlowInitiation {
            session_id,
            authorization_url,
            state: pkce.state,
        })
    }

    /// Complete the provider callback for a session.
    ///
    /// The state check runs first and a mismatch invalidates the callback
    /// outright. On success the session is flipped to authenticated and holds
    /// the issued token until it is exchanged.
    pub async fn handle_callback(
        &self,
        session_id: Option<&str>,
        params: &CallbackParams,
    ) -> OAuth2Result<UserSummary> {
        let session_id = session_id.ok_or(OAuth2Error::SessionNotFound)?;
        let session = self
            .sessions
            .get_session(session_id)
            .await
            .ok_or(OAuth2Error::SessionNotFound)?;

        if params.state.as_deref() != Some(session.state.as_str()) {
            warn!(session_id, "state mismatch on OAuth2 callback");
            return Err(OAuth2Error::StateMismatch);
        }

        if let Some(error) = &params.error {
            let detail = params
                .error_description
                .clone()
                .unwrap_or_else(|| error.clone());
            return Err(OAuth2Error::CallbackError(detail));
        }

        let code = params
            .code
            .as_deref()
            .ok_or_else(|| OAuth2Error::CallbackError("missing authorization code".to_string()))?;

        let provider = self.provider(&session.provider)?;
        let attributes = self
            .exchanger
            .fetch_identity(provider, code, &session.code_verifier)
            .await?;

        let user = self
            .auth
            .resolve_or_create_from_provider(&session.provider, &attributes)
            .await?;
        let token = self.tokens.issue(&user)?;

        let summary = UserSummary::from(&user);
        let summary_json = serde_json::to_string(&summary)?;
        self.sessions
            .store_authentication_result(session_id, &user.id, &token, &summary_json)
            .await;

        info!(session_id, user_id = %user.id, "OAuth2 callback completed");
        Ok(summary)
    }

    /// One-time exchange of an authenticated session for its token and user.
    pub async fn exchange(&self, session_id: &str) -> OAuth2Result<SessionExchange> {
        let session = self
            .sessions
            .exchange_session(session_id)
            .await
            .ok_or(OAuth2Error::InvalidOrExpiredSession)?;

        let token = session
            .token
            .ok_or(OAuth2Error::InvalidOrExpiredSession)?;
        let user = session
            .user_summary
            .as_deref()
            .map(serde_json::from_str::<UserSummary>)
            .transpose()?
            .ok_or(OAuth2Error::InvalidOrExpiredSession)?;

        info!(session_id, user_id = %user.id, "exchanged OAuth2 session");
        Ok(SessionExchange { token, user })
    }
}

fn build_authorization_url(
    provider: &OAuth2ProviderConfig,
    pkce: &PkceParams,
) -> OAuth2Result<String> {
    let mut url = Url::parse(&provider.authorization_endpoint)?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("response_type", "code");
        query.append_pair("client_id", &provider.client_id);
        query.append_pair("redirect_uri", &provider.redirect_uri);
        query.append_pair("scope", &provider.scopes.join(" "));
        query.append_pair("state", &pkce.state);
        query.append_pair("code_challenge", &pkce.code_challenge);
        query.append_pair("code_challenge_method", CODE_CHALLENGE_METHOD);

        for (key, value) in &provider.auth_params {
            query.append_pair(key, value);
        }
    }

    Ok(url.into())
}
