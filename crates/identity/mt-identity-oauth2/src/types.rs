//! Wire-facing types for the OAuth2 flow endpoints.

use mt_identity_core::UserSummary;
use serde::{Deserialize, Serialize};

/// What the caller needs to start a flow: the session id to hold onto, the
/// provider URL to redirect the browser to, and the state echoed back by the
/// provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowInitiation {
    pub session_id: String,
    pub authorization_url: String,
    pub state: String,
}

/// Query parameters the provider sends to the redirect URI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Token endpoint response. Only `access_token` is required; providers vary
/// on the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

/// The payload handed out by a successful one-time session exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionExchange {
    pub token: String,
    pub user: UserSummary,
}

/// JSON body of the session-exchange endpoint, in both outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExchangeResponse {
    Success {
        success: bool,
        token: String,
        user: UserSummary,
    },
    Error {
        error: String,
    },
}

impl ExchangeResponse {
    pub fn success(exchange: SessionExchange) -> Self {
        Self::Success {
            success: true,
            token: exchange.token,
            user: exchange.user,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_response_serializes_both_shapes() {
        let ok = ExchangeResponse::success(SessionExchange {
            token: "jwt".to_string(),
            user: UserSummary {
                id: "u1".to_string(),
                email: "a@b.com".to_string(),
                username: "a".to_string(),
            },
        });
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["token"], "jwt");
        assert_eq!(json["user"]["email"], "a@b.com");

        let err = ExchangeResponse::error("Invalid or expired session");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"], "Invalid or expired session");
        assert!(json.get("success").is_none());
    }

    #[test]
    fn token_response_tolerates_minimal_payloads() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":"at-1"}"#).unwrap();
        assert_eq!(parsed.access_token, "at-1");
        assert!(parsed.refresh_token.is_none());
        assert!(parsed.expires_in.is_none());
    }
}
