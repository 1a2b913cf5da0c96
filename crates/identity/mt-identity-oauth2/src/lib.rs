//! OAuth2 authorization-code flow with PKCE.
//!
//! This crate bridges a redirect-based third-party login to a token-based API
//! session: PKCE parameter generation, a short-lived one-time-exchange session
//! broker, the provider identity exchange, and the coordinator tying them to
//! user resolution and token issuance.

mod client;
mod config;
mod error;
mod flow;
mod pkce;
mod session;
mod types;


pub use client::{HttpIdentityExchanger, IdentityExchanger};
pub use config::{OAuth2Config, OAuth2ProviderConfig};
pub use error::{OAuth2Error, OAuth2Result};
pub use flow::OAuthFlowCoordinator;
pub use pkce::{CODE_CHALLENGE_METHOD, PkceParams};
pub use session::{OAuthSession, OAuthSessionStore, SessionStoreConfig};
pub use types::{CallbackParams, ExchangeResponse, FlowInitiation, SessionExchange, TokenResponse};

// Re-export common types for convenience
pub use mt_identity_core::{AuthError, User, UserSummary};
