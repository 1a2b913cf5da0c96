//! Short-lived OAuth2 session broker with one-time exchange.
//!
//! A session is created when a flow starts, mutated exactly once when the
//! provider callback completes, and destroyed either by a successful exchange
//! or by the background reaper. Exchange is consume-on-read: the record is
//! removed before its eligibility is checked, so a session that fails the
//! check is gone too and can never be retried.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// State tracked for one OAuth2 flow, keyed by an unguessable session id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthSession {
    pub session_id: String,
    pub state: String,
    pub code_verifier: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
    // Set only when the provider callback completes successfully.
    pub user_id: Option<String>,
    pub token: Option<String>,
    pub user_summary: Option<String>,
    pub authenticated: bool,
}

impl OAuthSession {
    fn new(state: String, code_verifier: String, provider: String) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            state,
            code_verifier,
            provider,
            created_at: Utc::now(),
            user_id: None,
            token: None,
            user_summary: None,
            authenticated: false,
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now() - self.created_at > ttl
    }
}

#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    /// Maximum session age; expired sessions are invisible to every accessor.
    pub session_ttl: Duration,
    /// How often the background reaper sweeps expired sessions.
    pub reaper_interval: StdDuration,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::minutes(10),
            reaper_interval: StdDuration::from_secs(5 * 60),
        }
    }
}

impl SessionStoreConfig {
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_reaper_interval(mut self, interval: StdDuration) -> Self {
        self.reaper_interval = interval;
        self
    }
}

/// Concurrency-safe, self-expiring store for in-flight OAuth2 sessions.
pub struct OAuthSessionStore {
    sessions: Arc<RwLock<HashMap<String, OAuthSession>>>,
    config: SessionStoreConfig,
    reaper: Mutex<Option<JoinHandle<()>>>,
}

impl OAuthSessionStore {
    /// Create a store without a reaper; callers sweep via
    /// [`cleanup_expired`](Self::cleanup_expired).
    pub fn new(config: SessionStoreConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
            reaper: Mutex::new(None),
        }
    }

    /// Create a store and start its background reaper.
    pub fn start(config: SessionStoreConfig) -> Arc<Self> {
        let store = Arc::new(Self::new(config));
        store.spawn_reaper();
        store
    }

    fn spawn_reaper(&self) {
        let sessions = Arc::clone(&self.sessions);
        let ttl = self.config.session_ttl;
        let period = self.config.reaper_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick fires immediately; skip it.
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = reap(&sessions, ttl).await;
                if removed > 0 {
                    debug!(removed, "reaped expired OAuth2 sessions");
                }
            }
        });

        if let Ok(mut reaper) = self.reaper.lock() {
            *reaper = Some(handle);
        }
    }

    /// Stop the background reaper. Idempotent.
    pub fn shutdown(&self) {
        if let Ok(mut reaper) = self.reaper.lock() {
            if let Some(handle) = reaper.take() {
                handle.abort();
            }
        }
    }

    /// Insert a new pending session and return its id.
    pub async fn create_session(
        &self,
        state: String,
        code_verifier: String,
        provider: String,
    ) -> String {
        let session = OAuthSession::new(state, code_verifier, provider);
        let session_id = session.session_id.clone();

        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.clone(), session);
        session_id
    }

    /// Read-only lookup; `None` for an unknown or expired id. Never mutates
    /// the store, so it is safe to call repeatedly within one callback.
    pub async fn get_session(&self, session_id: &str) -> Option<OAuthSession> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .filter(|s| !s.is_expired(self.config.session_ttl))
            .cloned()
    }

    /// Record the callback's authentication result, flipping the session to
    /// authenticated. Silently ignored when the session is absent or expired.
    pub async fn store_authentication_result(
        &self,
        session_id: &str,
        user_id: &str,
        token: &str,
        user_summary: &str,
    ) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            if !session.is_expired(self.config.session_ttl) {
                session.user_id = Some(user_id.to_string());
                session.token = Some(token.to_string());
                session.user_summary = Some(user_summary.to_string());
                session.authenticated = true;
            }
        }
    }

    /// One-time exchange: atomically remove the session and return it only
    /// if it was unexpired and authenticated. A session that fails the check
    /// is still consumed; two concurrent exchanges for the same id see at
    /// most one `Some`.
    pub async fn exchange_session(&self, session_id: &str) -> Option<OAuthSession> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.remove(session_id)?;

        if session.is_expired(self.config.session_ttl) || !session.authenticated {
            return None;
        }
        Some(session)
    }

    /// Remove every session older than the ttl, returning how many went.
    pub async fn cleanup_expired(&self) -> usize {
        reap(&self.sessions, self.config.session_ttl).await
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

async fn reap(sessions: &RwLock<HashMap<String, OAuthSession>>, ttl: Duration) -> usize {
    let mut sessions = sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, session| !session.is_expired(ttl));
    before - sessions.len()
}

impl Drop for OAuthSessionStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}
