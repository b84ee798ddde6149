//! Front-end login sessions.
//!
//! The HTTP layer only sees the [`SessionStore`] trait, so tests can swap
//! in their own store and no session state lives in globals.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

/// How long a session stays valid; matches the cookie lifetime.
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// Create / validate / revoke opaque session tokens.
pub trait SessionStore: Send + Sync + 'static {
    /// Starts a session and returns its token.
    fn create(&self) -> String;
    /// Returns `true` if `token` names a live session.
    fn validate(&self, token: &str) -> bool;
    /// Ends the session named by `token`, if any.
    fn revoke(&self, token: &str);
}

/// Process-local session store with expiry.
#[derive(Debug)]
pub struct InMemorySessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Instant>>,
}

impl InMemorySessionStore {
    /// Creates a store whose sessions expire after `ttl`.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let now = Instant::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, expires| *expires > now);
        sessions.insert(token.clone(), now + self.ttl);
        debug!(active = sessions.len(), "Session created");
        token
    }

    fn validate(&self, token: &str) -> bool {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(token)
            .is_some_and(|expires| *expires > Instant::now())
    }

    fn revoke(&self, token: &str) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.remove(token).is_some() {
            debug!(active = sessions.len(), "Session revoked");
        }
    }
}
