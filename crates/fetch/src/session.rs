//! Session store: the access token slot and the authenticated identity.
//!
//! A [`SessionContext`] is created once per client process and injected into
//! the [`FetchClient`](crate::FetchClient). Its lifecycle is
//! `Empty -> Authenticated -> Cleared`; a new login may re-enter
//! `Authenticated`. Every lifecycle change is broadcast on a `watch` channel
//! so that all views observe a session teardown.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

/// Identity payload returned by login or renewal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub serde_json::Value);

impl Identity {
    /// Look up a top-level string field of the identity.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(serde_json::Value::as_str)
    }
}

/// Lifecycle of the client session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No login has happened yet.
    Empty,
    /// A token is held for this identity.
    Authenticated { identity: Identity },
    /// The session was torn down (renewal failure or logout).
    Cleared,
}

impl SessionState {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    #[must_use]
    pub const fn is_cleared(&self) -> bool {
        matches!(self, Self::Cleared)
    }
}

/// Process-wide session, owned explicitly and shared through `Arc`.
#[derive(Debug)]
pub struct SessionContext {
    token: RwLock<Option<String>>,
    state: watch::Sender<SessionState>,
}

impl SessionContext {
    /// Empty session.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Empty);
        Self {
            token: RwLock::new(None),
            state,
        }
    }

    /// Empty session wrapped for sharing.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Session that already holds a token obtained elsewhere (e.g. a login
    /// performed by the surrounding application).
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.authenticate(token, Identity::default());
        session
    }

    /// Current bearer token, if any. Callers must not keep the copy beyond
    /// a single request.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Store a token and identity after login.
    pub fn authenticate(&self, token: impl Into<String>, identity: Identity) {
        *self.token.write() = Some(token.into());
        self.state.send_replace(SessionState::Authenticated { identity });
        info!("Session authenticated");
    }

    /// Store a renewed token; the refreshed identity replaces the old one.
    pub fn refresh(&self, token: impl Into<String>, identity: Identity) {
        *self.token.write() = Some(token.into());
        self.state.send_replace(SessionState::Authenticated { identity });
        debug!("Session token renewed");
    }

    /// Tear down the session. Idempotent: only the first call after a
    /// non-cleared state transitions and notifies subscribers.
    ///
    /// Returns whether this call performed the transition.
    pub fn clear(&self) -> bool {
        *self.token.write() = None;
        let cleared = self.state.send_if_modified(|state| {
            if state.is_cleared() {
                false
            } else {
                *state = SessionState::Cleared;
                true
            }
        });
        if cleared {
            info!("Session cleared");
        }
        cleared
    }

    /// Explicit logout.
    pub fn logout(&self) -> bool {
        self.clear()
    }

    /// Snapshot of the lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Subscribe to lifecycle changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)]

    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = SessionContext::new();
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.token().is_none());
    }

    #[test]
    fn test_authenticate_stores_token_and_identity() {
        let session = SessionContext::new();
        session.authenticate("t1", Identity(serde_json::json!({"name": "ana"})));

        assert_eq!(session.token().as_deref(), Some("t1"));
        match session.state() {
            SessionState::Authenticated { identity } => {
                assert_eq!(identity.field("name"), Some("ana"));
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn given_authenticated_session_when_cleared_twice_then_transitions_once() {
        let session = SessionContext::with_token("t1");
        let mut rx = session.subscribe();
        rx.mark_unchanged();

        assert!(session.clear());
        assert!(!session.clear());

        assert!(session.token().is_none());
        assert!(session.state().is_cleared());
        assert!(rx.has_changed().unwrap_or(false));
        rx.mark_unchanged();
        assert!(!session.logout());
        assert!(!rx.has_changed().unwrap_or(true));
    }

    #[test]
    fn test_login_after_clear() {
        let session = SessionContext::with_token("old");
        session.clear();
        session.authenticate("new", Identity::default());
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("new"));
    }
}
