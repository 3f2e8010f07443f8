//! Session store.
//!
//! Holds the single active session (token + display identity), mirrors it to
//! durable storage and publishes authentication state changes to subscribers.
//! Every read goes to the in-memory value, so the HTTP adapter sees a set or a
//! clear on its very next request.

mod storage;

use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::lock::{rw_read, rw_write};

pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};

const SOURCE: &str = "session";

/// An authenticated identity and its bearer credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Display identity: the user's name or email.
    pub user: String,
    pub token: String,
}

impl Session {
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// What subscribers observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    SignedIn { user: String },
    /// The server rejected the credential; views should send the user to sign-in.
    Expired,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }
}

pub struct SessionStore {
    current: RwLock<Option<Session>>,
    /// Survives expiry so a re-sign-in can tell whether the identity changed.
    last_user: RwLock<Option<String>>,
    storage: Box<dyn SessionStorage>,
    state: watch::Sender<AuthState>,
}

impl SessionStore {
    /// Empty store; whatever `storage` holds is ignored until overwritten.
    pub fn new(storage: impl SessionStorage + 'static) -> Self {
        let (state, _) = watch::channel(AuthState::SignedOut);
        Self {
            current: RwLock::new(None),
            last_user: RwLock::new(None),
            storage: Box::new(storage),
            state,
        }
    }

    /// Store seeded from the persisted record, if any. An unreadable record is
    /// logged and treated as signed out.
    pub fn restore(storage: impl SessionStorage + 'static) -> Self {
        let store = Self::new(storage);
        match store.storage.load() {
            Ok(Some(session)) => {
                info!(user = %session.user, "Restored persisted session");
                store.state.send_replace(AuthState::SignedIn {
                    user: session.user.clone(),
                });
                *rw_write(&store.last_user, SOURCE, "restore") = Some(session.user.clone());
                *rw_write(&store.current, SOURCE, "restore") = Some(session);
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "Ignoring unreadable session record"),
        }
        store
    }

    /// Replace the current session wholesale and persist it.
    pub fn set_session(&self, user: impl Into<String>, token: impl Into<String>) {
        let session = Session::new(user, token);
        if let Err(err) = self.storage.save(&session) {
            warn!(error = %err, "Failed to persist session; keeping it in memory only");
        }
        let user = session.user.clone();
        *rw_write(&self.last_user, SOURCE, "set_session") = Some(user.clone());
        *rw_write(&self.current, SOURCE, "set_session") = Some(session);
        self.state.send_replace(AuthState::SignedIn { user: user.clone() });
        info!(user = %user, "Session established");
    }

    /// Remove the session from memory and storage. Safe to call repeatedly.
    pub fn clear_session(&self) {
        rw_write(&self.last_user, SOURCE, "clear_session").take();
        self.clear_with(AuthState::SignedOut);
    }

    /// Clear because the server rejected the credential.
    pub(crate) fn expire(&self) {
        self.clear_with(AuthState::Expired);
    }

    pub fn token(&self) -> Option<String> {
        rw_read(&self.current, SOURCE, "token")
            .as_ref()
            .map(|session| session.token.clone())
    }

    pub fn current(&self) -> Option<Session> {
        rw_read(&self.current, SOURCE, "current").clone()
    }

    pub fn is_authenticated(&self) -> bool {
        rw_read(&self.current, SOURCE, "is_authenticated").is_some()
    }

    /// Identity of the active session, or of the last one if it expired.
    /// `None` after an explicit sign-out.
    pub fn last_user(&self) -> Option<String> {
        rw_read(&self.last_user, SOURCE, "last_user").clone()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver that wakes on every authentication state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    fn clear_with(&self, next: AuthState) {
        if let Err(err) = self.storage.remove() {
            warn!(error = %err, "Failed to remove persisted session");
        }
        let previous = rw_write(&self.current, SOURCE, "clear_session").take();
        let changed = self.state.send_if_modified(|state| {
            let signed_in = state.is_authenticated();
            // A sign-out after expiry keeps the more specific state.
            let replace = signed_in || (*state == AuthState::SignedOut && next == AuthState::Expired);
            if replace {
                *state = next.clone();
            }
            replace
        });
        if previous.is_some() || changed {
            info!(reason = ?next, "Session cleared");
        }
    }
}
