//! Session context: the one place the bearer credential lives.
//!
//! Every request reads the token fresh through [`Session::bearer`], so a clear
//! (logout or a `401`) is observed by the very next call. When a token file is
//! configured the credential survives restarts of the binary, the way the
//! browser panel kept it in local storage.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    SignedOut,
    /// A credential is held; the backend has not rejected it yet.
    Active,
    /// The backend answered `401`; the credential was dropped.
    Expired,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    token: RwLock<Option<String>>,
    token_file: Option<PathBuf>,
    state: watch::Sender<SessionState>,
}

impl Session {
    /// In-memory session, nothing persisted.
    pub fn new() -> Self {
        Self::build(None, None)
    }

    /// Session backed by `path`; a token already stored there is picked up.
    pub fn with_token_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stored = match fs::read_to_string(&path) {
            Ok(raw) => Some(raw.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Could not read token file {}: {e}", path.display());
                None
            }
        };
        Self::build(stored, Some(path))
    }

    fn build(token: Option<String>, token_file: Option<PathBuf>) -> Self {
        let initial = if token.is_some() { SessionState::Active } else { SessionState::SignedOut };
        let (state, _) = watch::channel(initial);
        Self {
            inner: Arc::new(SessionInner { token: RwLock::new(token), token_file, state }),
        }
    }

    pub fn bearer(&self) -> Option<String> {
        self.inner.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_active(&self) -> bool {
        self.bearer().is_some()
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Login transition.
    pub fn init(&self, token: impl Into<String>) {
        let token = token.into();
        if let Some(path) = &self.inner.token_file {
            if let Err(e) = fs::write(path, &token) {
                warn!("Could not persist token to {}: {e}", path.display());
            }
        }
        *self.inner.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        self.inner.state.send_replace(SessionState::Active);
        info!("Session started");
    }

    /// Logout transition.
    pub fn teardown(&self) {
        self.clear();
        self.inner.state.send_replace(SessionState::SignedOut);
        info!("Session closed");
    }

    /// Expiry transition, triggered by any `401`.
    pub fn expire(&self) {
        self.clear();
        self.inner.state.send_replace(SessionState::Expired);
        warn!("Session expired; a new login is required");
    }

    pub fn token_file(&self) -> Option<&Path> {
        self.inner.token_file.as_deref()
    }

    fn clear(&self) {
        self.inner.token.write().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(path) = &self.inner.token_file {
            match fs::remove_file(path) {
                Ok(()) => debug!("Removed token file {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove token file {}: {e}", path.display()),
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_and_teardown_transition_state() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::SignedOut);
        assert!(session.bearer().is_none());

        session.init("abc");
        assert_eq!(session.bearer().as_deref(), Some("abc"));
        assert_eq!(session.state(), SessionState::Active);

        session.teardown();
        assert!(session.bearer().is_none());
        assert_eq!(session.state(), SessionState::SignedOut);
    }

    #[test]
    fn expiry_notifies_subscribers() {
        let session = Session::new();
        session.init("abc");
        let mut rx = session.subscribe();
        session.clone().expire();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionState::Expired);
        assert!(!session.is_active());
    }

    #[test]
    fn token_file_round_trips_and_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");

        let session = Session::with_token_file(&path);
        assert!(!session.is_active());
        session.init("tok-1");
        assert_eq!(fs::read_to_string(&path).unwrap(), "tok-1");

        let restored = Session::with_token_file(&path);
        assert_eq!(restored.bearer().as_deref(), Some("tok-1"));
        assert_eq!(restored.state(), SessionState::Active);

        restored.expire();
        assert!(!path.exists());
        assert!(Session::with_token_file(&path).bearer().is_none());
    }
}
