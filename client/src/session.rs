//! Session credential store
//!
//! Holds the bearer token the external authentication flow produced. The
//! store is constructed explicitly and passed into the HTTP record store
//! (constructor injection — no process-wide singleton), so tests can run
//! against fake sessions. Persisting credentials is out of scope; this is
//! in-memory only.

use secrecy::{ExposeSecret, SecretString};
use std::sync::RwLock;

/// In-memory bearer credential store
///
/// Cheap to share behind an `Arc`; interior mutability lets the
/// reauthentication flow swap the token without rebuilding the client.
#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<SecretString>>,
}

impl Session {
    /// Create an empty (signed-out) session
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session already holding a bearer token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(SecretString::new(token.into()))),
        }
    }

    /// Store a fresh bearer token after (re)authentication
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().expect("session lock poisoned") = Some(SecretString::new(token.into()));
    }

    /// Drop the credential, e.g. after the server reports it expired
    pub fn clear(&self) {
        *self.token.write().expect("session lock poisoned") = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().expect("session lock poisoned").is_some()
    }

    /// Expose the token for an `Authorization: Bearer` header
    pub fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .expect("session lock poisoned")
            .as_ref()
            .map(|t| t.expose_secret().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.bearer(), None);

        session.set_token("token-123");
        assert!(session.is_authenticated());
        assert_eq!(session.bearer().as_deref(), Some("token-123"));

        session.clear();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_with_token() {
        let session = Session::with_token("abc");
        assert_eq!(session.bearer().as_deref(), Some("abc"));
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let session = Session::with_token("super-secret");
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("super-secret"));
    }
}
