use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::AuthSettings;
use super::traits::{CredentialVerifier, SessionStore};

/// Shared state for auth route handlers.
pub(super) struct AuthState<V, S> {
    pub(super) verifier: Arc<V>,
    pub(super) session_store: Arc<S>,
    pub(super) settings: AuthSettings,
}

// Manual Clone: avoid derive adding `V: Clone, S: Clone` bounds.
impl<V, S> Clone for AuthState<V, S> {
    fn clone(&self) -> Self {
        Self {
            verifier: self.verifier.clone(),
            session_store: self.session_store.clone(),
            settings: self.settings.clone(),
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl<V: CredentialVerifier, S: SessionStore> FromRef<AuthState<V, S>> for Key {
    fn from_ref(state: &AuthState<V, S>) -> Self {
        state.settings.cookie_key.clone()
    }
}
