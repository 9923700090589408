//! Application state for Axum handlers.

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use forge_auth::Authenticator;
use forge_auth::providers::{ClaimsResolver, IdentityProvider, SessionStore};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Holds the authenticator and the key that signs the login cookie group.
/// The key is exposed through [`FromRef`] so `SignedCookieJar` can be
/// extracted directly in handlers.
///
/// # Examples
///
/// ```ignore
/// let state = AppState::new(authenticator, Key::from(&cookie_secret));
/// let app = Router::new()
///     .route("/api/me", get(me::<P, S, C>))
///     .with_state(state);
/// ```
pub struct AppState<P, S, C>
where
    P: IdentityProvider,
    S: SessionStore,
    C: ClaimsResolver,
{
    /// Session authenticator.
    pub authenticator: Arc<Authenticator<P, S, C>>,

    /// Cookie signing key.
    pub cookie_key: Key,
}

impl<P, S, C> AppState<P, S, C>
where
    P: IdentityProvider,
    S: SessionStore,
    C: ClaimsResolver,
{
    /// Create a new application state.
    #[must_use]
    pub fn new(authenticator: Authenticator<P, S, C>, cookie_key: Key) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
            cookie_key,
        }
    }
}

// Manual impl: derive would require `P: Clone` and friends.
impl<P, S, C> Clone for AppState<P, S, C>
where
    P: IdentityProvider,
    S: SessionStore,
    C: ClaimsResolver,
{
    fn clone(&self) -> Self {
        Self {
            authenticator: Arc::clone(&self.authenticator),
            cookie_key: self.cookie_key.clone(),
        }
    }
}

impl<P, S, C> FromRef<AppState<P, S, C>> for Key
where
    P: IdentityProvider,
    S: SessionStore,
    C: ClaimsResolver,
{
    fn from_ref(state: &AppState<P, S, C>) -> Self {
        state.cookie_key.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_auth::mocks::{MockClaimsResolver, MockIdentityProvider, MockSessionStore};
    use forge_auth::{AuthConfig, AuthEnvironment, UserProfile};

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_clone_shares_authenticator() {
        let env = AuthEnvironment::new(
            MockIdentityProvider::new(UserProfile::new("alice")),
            MockSessionStore::new(),
            MockClaimsResolver::accept_all(),
        );
        let auth = Authenticator::new(AuthConfig::new([1u8; 32].to_vec()), env).unwrap();
        let state = AppState::new(auth, Key::generate());
        let cloned = state.clone();

        assert!(Arc::ptr_eq(&state.authenticator, &cloned.authenticator));
        assert_eq!(
            Key::from_ref(&cloned).master(),
            state.cookie_key.master()
        );
    }
}
