//! Authentication environment.
//!
//! Holds the external collaborators the authenticator is built from.

use crate::providers::{ClaimsResolver, IdentityProvider, SessionStore};

/// Authentication environment.
///
/// # Type Parameters
///
/// - `P`: identity provider
/// - `S`: session store
/// - `C`: claims resolver
#[derive(Debug, Clone)]
pub struct AuthEnvironment<P, S, C>
where
    P: IdentityProvider,
    S: SessionStore,
    C: ClaimsResolver,
{
    /// Identity provider (GitHub OAuth).
    pub provider: P,

    /// Session store (`Redis` or `PostgreSQL`).
    pub sessions: S,

    /// Claims resolver.
    pub claims: C,
}

impl<P, S, C> AuthEnvironment<P, S, C>
where
    P: IdentityProvider,
    S: SessionStore,
    C: ClaimsResolver,
{
    /// Create a new authentication environment.
    #[must_use]
    pub const fn new(provider: P, sessions: S, claims: C) -> Self {
        Self {
            provider,
            sessions,
            claims,
        }
    }
}
