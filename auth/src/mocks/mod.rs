//! Mock provider implementations for testing.
//!
//! In-memory implementations of the provider traits with failure switches
//! and call counters, for unit and integration tests.

pub mod claims;
pub mod identity;
pub mod session;

pub use claims::MockClaimsResolver;
pub use identity::MockIdentityProvider;
pub use session::MockSessionStore;

use crate::error::AuthError;

fn lock_failed<T>(_: T) -> AuthError {
    AuthError::InternalError("Mutex lock failed".to_string())
}
