//! # Forge Authentication
//!
//! OAuth session authentication and token refresh for the Forge build cache
//! console.
//!
//! ## Features
//!
//! - **GitHub OAuth login** with CSRF-protected callback
//! - **Signed login tokens** carrying a profile snapshot and expiry
//! - **Revocable sessions** in Redis or PostgreSQL
//! - **Lazy renewal**: an expired token is refreshed inline on the next request
//! - **Testable**: every external system sits behind a trait with a mock
//!
//! ## Flow
//!
//! ```text
//! GET /login/github/  → consent screen
//! GET /auth/github/   → exchange code → fetch profile → session + cookies
//! any request         → verify cookies → (renew) → RequestAuth
//! GET /logout/        → clear cookies → delete session
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use forge_auth::*;
//!
//! let env = AuthEnvironment::new(github, sessions, SubjectClaimsResolver::default());
//! let authenticator = Authenticator::new(AuthConfig::from_env()?, env)?;
//!
//! // Per request
//! let (jar, auth) = authenticator.authenticated_http_context(jar).await;
//! if let Some(claims) = &auth.claims {
//!     println!("hello {}", claims.subject);
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod authenticator;
pub mod config;
pub mod constants;
pub mod cookies;
pub mod environment;
pub mod error;
pub mod providers;
pub mod state;
pub mod stores;
pub mod token;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use authenticator::{Authenticator, RedirectTarget};
pub use config::AuthConfig;
pub use environment::AuthEnvironment;
pub use error::{AuthError, ErrorKind, Result};
pub use state::{
    AuthenticatedUser, Claims, RequestAuth, SessionCheck, SessionId, SessionRecord, SubjectId,
    UserProfile, UserRecord,
};
pub use token::{SignedToken, TokenCodec};
