//! Authentication providers.
//!
//! Traits for the external systems the authenticator talks to. The
//! authenticator depends on these traits only; the server wires in the
//! GitHub provider and a Redis or Postgres session store, tests wire in the
//! mocks.
//!
//! ```text
//!                ┌──────────────────┐
//!   browser ────▶│  Authenticator   │
//!                └──┬──────┬─────┬──┘
//!                   │      │     │
//!                   ▼      ▼     ▼
//!   IdentityProvider  SessionStore  ClaimsResolver
//!   (GitHub OAuth)    (Redis / PG)  (subject → claims)
//! ```

pub mod claims;
pub mod github;
pub mod identity;
pub mod session;

pub use claims::{ClaimsResolver, SubjectClaimsResolver};
pub use github::{GitHubConfig, GitHubOAuthProvider};
pub use identity::{CallbackRequest, IdentityProvider};
pub use session::SessionStore;
