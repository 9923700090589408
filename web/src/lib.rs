//! Axum integration for Forge OAuth session authentication.
//!
//! This crate is the imperative shell around [`forge_auth::Authenticator`]:
//! it owns the HTTP routes, moves cookies between requests and the
//! authenticator, and maps authentication errors to HTTP responses.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         HTTP shell (this crate)         │  ← routes, cookies, JSON
//! │  - session_auth middleware              │  ← per-request session check
//! │  - login / callback / logout handlers   │  ← OAuth flow endpoints
//! ├─────────────────────────────────────────┤
//! │         forge-auth                      │
//! │  - Authenticator state machine          │  ← token renewal, logout
//! │  - Session store / identity provider    │  ← Redis, GitHub
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **Correlation ID** is attached to the request and tracing span
//! 2. **`session_auth`** runs the session check and stores a
//!    [`forge_auth::RequestAuth`] in the request extensions
//! 3. **Handler** reads it through [`Authenticated`] or [`MaybeAuthenticated`]
//! 4. **Cookie updates** from a renewal or cleared session are merged into
//!    the response
//!
//! # Example
//!
//! ```ignore
//! use forge_web::{AppState, router::app_router};
//!
//! let state = AppState::new(authenticator, cookie_key);
//! let app = app_router(state);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use config::ServerConfig;
pub use error::AppError;
pub use extractors::{Authenticated, CorrelationId, MaybeAuthenticated};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer, request_span, session_auth};
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
