//! Custom Axum extractors.
//!
//! This module contains extractors over the request's authentication state:
//! - `Authenticated`: require verified claims, reject with 401 otherwise
//! - `MaybeAuthenticated`: the raw session check outcome, never rejects
//! - `CorrelationId`: the request correlation ID
//!
//! The first two read the [`RequestAuth`] stored by
//! [`crate::middleware::session_auth`].
//!
//! # Examples
//!
//! ```ignore
//! async fn me(auth: Authenticated, correlation_id: CorrelationId) -> Json<Me> {
//!     tracing::info!(correlation_id = %correlation_id.0, subject = %auth.claims.subject, "profile");
//!     Json(Me::from(auth))
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use crate::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use forge_auth::providers::{ClaimsResolver, IdentityProvider, SessionStore};
use forge_auth::{AuthenticatedUser, Claims, RequestAuth};
use tower_http::request_id::RequestId;
use uuid::Uuid;

/// Verified caller.
///
/// Rejects with [`AppError::logged_out`] if the request carries no claims
/// issued by this server's authenticator. The cause (store outage, unknown
/// account, tampered token) is logged, never returned.
#[derive(Debug, Clone)]
pub struct Authenticated {
    /// Claims resolved for the session's subject.
    pub claims: Claims,

    /// Identity behind the claims.
    pub user: Option<AuthenticatedUser>,
}

#[async_trait]
impl<P, S, C> FromRequestParts<AppState<P, S, C>> for Authenticated
where
    P: IdentityProvider + 'static,
    S: SessionStore + 'static,
    C: ClaimsResolver + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<P, S, C>,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<RequestAuth>()
            .ok_or_else(|| AppError::internal("session middleware not installed"))?;
        let claims = state
            .authenticator
            .authenticated_user(auth)
            .map_err(|error| {
                if error.is_logged_out() {
                    tracing::debug!(check = ?auth.check, %error, "rejecting logged-out request");
                } else {
                    tracing::warn!(check = ?auth.check, %error, "session check failed, treating as logged out");
                }
                AppError::logged_out()
            })?;

        Ok(Self {
            claims,
            user: auth.user.clone(),
        })
    }
}

/// Outcome of the session check, whatever it was.
///
/// Used where a partial identity is enough, such as provisioning an account
/// for a user whose login has no account yet.
#[derive(Debug, Clone, Default)]
pub struct MaybeAuthenticated(pub RequestAuth);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthenticated
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<RequestAuth>()
                .cloned()
                .unwrap_or_default(),
        ))
    }
}

/// Correlation ID for request tracing.
///
/// Set by [`crate::correlation_id_layer`]; read from the header, or issued
/// here, when the layer is not installed.
#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_layer = parts
            .extensions
            .get::<RequestId>()
            .map(RequestId::header_value)
            .or_else(|| parts.headers.get(CORRELATION_ID_HEADER))
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(Self(from_layer.unwrap_or_else(|| Uuid::new_v4().to_string())))
    }
}
