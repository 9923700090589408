//! OAuth login flow handlers.
//!
//! Thin wrappers over [`forge_auth::Authenticator`]: each handler passes the
//! request URI and cookie jar in, and turns the result into a redirect
//! carrying the updated cookies.

use crate::error::AppError;
use crate::extractors::CorrelationId;
use crate::state::AppState;
use axum::{
    extract::{OriginalUri, State},
    response::Redirect,
};
use axum_extra::extract::cookie::SignedCookieJar;
use forge_auth::providers::{ClaimsResolver, IdentityProvider, SessionStore};

/// Start the OAuth flow.
///
/// # Endpoint
///
/// ```text
/// GET /login/github/?redirect_url=/path
/// ```
///
/// # Response
///
/// HTTP 307 redirect to the provider's consent screen. Sets the
/// `OAuth-State` cookie, and `Redirect-URL` when a local `redirect_url` was
/// given.
pub async fn login<P, S, C>(
    State(state): State<AppState<P, S, C>>,
    OriginalUri(uri): OriginalUri,
    correlation_id: CorrelationId,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Redirect), AppError>
where
    P: IdentityProvider + 'static,
    S: SessionStore + 'static,
    C: ClaimsResolver + 'static,
{
    tracing::debug!(correlation_id = %correlation_id.0, "starting login");
    let (jar, target) = state.authenticator.login(&uri, jar).await?;
    Ok((jar, Redirect::temporary(&target.location)))
}

/// Complete the OAuth flow.
///
/// # Endpoint
///
/// ```text
/// GET /auth/github/?code=...&state=...
/// ```
///
/// # Response
///
/// HTTP 307 redirect to the stored `Redirect-URL` target (or `/`) with the
/// login cookie group set.
///
/// # Errors
///
/// - 400 if the `state` parameter does not match the `OAuth-State` cookie
/// - 502 if the provider rejects the code or returns no usable profile
/// - 503 if the session cannot be stored
pub async fn callback<P, S, C>(
    State(state): State<AppState<P, S, C>>,
    OriginalUri(uri): OriginalUri,
    correlation_id: CorrelationId,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Redirect), AppError>
where
    P: IdentityProvider + 'static,
    S: SessionStore + 'static,
    C: ClaimsResolver + 'static,
{
    match state.authenticator.auth(&uri, jar).await {
        Ok((jar, target)) => Ok((jar, Redirect::temporary(&target.location))),
        Err(error) => {
            tracing::warn!(correlation_id = %correlation_id.0, %error, "OAuth callback failed");
            Err(error.into())
        }
    }
}

/// Log out.
///
/// # Endpoint
///
/// ```text
/// GET  /logout/
/// POST /logout/
/// ```
///
/// # Response
///
/// HTTP 303 redirect to `/` with the login cookie group cleared. Succeeds
/// even if the session could not be deleted.
pub async fn logout<P, S, C>(
    State(state): State<AppState<P, S, C>>,
    jar: SignedCookieJar,
) -> (SignedCookieJar, Redirect)
where
    P: IdentityProvider + 'static,
    S: SessionStore + 'static,
    C: ClaimsResolver + 'static,
{
    let jar = state.authenticator.logout(jar).await;
    let home = state.authenticator.config().default_redirect.clone();
    (jar, Redirect::to(&home))
}
