//! Account handlers for the signed-in user.

use crate::error::AppError;
use crate::extractors::{Authenticated, MaybeAuthenticated};
use crate::state::AppState;
use axum::{Json, extract::State};
use forge_auth::UserRecord;
use forge_auth::providers::{ClaimsResolver, IdentityProvider, SessionStore};
use serde::Serialize;

/// Response describing the signed-in user.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// Subject id (`{issuer}/{login}`).
    pub subject: String,

    /// Issuer that vouched for the subject.
    pub issuer: String,

    /// Provider login.
    pub login: Option<String>,

    /// Display name.
    pub name: Option<String>,

    /// Email address.
    pub email: Option<String>,

    /// Avatar image URL.
    pub avatar_url: Option<String>,
}

/// Describe the signed-in user.
///
/// # Endpoint
///
/// ```text
/// GET /api/me
/// ```
///
/// # Response
///
/// ```json
/// {
///   "subject": "https://github.com/octocat",
///   "issuer": "https://github.com",
///   "login": "octocat",
///   "name": "The Octocat",
///   "email": null,
///   "avatar_url": null
/// }
/// ```
#[allow(clippy::unused_async)]
pub async fn me(auth: Authenticated) -> Json<MeResponse> {
    let profile = auth.user.map(|user| user.profile);
    Json(MeResponse {
        subject: auth.claims.subject.0,
        issuer: auth.claims.issuer,
        login: profile.as_ref().map(|p| p.login.clone()),
        name: profile.as_ref().and_then(|p| p.name.clone()),
        email: profile.as_ref().and_then(|p| p.email.clone()),
        avatar_url: profile.and_then(|p| p.avatar_url),
    })
}

/// Build the account record for the caller's provider identity.
///
/// Works without verified claims: a user who signed in but has no account
/// yet still carries an identity to provision from.
///
/// # Endpoint
///
/// ```text
/// POST /api/account
/// ```
///
/// # Errors
///
/// 401 `UNAUTHENTICATED` if the request carries no identity at all.
#[allow(clippy::unused_async)]
pub async fn provision<P, S, C>(
    State(state): State<AppState<P, S, C>>,
    MaybeAuthenticated(auth): MaybeAuthenticated,
) -> Result<Json<UserRecord>, AppError>
where
    P: IdentityProvider + 'static,
    S: SessionStore + 'static,
    C: ClaimsResolver + 'static,
{
    let mut record = UserRecord::default();
    state.authenticator.fill_user(&auth, &mut record)?;
    tracing::info!(sub_id = %record.sub_id, "account record prepared");
    Ok(Json(record))
}
