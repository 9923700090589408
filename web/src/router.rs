//! Router composition.
//!
//! Composes the login flow, account and health handlers into a single Axum
//! router with session authentication and request tracing applied.

use crate::handlers::{account, auth, health};
use crate::middleware::{correlation_id_layer, request_span, session_auth};
use crate::state::AppState;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use forge_auth::providers::{ClaimsResolver, IdentityProvider, SessionStore};
use tower_http::trace::TraceLayer;

/// Logout path.
pub const LOGOUT_PATH: &str = "/logout/";

/// Create the application router.
///
/// # Routes
///
/// ## Login flow
/// - `GET {login_path}` - Redirect to the identity provider
/// - `GET {callback_path}` - Handle the OAuth callback
/// - `GET|POST /logout/` - Clear cookies and delete the session
///
/// ## Account
/// - `GET /api/me` - Signed-in user (401 otherwise)
/// - `POST /api/account` - Account record for the caller's identity
///
/// ## Operations
/// - `GET /health` - Liveness
///
/// Login and callback paths come from the authenticator's configuration.
pub fn app_router<P, S, C>(state: AppState<P, S, C>) -> Router
where
    P: IdentityProvider + 'static,
    S: SessionStore + 'static,
    C: ClaimsResolver + 'static,
{
    let login_path = state.authenticator.config().login_path.clone();
    let callback_path = state.authenticator.config().callback_path.clone();

    Router::new()
        // Login flow
        .route(&login_path, get(auth::login::<P, S, C>))
        .route(&callback_path, get(auth::callback::<P, S, C>))
        .route(
            LOGOUT_PATH,
            get(auth::logout::<P, S, C>).post(auth::logout::<P, S, C>),
        )
        // Account
        .route("/api/me", get(account::me))
        .route("/api/account", post(account::provision::<P, S, C>))
        // Operations
        .route("/health", get(health::health_check))
        .layer(from_fn_with_state(state.clone(), session_auth::<P, S, C>))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(correlation_id_layer())
        .with_state(state)
}
