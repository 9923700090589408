//! Axum middleware for session authentication and request tracking.
//!
//! This module provides:
//! - **Session authentication**: run the per-request session check and
//!   attach the result to the request
//! - **Correlation IDs**: tower-http's request-id layers under the
//!   `x-correlation-id` header, plus the span every request is traced in
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware::from_fn_with_state};
//! use forge_web::middleware::{correlation_id_layer, request_span, session_auth};
//! use tower_http::trace::TraceLayer;
//!
//! let app = Router::new()
//!     .route("/api/me", get(me))
//!     .layer(from_fn_with_state(state.clone(), session_auth::<P, S, C>))
//!     .layer(TraceLayer::new_for_http().make_span_with(request_span))
//!     .layer(correlation_id_layer())
//!     .with_state(state);
//! ```

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, SignedCookieJar};
use forge_auth::providers::{ClaimsResolver, IdentityProvider, SessionStore};
use std::collections::HashSet;
use tower::ServiceBuilder;
use tower::layer::util::{Identity, Stack};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

/// Header carrying the correlation ID, in both directions.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

// ═══════════════════════════════════════════════════════════════════════
// Session authentication
// ═══════════════════════════════════════════════════════════════════════

/// Authenticate every request from its login cookies.
///
/// Stores the resulting [`forge_auth::RequestAuth`] in the request
/// extensions, where [`crate::Authenticated`] and
/// [`crate::MaybeAuthenticated`] pick it up. Never rejects a request:
/// handlers decide whether authentication is required.
///
/// Cookie updates from the check (a renewed token, or a cleared cookie
/// group) are always sent. Where the handler sets a cookie of the same
/// name, the handler's value wins: a login started from a revoked session
/// still clears the stale group, while a callback's fresh group replaces it.
pub async fn session_auth<P, S, C>(
    State(state): State<AppState<P, S, C>>,
    jar: SignedCookieJar,
    mut request: Request,
    next: Next,
) -> Response
where
    P: IdentityProvider + 'static,
    S: SessionStore + 'static,
    C: ClaimsResolver + 'static,
{
    let (jar, auth) = state.authenticator.authenticated_http_context(jar).await;
    tracing::debug!(
        check = ?auth.check,
        authenticated = auth.is_authenticated(),
        "session checked"
    );
    request.extensions_mut().insert(auth);

    let mut response = next.run(request).await;
    let from_handler = take_set_cookies(&mut response);
    let mut response = (jar, response).into_response();
    let from_check = take_set_cookies(&mut response);

    let overridden: HashSet<String> = from_handler.iter().filter_map(cookie_name).collect();
    let headers = response.headers_mut();
    for value in from_check
        .into_iter()
        .filter(|value| cookie_name(value).is_none_or(|name| !overridden.contains(&name)))
    {
        headers.append(SET_COOKIE, value);
    }
    for value in from_handler {
        headers.append(SET_COOKIE, value);
    }
    response
}

fn take_set_cookies(response: &mut Response) -> Vec<HeaderValue> {
    let headers = response.headers_mut();
    let values = headers.get_all(SET_COOKIE).iter().cloned().collect();
    headers.remove(SET_COOKIE);
    values
}

fn cookie_name(value: &HeaderValue) -> Option<String> {
    let value = value.to_str().ok()?;
    Cookie::parse(value).ok().map(|cookie| cookie.name().to_string())
}

// ═══════════════════════════════════════════════════════════════════════
// Correlation IDs
// ═══════════════════════════════════════════════════════════════════════

/// Issues a UUID v4 for requests that arrive without a correlation ID.
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeCorrelationId;

impl MakeRequestId for MakeCorrelationId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Correlation ID layers: keep the caller's ID or issue one, and echo it
/// on the response.
#[must_use]
pub fn correlation_id_layer()
-> ServiceBuilder<Stack<PropagateRequestIdLayer, Stack<SetRequestIdLayer<MakeCorrelationId>, Identity>>>
{
    let header = HeaderName::from_static(CORRELATION_ID_HEADER);
    ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(header.clone(), MakeCorrelationId))
        .layer(PropagateRequestIdLayer::new(header))
}

/// Tracing span for one request.
///
/// Records the path only: callback query strings carry OAuth codes.
pub fn request_span(request: &Request) -> tracing::Span {
    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    tracing::info_span!(
        "http_request",
        correlation_id,
        method = %request.method(),
        path = %request.uri().path(),
    )
}
