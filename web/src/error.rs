//! Error types for web handlers.
//!
//! This module bridges [`AuthError`] and HTTP responses, implementing
//! Axum's `IntoResponse` trait.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use forge_auth::{AuthError, ErrorKind};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Carries the HTTP status, a client-facing message and a stable error
/// code. Internal detail goes in `source` and is only logged.
///
/// # Examples
///
/// ```ignore
/// async fn handler(auth: Authenticated) -> Result<Json<Profile>, AppError> {
///     let user = auth.user.ok_or_else(|| AppError::unauthorized("no identity"))?;
///     Ok(Json(user.profile))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// The uniform 401 for every request whose session check failed.
    #[must_use]
    pub fn logged_out() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "logged out".to_string(),
            "LOGGED_OUT".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            message.into(),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 502 Bad Gateway error.
    #[must_use]
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            message.into(),
            "BAD_GATEWAY".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

/// Map authentication errors to responses.
///
/// Every logged-out condition collapses to one 401 so clients cannot tell
/// a tampered token from a missing session. Errors recorded by the
/// per-request session check go through [`AppError::logged_out`] instead,
/// whatever their kind; this mapping is for the login flow and handlers.
impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        if err.is_logged_out() {
            return Self::logged_out();
        }

        match err {
            AuthError::WrongRoute { ref path } => Self::not_found(format!("no route for {path}")),
            AuthError::OAuthStateInvalid => Self::bad_request(err.to_string()),
            AuthError::ProviderExchangeFailed(_) | AuthError::ProviderProfileInvalid => {
                Self::bad_gateway("identity provider request failed")
                    .with_source(anyhow::Error::new(err))
            }
            _ => match err.kind() {
                ErrorKind::Unauthenticated => Self::new(
                    StatusCode::UNAUTHORIZED,
                    err.to_string(),
                    "UNAUTHENTICATED".to_string(),
                ),
                ErrorKind::PermissionDenied => Self::new(
                    StatusCode::FORBIDDEN,
                    err.to_string(),
                    "FORBIDDEN".to_string(),
                ),
                ErrorKind::NotFound => Self::not_found(err.to_string()),
                ErrorKind::InvalidArgument => Self::bad_request(err.to_string()),
                ErrorKind::Unavailable => Self::unavailable("session store unavailable")
                    .with_source(anyhow::Error::new(err)),
                ErrorKind::Internal => {
                    Self::internal("An internal error occurred").with_source(anyhow::Error::new(err))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_logged_out_errors_are_indistinguishable() {
        for err in [
            AuthError::logged_out("no jwt set"),
            AuthError::SessionNotFound,
            AuthError::TokenTampered,
            AuthError::TokenExpired,
            AuthError::TokenExpiredUnrefreshable,
        ] {
            let app: AppError = err.into();
            assert_eq!(app.status, StatusCode::UNAUTHORIZED);
            assert_eq!(app.code, "LOGGED_OUT");
            assert_eq!(app.message, "logged out");
        }
    }

    #[test]
    fn test_logged_out_hides_cause() {
        let app = AppError::logged_out();
        assert_eq!(app.status, StatusCode::UNAUTHORIZED);
        assert_eq!(app.to_string(), "[LOGGED_OUT] logged out");
        assert!(app.source.is_none());
    }

    #[test]
    fn test_auth_error_status_mapping() {
        let cases = [
            (
                AuthError::WrongRoute {
                    path: "/x".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (AuthError::OAuthStateInvalid, StatusCode::BAD_REQUEST),
            (
                AuthError::ProviderExchangeFailed("bad_verification_code".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (AuthError::ProviderProfileInvalid, StatusCode::BAD_GATEWAY),
            (AuthError::NoUserToken, StatusCode::UNAUTHORIZED),
            (
                AuthError::UnknownSubject {
                    subject: "https://github.com/alice".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                AuthError::StoreUnavailable("down".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AuthError::InternalError("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn test_provider_detail_is_not_exposed() {
        let app = AppError::from(AuthError::ProviderExchangeFailed(
            "client secret rejected".to_string(),
        ));
        assert!(!app.message.contains("client secret"));
        assert!(app.source.is_some());
    }
}
