//! Error types for session authentication and token refresh.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Status-style classification of an [`AuthError`].
///
/// Downstream code matches on the kind rather than the variant when it only
/// needs to know how to answer the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller presented no usable identity.
    Unauthenticated,
    /// The caller presented an identity that is no longer accepted.
    PermissionDenied,
    /// The caller sent a malformed request.
    InvalidArgument,
    /// The subject has no account on this server.
    NotFound,
    /// A backing service could not be reached.
    Unavailable,
    /// Server-side failure.
    Internal,
}

/// Error taxonomy for the OAuth session authenticator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Routing
    // ═══════════════════════════════════════════════════════════

    /// The request path is not handled by this authenticator.
    #[error("unauthenticated: wrong path {path}")]
    WrongRoute {
        /// Path that was requested
        path: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Per-request re-authentication
    // ═══════════════════════════════════════════════════════════

    /// No usable login token was presented, or it was rejected.
    #[error("logged out: {reason}")]
    LoggedOut {
        /// Short reason, safe to log
        reason: String,
    },

    /// The session id cookie does not match any stored session.
    #[error("logged out: session not found")]
    SessionNotFound,

    /// Token signature or payload failed verification.
    #[error("token failed verification")]
    TokenTampered,

    /// Token signature is valid but the token is past its expiry.
    ///
    /// The authenticator recovers from this by refreshing.
    #[error("token expired")]
    TokenExpired,

    /// Token expired and renewal with the identity provider failed.
    #[error("logged out: failed to renew session")]
    TokenExpiredUnrefreshable,

    // ═══════════════════════════════════════════════════════════
    // Identity provider
    // ═══════════════════════════════════════════════════════════

    /// Code exchange or profile fetch with the identity provider failed.
    #[error("identity provider error: {0}")]
    ProviderExchangeFailed(String),

    /// The identity provider returned a profile without a login.
    #[error("identity provider returned an invalid profile: empty login")]
    ProviderProfileInvalid,

    /// OAuth state parameter is invalid (CSRF protection).
    #[error("invalid OAuth state parameter")]
    OAuthStateInvalid,

    // ═══════════════════════════════════════════════════════════
    // Account resolution
    // ═══════════════════════════════════════════════════════════

    /// No partial identity is attached to the request.
    #[error("unauthenticated: no user token available")]
    NoUserToken,

    /// The verified subject has no account.
    #[error("no account for subject {subject}")]
    UnknownSubject {
        /// Subject id that failed to resolve
        subject: String,
    },

    // ═══════════════════════════════════════════════════════════
    // System
    // ═══════════════════════════════════════════════════════════

    /// Session store could not be reached.
    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Failed to encode or decode a stored value.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Internal server error (should not be exposed to users).
    #[error("internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Build a [`AuthError::LoggedOut`] with the given reason.
    #[must_use]
    pub fn logged_out(reason: impl Into<String>) -> Self {
        Self::LoggedOut {
            reason: reason.into(),
        }
    }

    /// Status-style classification of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// # use forge_auth::{AuthError, ErrorKind};
    /// assert_eq!(AuthError::NoUserToken.kind(), ErrorKind::Unauthenticated);
    /// assert_eq!(AuthError::SessionNotFound.kind(), ErrorKind::PermissionDenied);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::WrongRoute { .. } | Self::NoUserToken => ErrorKind::Unauthenticated,
            Self::LoggedOut { .. }
            | Self::SessionNotFound
            | Self::TokenTampered
            | Self::TokenExpired
            | Self::TokenExpiredUnrefreshable => ErrorKind::PermissionDenied,
            Self::OAuthStateInvalid => ErrorKind::InvalidArgument,
            Self::UnknownSubject { .. } => ErrorKind::NotFound,
            Self::StoreUnavailable(_) => ErrorKind::Unavailable,
            Self::ProviderExchangeFailed(_)
            | Self::ProviderProfileInvalid
            | Self::Configuration(_)
            | Self::SerializationError(_)
            | Self::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// Returns `true` for failures the HTTP layer reports as "logged out".
    ///
    /// The end user never learns which of these happened.
    #[must_use]
    pub const fn is_logged_out(&self) -> bool {
        matches!(
            self,
            Self::LoggedOut { .. }
                | Self::SessionNotFound
                | Self::TokenTampered
                | Self::TokenExpired
                | Self::TokenExpiredUnrefreshable
        )
    }

    /// Returns `true` if this error indicates a security issue.
    #[must_use]
    pub const fn is_security_issue(&self) -> bool {
        matches!(self, Self::TokenTampered | Self::OAuthStateInvalid)
    }
}
