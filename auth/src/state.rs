//! Authentication state types.
//!
//! Identity snapshots, stored session records and the per-request
//! authentication result threaded through the HTTP pipeline.

use crate::error::AuthError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for a login session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    /// Generate a new random `SessionId`.
    ///
    /// Collisions are not checked against the store; a v4 UUID carries
    /// 122 random bits.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Parse a session id from its cookie form.
    ///
    /// Returns `None` for anything that is not a UUID.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        uuid::Uuid::parse_str(value.trim()).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable, provider-namespaced identity string (`https://github.com/<login>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub String);

impl SubjectId {
    /// Derive the subject id for `login` at `issuer`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use forge_auth::SubjectId;
    /// let subject = SubjectId::for_login("https://github.com", "alice");
    /// assert_eq!(subject.as_str(), "https://github.com/alice");
    /// ```
    #[must_use]
    pub fn for_login(issuer: &str, login: &str) -> Self {
        Self(format!("{}/{login}", issuer.trim_end_matches('/')))
    }

    /// Borrow the subject as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Identity
// ═══════════════════════════════════════════════════════════════════════

/// User profile snapshot from the identity provider.
///
/// Field names match GitHub's `GET /user` response; only these fields are read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    /// Login handle. Must be non-empty.
    #[serde(default)]
    pub login: String,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Public email.
    #[serde(default)]
    pub email: Option<String>,

    /// Avatar image URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Profile with only a login handle.
    #[must_use]
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            ..Self::default()
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the avatar URL.
    #[must_use]
    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

/// Server-side record of a login session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Key of the record.
    pub session_id: SessionId,

    /// Subject the session belongs to.
    pub subject_id: SubjectId,

    /// Provider access token.
    pub access_token: String,

    /// Provider refresh token. Equal to the access token when the provider
    /// issues no separate refresh token.
    pub refresh_token: String,

    /// When the current login token expires.
    pub expires_at: DateTime<Utc>,

    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Expiry in microseconds since the Unix epoch.
    #[must_use]
    pub fn expiry_usec(&self) -> i64 {
        self.expires_at.timestamp_micros()
    }
}

impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("session_id", &self.session_id)
            .field("subject_id", &self.subject_id)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Verified identity handed to authorization code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject id.
    pub subject: SubjectId,

    /// Issuer that vouched for the subject.
    pub issuer: String,
}

/// Identity recovered from a login token, possibly without verified claims.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Subject id derived from the profile login.
    pub subject: SubjectId,

    /// Profile embedded in the token.
    pub profile: UserProfile,

    /// Provider access token from the session record, when one was read.
    pub access_token: Option<String>,
}

impl fmt::Debug for AuthenticatedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedUser")
            .field("subject", &self.subject)
            .field("profile", &self.profile)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Account fields filled from a provider identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Subject id.
    pub sub_id: String,

    /// First word of the display name.
    pub first_name: String,

    /// Remainder of the display name.
    pub last_name: String,

    /// Email address.
    pub email: String,

    /// Avatar image URL.
    pub image_url: String,
}

// ═══════════════════════════════════════════════════════════════════════
// Per-request result
// ═══════════════════════════════════════════════════════════════════════

/// Where per-request authentication stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionCheck {
    /// Issuer cookie absent or for another issuer; not examined.
    #[default]
    PassThrough,
    /// No login token cookie.
    NoCookie,
    /// Session id did not resolve to a stored session.
    SessionMissing,
    /// Session store could not be read.
    StoreError,
    /// Token failed signature or payload verification.
    MalformedToken,
    /// Token verified and unexpired.
    TokenFreshValid,
    /// Token was expired and has been renewed.
    RefreshOk,
    /// Token was expired and renewal failed; session removed.
    RefreshFailed,
}

/// Outcome of authenticating one request.
///
/// Claims and the partial user are independent: a request can carry a user
/// whose claims failed to resolve, which account provisioning relies on.
#[derive(Debug, Clone, Default)]
pub struct RequestAuth {
    /// Verified claims.
    pub claims: Option<Claims>,

    /// Identity recovered from the token, even when authentication failed.
    pub user: Option<AuthenticatedUser>,

    /// Why claims are absent.
    pub error: Option<AuthError>,

    /// Final state of the session check.
    pub check: SessionCheck,
}

impl RequestAuth {
    /// Request that this authenticator did not examine.
    #[must_use]
    pub fn pass_through() -> Self {
        Self::default()
    }

    /// Returns `true` if claims were verified.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.claims.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_parse() {
        let id = SessionId::new();
        assert_eq!(SessionId::parse(&id.to_string()), Some(id));
        assert_eq!(SessionId::parse("not-a-uuid"), None);
        assert_eq!(SessionId::parse(""), None);
    }

    #[test]
    fn test_subject_for_login() {
        assert_eq!(
            SubjectId::for_login("https://github.com/", "bob").as_str(),
            "https://github.com/bob"
        );
    }

    #[test]
    fn test_profile_from_github_json() {
        let json = r#"{"login":"alice","id":1,"name":null,"email":"a@example.com","avatar_url":"https://a.example/1.png"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap_or_default();
        assert_eq!(profile.login, "alice");
        assert_eq!(profile.name, None);
        assert_eq!(profile.email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn test_expiry_usec() {
        let expires_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
        let record = SessionRecord {
            session_id: SessionId::new(),
            subject_id: SubjectId::for_login("https://github.com", "alice"),
            access_token: "gho_secret".into(),
            refresh_token: "gho_secret".into(),
            expires_at,
            created_at: expires_at,
        };
        assert_eq!(record.expiry_usec(), 1_700_000_000_000_000);
        assert!(!format!("{record:?}").contains("gho_secret"));
    }

    #[test]
    fn test_request_auth_default_is_anonymous() {
        let auth = RequestAuth::pass_through();
        assert!(!auth.is_authenticated());
        assert!(auth.user.is_none());
        assert_eq!(auth.check, SessionCheck::PassThrough);
    }
}
