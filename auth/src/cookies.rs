//! Signed login cookies.
//!
//! The issuer tag, login token and session id travel as a group: they are set
//! together on login or renewal and cleared together on logout or when the
//! session is gone. All cookies are HMAC-signed by [`SignedCookieJar`], so a
//! modified value reads as absent.

use crate::constants::cookie_names;
use crate::state::SessionId;
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use time::OffsetDateTime;

/// Login cookie group as presented by the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginCookies {
    /// Issuer tag.
    pub issuer: Option<String>,
    /// Signed login token.
    pub token: Option<String>,
    /// Session id, if present and well-formed.
    pub session_id: Option<SessionId>,
}

impl LoginCookies {
    /// Read the login cookie group from `jar`.
    #[must_use]
    pub fn read(jar: &SignedCookieJar) -> Self {
        Self {
            issuer: value(jar, cookie_names::ISSUER),
            token: value(jar, cookie_names::TOKEN).filter(|t| !t.is_empty()),
            session_id: value(jar, cookie_names::SESSION_ID).and_then(|v| SessionId::parse(&v)),
        }
    }
}

fn value(jar: &SignedCookieJar, name: &str) -> Option<String> {
    jar.get(name).map(|c| c.value().to_string())
}

fn cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Set the login cookie group, expiring at `expires_at` (Unix seconds).
#[must_use]
pub fn set_login_cookies(
    jar: SignedCookieJar,
    token: &str,
    issuer: &str,
    session_id: SessionId,
    expires_at: i64,
    secure: bool,
) -> SignedCookieJar {
    let expires = OffsetDateTime::from_unix_timestamp(expires_at).ok();
    let group = [
        (cookie_names::ISSUER, issuer.to_string()),
        (cookie_names::TOKEN, token.to_string()),
        (cookie_names::SESSION_ID, session_id.to_string()),
    ];

    group.into_iter().fold(jar, |jar, (name, value)| {
        let mut cookie = cookie(name, value, secure);
        if let Some(at) = expires {
            cookie.set_expires(at);
        }
        jar.add(cookie)
    })
}

/// Clear the login cookie group.
#[must_use]
pub fn clear_login_cookies(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(removal(cookie_names::ISSUER))
        .remove(removal(cookie_names::TOKEN))
        .remove(removal(cookie_names::SESSION_ID))
}

/// Post-login redirect target, if one was stored.
#[must_use]
pub fn redirect_target(jar: &SignedCookieJar) -> Option<String> {
    value(jar, cookie_names::REDIRECT_URL).filter(|t| is_local_redirect(t))
}

/// Store the post-login redirect target.
#[must_use]
pub fn set_redirect_target(jar: SignedCookieJar, target: &str, secure: bool) -> SignedCookieJar {
    jar.add(cookie(cookie_names::REDIRECT_URL, target.to_string(), secure))
}

/// Drop the post-login redirect target.
#[must_use]
pub fn clear_redirect_target(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(removal(cookie_names::REDIRECT_URL))
}

/// Store the OAuth CSRF state for `ttl_minutes`.
#[must_use]
pub fn set_oauth_state(
    jar: SignedCookieJar,
    state: &str,
    ttl_minutes: i64,
    secure: bool,
) -> SignedCookieJar {
    let mut cookie = cookie(cookie_names::OAUTH_STATE, state.to_string(), secure);
    cookie.set_max_age(time::Duration::minutes(ttl_minutes));
    jar.add(cookie)
}

/// Read and remove the OAuth CSRF state.
#[must_use]
pub fn take_oauth_state(jar: SignedCookieJar) -> (SignedCookieJar, Option<String>) {
    let state = value(&jar, cookie_names::OAUTH_STATE);
    (jar.remove(removal(cookie_names::OAUTH_STATE)), state)
}

/// Returns `true` if `target` is a path on this site.
///
/// Rejects absolute and scheme-relative URLs so the login flow cannot be used
/// as an open redirect.
#[must_use]
pub fn is_local_redirect(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;

    fn jar() -> SignedCookieJar {
        SignedCookieJar::new(Key::generate())
    }

    #[test]
    fn test_login_cookies_round_trip() {
        let session_id = SessionId::new();
        let jar = set_login_cookies(jar(), "tok", "https://github.com", session_id, 4_102_444_800, true);

        let cookies = LoginCookies::read(&jar);
        assert_eq!(cookies.issuer.as_deref(), Some("https://github.com"));
        assert_eq!(cookies.token.as_deref(), Some("tok"));
        assert_eq!(cookies.session_id, Some(session_id));

        let token = jar.get(cookie_names::TOKEN);
        assert!(token.as_ref().and_then(Cookie::http_only).unwrap_or(false));
        assert_eq!(token.as_ref().and_then(Cookie::same_site), Some(SameSite::Lax));
    }

    #[test]
    fn test_clear_login_cookies() {
        let jar = set_login_cookies(jar(), "tok", "https://github.com", SessionId::new(), 4_102_444_800, false);
        let jar = clear_login_cookies(jar);

        assert_eq!(LoginCookies::read(&jar), LoginCookies::default());
        // Removal cookies are still emitted to the browser.
        assert!(jar.iter().next().is_none());
    }

    #[test]
    fn test_oauth_state_is_consumed() {
        let jar = set_oauth_state(jar(), "abc", 5, true);
        let (jar, state) = take_oauth_state(jar);
        assert_eq!(state.as_deref(), Some("abc"));

        let (_, state) = take_oauth_state(jar);
        assert_eq!(state, None);
    }

    #[test]
    fn test_redirect_target() {
        let jar = set_redirect_target(jar(), "/invocations/123", true);
        assert_eq!(redirect_target(&jar).as_deref(), Some("/invocations/123"));

        let jar = clear_redirect_target(jar);
        assert_eq!(redirect_target(&jar), None);
    }

    #[test]
    fn test_local_redirects_only() {
        assert!(is_local_redirect("/"));
        assert!(is_local_redirect("/settings?tab=keys"));
        assert!(!is_local_redirect("//evil.example"));
        assert!(!is_local_redirect("https://evil.example"));
        assert!(!is_local_redirect("/\\evil.example"));
        assert!(!is_local_redirect(""));
    }
}
