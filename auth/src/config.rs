//! Authenticator configuration.
//!
//! The signing key and every policy constant are passed in through
//! [`AuthConfig`] so tests can run side by side with distinct keys.

use crate::constants::{
    AUTH_PATH, DEFAULT_REDIRECT, DEFAULT_STATE_TTL_MINUTES, DEFAULT_TOKEN_VALIDITY_DAYS,
    GITHUB_ISSUER, LOGIN_PATH, MAX_TOKEN_VALIDITY_DAYS, MIN_SIGNING_KEY_LEN,
};
use crate::error::{AuthError, Result};
use chrono::Duration;
use std::fmt;

/// Configuration for the OAuth session authenticator.
#[derive(Clone)]
pub struct AuthConfig {
    /// Issuer tag written to, and expected in, the issuer cookie.
    ///
    /// Default: `https://github.com`
    pub issuer: String,

    /// HMAC key used to sign login tokens.
    pub signing_key: Vec<u8>,

    /// Validity window granted to a freshly issued or renewed token.
    ///
    /// Default: 365 days
    pub token_validity: Duration,

    /// Path that starts the login flow.
    pub login_path: String,

    /// Path the identity provider redirects back to.
    pub callback_path: String,

    /// Public base URL (e.g. `https://cache.example.com`), used to build the
    /// callback redirect URI.
    pub base_url: String,

    /// Mark cookies `Secure`. Disable only for plain-HTTP development.
    pub secure_cookies: bool,

    /// Where to send the browser after login when no redirect cookie is set.
    pub default_redirect: String,

    /// Lifetime of the OAuth state cookie in minutes.
    ///
    /// Default: 5 minutes
    pub state_ttl_minutes: i64,
}

impl AuthConfig {
    /// Create configuration with the given signing key and GitHub defaults.
    #[must_use]
    pub fn new(signing_key: impl Into<Vec<u8>>) -> Self {
        Self {
            issuer: GITHUB_ISSUER.to_string(),
            signing_key: signing_key.into(),
            token_validity: Duration::days(DEFAULT_TOKEN_VALIDITY_DAYS),
            login_path: LOGIN_PATH.to_string(),
            callback_path: AUTH_PATH.to_string(),
            base_url: "http://localhost:3000".to_string(),
            secure_cookies: true,
            default_redirect: DEFAULT_REDIRECT.to_string(),
            state_ttl_minutes: DEFAULT_STATE_TTL_MINUTES,
        }
    }

    /// Set the issuer tag.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Set the token validity window.
    #[must_use]
    pub const fn with_token_validity(mut self, validity: Duration) -> Self {
        self.token_validity = validity;
        self
    }

    /// Set the login path.
    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Set the callback path.
    #[must_use]
    pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = path.into();
        self
    }

    /// Set the public base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set whether cookies are marked `Secure`.
    #[must_use]
    pub const fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Set the default post-login redirect.
    #[must_use]
    pub fn with_default_redirect(mut self, target: impl Into<String>) -> Self {
        self.default_redirect = target.into();
        self
    }

    /// Set OAuth state cookie lifetime.
    #[must_use]
    pub const fn with_state_ttl(mut self, minutes: i64) -> Self {
        self.state_ttl_minutes = minutes;
        self
    }

    /// Absolute callback URL handed to the identity provider.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.callback_path
        )
    }

    /// Check invariants the authenticator relies on.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the signing key is too short,
    /// the token validity window is not positive or exceeds
    /// [`MAX_TOKEN_VALIDITY_DAYS`], or the state cookie lifetime is outside
    /// one minute to one day.
    pub fn validate(&self) -> Result<()> {
        if self.signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(AuthError::Configuration(format!(
                "signing key must be at least {MIN_SIGNING_KEY_LEN} bytes"
            )));
        }
        if self.token_validity <= Duration::zero() {
            return Err(AuthError::Configuration(
                "token validity must be positive".to_string(),
            ));
        }
        if self.token_validity > Duration::days(MAX_TOKEN_VALIDITY_DAYS) {
            return Err(AuthError::Configuration(format!(
                "token validity must not exceed {MAX_TOKEN_VALIDITY_DAYS} days"
            )));
        }
        if !(1..=24 * 60).contains(&self.state_ttl_minutes) {
            return Err(AuthError::Configuration(
                "state cookie lifetime must be between 1 minute and 1 day".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from the process environment.
    ///
    /// Reads `FORGE_JWT_SECRET` (required), `FORGE_BASE_URL`,
    /// `FORGE_TOKEN_VALIDITY_DAYS` and `FORGE_SECURE_COOKIES`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if a variable is missing or invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret = lookup("FORGE_JWT_SECRET")
            .ok_or_else(|| AuthError::Configuration("FORGE_JWT_SECRET is not set".to_string()))?;
        let mut config = Self::new(secret.into_bytes());

        if let Some(base_url) = lookup("FORGE_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(days) = lookup("FORGE_TOKEN_VALIDITY_DAYS") {
            let days: i64 = days.parse().map_err(|_| {
                AuthError::Configuration(format!("FORGE_TOKEN_VALIDITY_DAYS: invalid number {days:?}"))
            })?;
            config.token_validity = Duration::try_days(days).ok_or_else(|| {
                AuthError::Configuration(format!("FORGE_TOKEN_VALIDITY_DAYS: {days} out of range"))
            })?;
        }
        if let Some(secure) = lookup("FORGE_SECURE_COOKIES") {
            config.secure_cookies = parse_flag(&secure).ok_or_else(|| {
                AuthError::Configuration(format!("FORGE_SECURE_COOKIES: invalid flag {secure:?}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("signing_key", &"[REDACTED]")
            .field("token_validity", &self.token_validity)
            .field("login_path", &self.login_path)
            .field("callback_path", &self.callback_path)
            .field("base_url", &self.base_url)
            .field("secure_cookies", &self.secure_cookies)
            .field("default_redirect", &self.default_redirect)
            .field("state_ttl_minutes", &self.state_ttl_minutes)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::new(KEY);
        assert_eq!(config.issuer, "https://github.com");
        assert_eq!(config.login_path, "/login/github/");
        assert_eq!(config.callback_path, "/auth/github/");
        assert_eq!(config.token_validity, Duration::days(365));
        assert_eq!(config.default_redirect, "/");
        assert!(config.secure_cookies);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = AuthConfig::new(KEY)
            .with_base_url("https://cache.example.com/")
            .with_token_validity(Duration::hours(1))
            .with_secure_cookies(false)
            .with_state_ttl(10);

        assert_eq!(config.callback_url(), "https://cache.example.com/auth/github/");
        assert_eq!(config.token_validity, Duration::hours(1));
        assert!(!config.secure_cookies);
        assert_eq!(config.state_ttl_minutes, 10);
    }

    #[test]
    fn test_short_key_rejected() {
        let err = AuthConfig::new("short").validate().unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", AuthConfig::new(KEY));
        assert!(!debug.contains(KEY));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_from_lookup() {
        let config = AuthConfig::from_lookup(lookup(&[
            ("FORGE_JWT_SECRET", KEY),
            ("FORGE_BASE_URL", "https://cache.example.com"),
            ("FORGE_TOKEN_VALIDITY_DAYS", "30"),
            ("FORGE_SECURE_COOKIES", "false"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://cache.example.com");
        assert_eq!(config.token_validity, Duration::days(30));
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_from_lookup_requires_secret() {
        let err = AuthConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(
            AuthConfig::from_lookup(lookup(&[
                ("FORGE_JWT_SECRET", KEY),
                ("FORGE_TOKEN_VALIDITY_DAYS", "forever"),
            ]))
            .is_err()
        );
        assert!(
            AuthConfig::from_lookup(lookup(&[
                ("FORGE_JWT_SECRET", KEY),
                ("FORGE_TOKEN_VALIDITY_DAYS", "0"),
            ]))
            .is_err()
        );
        assert!(
            AuthConfig::from_lookup(lookup(&[
                ("FORGE_JWT_SECRET", KEY),
                ("FORGE_SECURE_COOKIES", "maybe"),
            ]))
            .is_err()
        );
    }

    #[test]
    fn test_from_lookup_rejects_huge_validity() {
        for days in ["3651", "100000000", "9223372036854775807"] {
            let err = AuthConfig::from_lookup(lookup(&[
                ("FORGE_JWT_SECRET", KEY),
                ("FORGE_TOKEN_VALIDITY_DAYS", days),
            ]))
            .unwrap_err();
            assert!(matches!(err, AuthError::Configuration(_)), "{days}");
        }
    }

    #[test]
    fn test_validity_and_state_ttl_bounds() {
        assert!(
            AuthConfig::new(KEY)
                .with_token_validity(Duration::days(MAX_TOKEN_VALIDITY_DAYS))
                .validate()
                .is_ok()
        );
        assert!(
            AuthConfig::new(KEY)
                .with_token_validity(Duration::days(100_000_000))
                .validate()
                .is_err()
        );
        assert!(AuthConfig::new(KEY).with_state_ttl(0).validate().is_err());
        assert!(AuthConfig::new(KEY).with_state_ttl(i64::MAX).validate().is_err());
    }
}
