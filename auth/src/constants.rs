//! Authentication constants.
//!
//! Well-known paths, cookie names and policy defaults shared by the
//! authenticator and the web layer.

/// Issuer tag for GitHub-issued login cookies.
pub const GITHUB_ISSUER: &str = "https://github.com";

/// Path that starts the GitHub login flow.
pub const LOGIN_PATH: &str = "/login/github/";

/// Path GitHub redirects back to after consent.
pub const AUTH_PATH: &str = "/auth/github/";

/// Default post-login redirect target.
pub const DEFAULT_REDIRECT: &str = "/";

/// Default token validity window in days.
pub const DEFAULT_TOKEN_VALIDITY_DAYS: i64 = 365;

/// Longest token validity window accepted in configuration, in days.
pub const MAX_TOKEN_VALIDITY_DAYS: i64 = 3650;

/// Default OAuth state cookie lifetime in minutes.
pub const DEFAULT_STATE_TTL_MINUTES: i64 = 5;

/// Minimum length of the token signing key in bytes.
pub const MIN_SIGNING_KEY_LEN: usize = 32;

/// Cookie names of the login cookie group.
pub mod cookie_names {
    /// Issuer tag.
    pub const ISSUER: &str = "Authorization-Issuer";

    /// Signed login token.
    pub const TOKEN: &str = "Authorization";

    /// Session identifier.
    pub const SESSION_ID: &str = "Session-ID";

    /// Post-login redirect target.
    pub const REDIRECT_URL: &str = "Redirect-URL";

    /// OAuth CSRF state.
    pub const OAUTH_STATE: &str = "OAuth-State";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_distinct() {
        assert_ne!(LOGIN_PATH, AUTH_PATH);
        assert!(LOGIN_PATH.starts_with('/') && AUTH_PATH.starts_with('/'));
    }

    #[test]
    fn test_subject_prefix_format() {
        let subject = format!("{GITHUB_ISSUER}/{}", "alice");
        assert_eq!(subject, "https://github.com/alice");
    }
}
