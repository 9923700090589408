//! GitHub OAuth provider implementation.

use crate::error::{AuthError, Result};
use crate::providers::{CallbackRequest, IdentityProvider};
use crate::state::UserProfile;
use reqwest::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use std::fmt;

const USER_AGENT_VALUE: &str = concat!("forge-auth/", env!("CARGO_PKG_VERSION"));

/// GitHub OAuth application settings.
#[derive(Clone)]
pub struct GitHubConfig {
    /// OAuth app client id.
    pub client_id: String,

    /// OAuth app client secret (keep confidential).
    pub client_secret: String,

    /// Consent screen endpoint.
    pub authorize_url: String,

    /// Code exchange endpoint.
    pub token_url: String,

    /// REST API base URL.
    pub api_url: String,

    /// Scopes to request (default: `user:email`).
    pub scopes: Vec<String>,
}

impl GitHubConfig {
    /// Configuration for github.com with the given OAuth app credentials.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorize_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            api_url: "https://api.github.com".to_string(),
            scopes: vec!["user:email".to_string()],
        }
    }

    /// Point the provider at a GitHub Enterprise Server host.
    #[must_use]
    pub fn with_enterprise_host(mut self, host: &str) -> Self {
        let host = host.trim_end_matches('/');
        self.authorize_url = format!("{host}/login/oauth/authorize");
        self.token_url = format!("{host}/login/oauth/access_token");
        self.api_url = format!("{host}/api/v3");
        self
    }

    /// Set scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Load from `GITHUB_CLIENT_ID` and `GITHUB_CLIENT_SECRET`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if either variable is unset.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name)
                .map_err(|_| AuthError::Configuration(format!("{name} is not set")))
        };
        Ok(Self::new(var("GITHUB_CLIENT_ID")?, var("GITHUB_CLIENT_SECRET")?))
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("api_url", &self.api_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// GitHub OAuth provider.
///
/// GitHub OAuth apps issue no refresh token, so renewal re-fetches the
/// profile with the original access token.
///
/// # Example
///
/// ```no_run
/// use forge_auth::providers::{GitHubConfig, GitHubOAuthProvider};
///
/// let github = GitHubOAuthProvider::new(GitHubConfig::new("client-id", "client-secret"));
/// ```
#[derive(Clone, Debug)]
pub struct GitHubOAuthProvider {
    config: GitHubConfig,
    http_client: Client,
}

impl GitHubOAuthProvider {
    /// Create a provider from `config`.
    #[must_use]
    pub fn new(config: GitHubConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
        }
    }
}

/// Token endpoint response. GitHub reports errors with status 200.
#[derive(Debug, Deserialize)]
struct GitHubTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl IdentityProvider for GitHubOAuthProvider {
    async fn authorization_url(&self, state: &str, redirect_uri: &str) -> Result<String> {
        let scope = self.config.scopes.join(" ");
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("state", state),
        ];

        let query = serde_urlencoded::to_string(&params[..])
            .map_err(|e| AuthError::Configuration(format!("failed to build URL: {e}")))?;

        Ok(format!("{}?{query}", self.config.authorize_url))
    }

    async fn exchange(&self, request: &CallbackRequest) -> Result<String> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", request.code.as_str()),
            ("redirect_uri", request.redirect_uri.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.config.token_url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, USER_AGENT_VALUE)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::ProviderExchangeFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(%status, "GitHub token exchange failed");
            return Err(AuthError::ProviderExchangeFailed(format!(
                "token endpoint returned {status}"
            )));
        }

        let body: GitHubTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ProviderExchangeFailed(e.to_string()))?;

        match body {
            GitHubTokenResponse {
                access_token: Some(token),
                ..
            } if !token.is_empty() => Ok(token),
            GitHubTokenResponse {
                error,
                error_description,
                ..
            } => Err(AuthError::ProviderExchangeFailed(
                error_description
                    .or(error)
                    .unwrap_or_else(|| "no access token in response".to_string()),
            )),
        }
    }

    async fn fetch_user_info(&self, access_token: &str) -> Result<UserProfile> {
        let response = self
            .http_client
            .get(format!("{}/user", self.config.api_url))
            .bearer_auth(access_token)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, USER_AGENT_VALUE)
            .send()
            .await
            .map_err(|e| AuthError::ProviderExchangeFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(%status, "GitHub user info request failed");
            return Err(AuthError::ProviderExchangeFailed(format!(
                "user endpoint returned {status}"
            )));
        }

        response
            .json::<UserProfile>()
            .await
            .map_err(|e| AuthError::ProviderExchangeFailed(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_authorization_url() {
        let github = GitHubOAuthProvider::new(GitHubConfig::new("my-client", "secret"));
        let url = github
            .authorization_url("st4te", "https://cache.example.com/auth/github/")
            .await
            .unwrap();

        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=my-client"));
        assert!(url.contains("state=st4te"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fcache.example.com%2Fauth%2Fgithub%2F"));
        assert!(url.contains("scope=user%3Aemail"));
        assert!(!url.contains("secret"));
    }

    #[test]
    fn test_enterprise_host() {
        let config = GitHubConfig::new("id", "secret").with_enterprise_host("https://ghe.corp/");
        assert_eq!(config.token_url, "https://ghe.corp/login/oauth/access_token");
        assert_eq!(config.api_url, "https://ghe.corp/api/v3");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", GitHubConfig::new("id", "hunter2"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_token_error_response() {
        let body: GitHubTokenResponse = serde_json::from_str(
            r#"{"error":"bad_verification_code","error_description":"The code passed is incorrect or expired."}"#,
        )
        .unwrap();
        assert!(body.access_token.is_none());
        assert_eq!(body.error.as_deref(), Some("bad_verification_code"));
    }
}
