//! OAuth session authenticator.
//!
//! Turns a one-time OAuth authorization into a browser session and
//! re-validates that session on every request, renewing the login token
//! lazily when it has expired.
//!
//! # Per-request state machine
//!
//! ```text
//! issuer cookie ≠ ours ─────────────────────────────▶ PassThrough
//! no token cookie ──────────────────────────────────▶ NoCookie
//! session id unknown ──▶ clear cookies ─────────────▶ SessionMissing
//! signature invalid ────────────────────────────────▶ MalformedToken
//! signature ok, unexpired ──────────────────────────▶ TokenFreshValid
//! signature ok, expired ──▶ renew ──┬─ ok ──────────▶ RefreshOk
//!                                   └─ failed ──▶ clear cookies,
//!                                                 delete session ─▶ RefreshFailed
//! ```

use crate::config::AuthConfig;
use crate::cookies::{self, LoginCookies};
use crate::environment::AuthEnvironment;
use crate::error::{AuthError, Result};
use crate::providers::{CallbackRequest, ClaimsResolver, IdentityProvider, SessionStore};
use crate::state::{
    AuthenticatedUser, Claims, RequestAuth, SessionCheck, SessionId, SessionRecord, SubjectId,
    UserProfile, UserRecord,
};
use crate::token::{SignedToken, TokenCodec};
use axum_extra::extract::cookie::SignedCookieJar;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use http::Uri;
use rand::RngCore;
use serde::Deserialize;

/// Where to send the browser next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    /// Absolute URL or site-relative path.
    pub location: String,
}

impl RedirectTarget {
    fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct LoginQuery {
    #[serde(default)]
    redirect_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CallbackQuery {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Result of `authenticate_user` before it is folded into a [`RequestAuth`].
struct Outcome {
    jar: SignedCookieJar,
    user: Option<AuthenticatedUser>,
    claims: Result<Claims>,
    check: SessionCheck,
}

impl Outcome {
    fn failed(jar: SignedCookieJar, check: SessionCheck, error: AuthError) -> Self {
        Self {
            jar,
            user: None,
            claims: Err(error),
            check,
        }
    }
}

/// OAuth session authenticator for one identity provider.
///
/// Holds no mutable state of its own: sessions live in the store and the
/// login token travels in signed cookies. One instance serves all requests.
pub struct Authenticator<P, S, C>
where
    P: IdentityProvider,
    S: SessionStore,
    C: ClaimsResolver,
{
    config: AuthConfig,
    codec: TokenCodec,
    env: AuthEnvironment<P, S, C>,
}

impl<P, S, C> Authenticator<P, S, C>
where
    P: IdentityProvider,
    S: SessionStore,
    C: ClaimsResolver,
{
    /// Build an authenticator.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if `config` is invalid.
    pub fn new(config: AuthConfig, env: AuthEnvironment<P, S, C>) -> Result<Self> {
        config.validate()?;
        let codec = TokenCodec::new(&config.signing_key);
        Ok(Self { config, codec, env })
    }

    /// Configuration in use.
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// External collaborators.
    pub const fn environment(&self) -> &AuthEnvironment<P, S, C> {
        &self.env
    }

    /// Token codec, keyed with the configured signing key.
    pub const fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Always `false`: GitHub login is not an SSO integration.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn sso_enabled(&self) -> bool {
        false
    }

    fn route_guard(uri: &Uri, expected: &str) -> Result<()> {
        if uri.path() == expected {
            Ok(())
        } else {
            Err(AuthError::WrongRoute {
                path: uri.path().to_string(),
            })
        }
    }

    fn expiry_from_now(&self) -> Result<(i64, DateTime<Utc>)> {
        let out_of_range = || AuthError::InternalError("token expiry out of range".to_string());
        let exp = Utc::now()
            .checked_add_signed(self.config.token_validity)
            .ok_or_else(out_of_range)?
            .timestamp();
        let expires_at = DateTime::from_timestamp(exp, 0).ok_or_else(out_of_range)?;
        Ok((exp, expires_at))
    }

    fn user_for(&self, profile: UserProfile, access_token: Option<String>) -> AuthenticatedUser {
        AuthenticatedUser {
            subject: SubjectId::for_login(&self.config.issuer, &profile.login),
            profile,
            access_token,
        }
    }

    // ═══════════════════════════════════════════════════════════
    // Login
    // ═══════════════════════════════════════════════════════════

    /// Start the login flow.
    ///
    /// Stores a fresh CSRF state (and the `redirect_url` query parameter, if
    /// it is a local path) in cookies and returns the consent screen URL. No
    /// session is created.
    ///
    /// # Errors
    ///
    /// - [`AuthError::WrongRoute`] if `uri` is not the login path.
    /// - Any error from building the authorization URL.
    pub async fn login(
        &self,
        uri: &Uri,
        jar: SignedCookieJar,
    ) -> Result<(SignedCookieJar, RedirectTarget)> {
        Self::route_guard(uri, &self.config.login_path)?;

        let query: LoginQuery =
            serde_urlencoded::from_str(uri.query().unwrap_or_default()).unwrap_or_default();
        let state = generate_state();
        let url = self
            .env
            .provider
            .authorization_url(&state, &self.config.callback_url())
            .await?;

        let secure = self.config.secure_cookies;
        let mut jar = cookies::set_oauth_state(jar, &state, self.config.state_ttl_minutes, secure);
        if let Some(target) = query.redirect_url.filter(|t| cookies::is_local_redirect(t)) {
            jar = cookies::set_redirect_target(jar, &target, secure);
        }

        tracing::debug!(issuer = %self.config.issuer, "redirecting to identity provider");
        Ok((jar, RedirectTarget::new(url)))
    }

    // ═══════════════════════════════════════════════════════════
    // Callback
    // ═══════════════════════════════════════════════════════════

    /// Complete the login flow from the provider's callback.
    ///
    /// Exchanges the code, fetches the profile, stores exactly one new
    /// session and sets the login cookie group. Nothing is persisted if any
    /// step before the store write fails.
    ///
    /// # Errors
    ///
    /// - [`AuthError::WrongRoute`] if `uri` is not the callback path.
    /// - [`AuthError::OAuthStateInvalid`] if the CSRF state does not match.
    /// - [`AuthError::ProviderExchangeFailed`] from the provider, unmodified.
    /// - [`AuthError::ProviderProfileInvalid`] if the profile has no login.
    /// - Store errors from the session write.
    pub async fn auth(
        &self,
        uri: &Uri,
        jar: SignedCookieJar,
    ) -> Result<(SignedCookieJar, RedirectTarget)> {
        Self::route_guard(uri, &self.config.callback_path)?;

        let query: CallbackQuery = serde_urlencoded::from_str(uri.query().unwrap_or_default())
            .map_err(|e| AuthError::ProviderExchangeFailed(format!("malformed callback: {e}")))?;
        let (jar, expected_state) = cookies::take_oauth_state(jar);

        if let Some(error) = query.error {
            tracing::warn!(%error, "identity provider returned an error");
            return Err(AuthError::ProviderExchangeFailed(
                query.error_description.unwrap_or(error),
            ));
        }

        match (expected_state, query.state) {
            (Some(expected), Some(actual))
                if constant_time_eq::constant_time_eq(expected.as_bytes(), actual.as_bytes()) => {}
            _ => {
                tracing::warn!("OAuth state mismatch on callback");
                return Err(AuthError::OAuthStateInvalid);
            }
        }

        let code = query.code.filter(|c| !c.is_empty()).ok_or_else(|| {
            AuthError::ProviderExchangeFailed("missing authorization code".to_string())
        })?;
        let request = CallbackRequest {
            code,
            redirect_uri: self.config.callback_url(),
        };

        let access_token = self.env.provider.exchange(&request).await?;
        let profile = self.env.provider.fetch_user_info(&access_token).await?;

        let (exp, expires_at) = self.expiry_from_now()?;
        let token = SignedToken::new(profile, exp);
        token.validate()?;
        let encoded = self.codec.encode(&token)?;

        let session_id = SessionId::new();
        let subject = SubjectId::for_login(&self.config.issuer, &token.github_user.login);
        let record = SessionRecord {
            session_id,
            subject_id: subject.clone(),
            refresh_token: access_token.clone(),
            access_token,
            expires_at,
            created_at: Utc::now(),
        };

        let jar = cookies::set_login_cookies(
            jar,
            &encoded,
            &self.config.issuer,
            session_id,
            exp,
            self.config.secure_cookies,
        );
        self.env.sessions.insert_or_update_session(&record).await?;
        tracing::info!(%session_id, %subject, "session created");

        let target =
            cookies::redirect_target(&jar).unwrap_or_else(|| self.config.default_redirect.clone());
        Ok((cookies::clear_redirect_target(jar), RedirectTarget::new(target)))
    }

    // ═══════════════════════════════════════════════════════════
    // Per-request authentication
    // ═══════════════════════════════════════════════════════════

    /// Authenticate a request from its cookies.
    ///
    /// Never fails: the outcome, including any error, is returned as a
    /// [`RequestAuth`] alongside the cookie jar with any cookie updates
    /// (renewed token or cleared group) applied.
    pub async fn authenticated_http_context(
        &self,
        jar: SignedCookieJar,
    ) -> (SignedCookieJar, RequestAuth) {
        let cookies = LoginCookies::read(&jar);
        if cookies.issuer.as_deref() != Some(self.config.issuer.as_str()) {
            return (jar, RequestAuth::pass_through());
        }

        let outcome = self.authenticate_user(jar, cookies).await;
        let (claims, error) = match outcome.claims {
            Ok(claims) => (Some(claims), None),
            Err(error) => {
                tracing::debug!(check = ?outcome.check, %error, "request not authenticated");
                (None, Some(error))
            }
        };

        let auth = RequestAuth {
            claims,
            user: outcome.user,
            error,
            check: outcome.check,
        };
        (outcome.jar, auth)
    }

    async fn authenticate_user(&self, jar: SignedCookieJar, cookies: LoginCookies) -> Outcome {
        let Some(token) = cookies.token else {
            return Outcome::failed(jar, SessionCheck::NoCookie, AuthError::logged_out("no jwt set"));
        };

        let session = match cookies.session_id {
            Some(session_id) => self.env.sessions.read_session(&session_id).await,
            None => Err(AuthError::SessionNotFound),
        };
        let session = match session {
            Ok(session) => session,
            Err(AuthError::SessionNotFound) => {
                tracing::debug!(session_id = ?cookies.session_id, "session not found, clearing login cookies");
                let user = self
                    .codec
                    .decode(&token, false)
                    .ok()
                    .map(|profile| self.user_for(profile, None));
                return Outcome {
                    jar: cookies::clear_login_cookies(jar),
                    user,
                    claims: Err(AuthError::SessionNotFound),
                    check: SessionCheck::SessionMissing,
                };
            }
            Err(error) => {
                tracing::warn!(%error, "failed to read session");
                return Outcome::failed(jar, SessionCheck::StoreError, error);
            }
        };

        let signed = match self.codec.decode_token(&token, false) {
            Ok(signed) => signed,
            Err(error) => {
                tracing::warn!(session_id = %session.session_id, "login token failed verification");
                return Outcome::failed(jar, SessionCheck::MalformedToken, error);
            }
        };

        if !signed.is_expired_at(Utc::now().timestamp()) {
            let user = self.user_for(signed.github_user, Some(session.access_token));
            let claims = self.env.claims.claims_for_subject(&user.subject).await;
            return Outcome {
                jar,
                user: Some(user),
                claims,
                check: SessionCheck::TokenFreshValid,
            };
        }

        self.refresh(jar, session).await
    }

    async fn renew_token(&self, refresh_token: &str) -> Result<SignedToken> {
        let profile = self.env.provider.fetch_user_info(refresh_token).await?;
        let (exp, _) = self.expiry_from_now()?;
        let token = SignedToken::new(profile, exp);
        token.validate()?;
        Ok(token)
    }

    async fn refresh(&self, jar: SignedCookieJar, mut session: SessionRecord) -> Outcome {
        let session_id = session.session_id;
        tracing::info!(%session_id, subject = %session.subject_id, "login token expired, renewing");

        let renewed = match self.renew_token(&session.refresh_token).await {
            Ok(token) => token,
            Err(error) => {
                tracing::warn!(%session_id, subject = %session.subject_id, %error, "failed to renew login token");
                let jar = cookies::clear_login_cookies(jar);
                if let Err(error) = self.env.sessions.clear_session(&session_id).await {
                    tracing::error!(%session_id, %error, "failed to clear session after renewal failure");
                }
                return Outcome::failed(
                    jar,
                    SessionCheck::RefreshFailed,
                    AuthError::TokenExpiredUnrefreshable,
                );
            }
        };

        let encoded = match self.codec.encode(&renewed) {
            Ok(encoded) => encoded,
            Err(error) => return Outcome::failed(jar, SessionCheck::RefreshFailed, error),
        };
        match DateTime::from_timestamp(renewed.exp, 0) {
            Some(expires_at) => session.expires_at = expires_at,
            None => {
                return Outcome::failed(
                    jar,
                    SessionCheck::RefreshFailed,
                    AuthError::InternalError("token expiry out of range".to_string()),
                );
            }
        }
        if let Err(error) = self.env.sessions.insert_or_update_session(&session).await {
            tracing::warn!(%session_id, %error, "failed to store renewed session");
            return Outcome::failed(jar, SessionCheck::StoreError, error);
        }

        let jar = cookies::set_login_cookies(
            jar,
            &encoded,
            &self.config.issuer,
            session_id,
            renewed.exp,
            self.config.secure_cookies,
        );
        tracing::info!(%session_id, subject = %session.subject_id, "login token renewed");

        let user = self.user_for(renewed.github_user, Some(session.access_token));
        let claims = self.env.claims.claims_for_subject(&user.subject).await;
        Outcome {
            jar,
            user: Some(user),
            claims,
            check: SessionCheck::RefreshOk,
        }
    }

    // ═══════════════════════════════════════════════════════════
    // Account provisioning and logout
    // ═══════════════════════════════════════════════════════════

    /// Fill `record`'s identity fields from the request's partial identity.
    ///
    /// The display name is split on its first space into first and last name.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoUserToken`] (kind `Unauthenticated`) if no
    /// identity is attached to the request.
    pub fn fill_user(&self, auth: &RequestAuth, record: &mut UserRecord) -> Result<()> {
        let user = auth.user.as_ref().ok_or(AuthError::NoUserToken)?;
        let profile = &user.profile;
        let name = profile.name.as_deref().unwrap_or_default();
        let (first, last) = name.split_once(' ').unwrap_or((name, ""));

        record.sub_id = SubjectId::for_login(&self.config.issuer, &profile.login).0;
        record.first_name = first.to_string();
        record.last_name = last.to_string();
        record.email = profile.email.clone().unwrap_or_default();
        record.image_url = profile.avatar_url.clone().unwrap_or_default();
        Ok(())
    }

    /// Verified claims of the request, if this authenticator issued them.
    ///
    /// # Errors
    ///
    /// Returns the error recorded during authentication, or
    /// [`AuthError::LoggedOut`] if the request was not examined.
    pub fn authenticated_user(&self, auth: &RequestAuth) -> Result<Claims> {
        match (&auth.claims, &auth.error) {
            (Some(claims), _) if claims.issuer == self.config.issuer => Ok(claims.clone()),
            (_, Some(error)) => Err(error.clone()),
            _ => Err(AuthError::logged_out("not authenticated")),
        }
    }

    /// Log out.
    ///
    /// Always clears the login cookie group, then deletes the session if a
    /// session id was presented. Store failures are logged, never returned.
    pub async fn logout(&self, jar: SignedCookieJar) -> SignedCookieJar {
        let cookies = LoginCookies::read(&jar);
        let jar = cookies::clear_login_cookies(jar);

        if let Some(session_id) = cookies.session_id {
            match self.env.sessions.clear_session(&session_id).await {
                Ok(()) => tracing::info!(%session_id, "logged out"),
                Err(error) => tracing::error!(%session_id, %error, "failed to clear session on logout"),
            }
        }
        jar
    }
}

/// 256-bit random OAuth state, URL-safe.
fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
