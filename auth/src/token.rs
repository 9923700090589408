//! Signed login tokens.
//!
//! A login token is an HS256 JWT carrying the user's profile snapshot and an
//! expiry. Verification is two-phase: [`TokenCodec::decode`] with
//! `check_expiry = false` checks the signature only, so a stale token can
//! still identify the session it belongs to.

use crate::error::{AuthError, Result};
use crate::state::UserProfile;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Payload of a login token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedToken {
    /// Profile snapshot taken at login or renewal.
    pub github_user: UserProfile,

    /// Expiry, Unix seconds.
    pub exp: i64,
}

impl SignedToken {
    /// Token for `profile` expiring at `exp`.
    #[must_use]
    pub const fn new(profile: UserProfile, exp: i64) -> Self {
        Self {
            github_user: profile,
            exp,
        }
    }

    /// Check the payload invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ProviderProfileInvalid`] if the login is empty.
    pub fn validate(&self) -> Result<()> {
        if self.github_user.login.trim().is_empty() {
            return Err(AuthError::ProviderProfileInvalid);
        }
        Ok(())
    }

    /// Returns `true` if the token is past its expiry at `now` (Unix seconds).
    #[must_use]
    pub const fn is_expired_at(&self, now: i64) -> bool {
        now > self.exp
    }
}

/// Encodes and verifies login tokens with a symmetric key.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Codec signing with `secret`.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `decode` so that it can be skipped.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign `token`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ProviderProfileInvalid`] if the payload is invalid,
    /// or [`AuthError::SerializationError`] if signing fails.
    pub fn encode(&self, token: &SignedToken) -> Result<String> {
        token.validate()?;
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), token, &self.encoding)
            .map_err(|e| AuthError::SerializationError(e.to_string()))
    }

    /// Verify `token` and return its payload.
    ///
    /// # Errors
    ///
    /// - [`AuthError::TokenTampered`] if the signature, structure or payload
    ///   fails verification.
    /// - [`AuthError::TokenExpired`] if `check_expiry` is set and the token
    ///   is past its expiry.
    pub fn decode_token(&self, token: &str, check_expiry: bool) -> Result<SignedToken> {
        let data = jsonwebtoken::decode::<SignedToken>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "login token failed verification");
                AuthError::TokenTampered
            })?;
        let claims = data.claims;

        if claims.validate().is_err() {
            return Err(AuthError::TokenTampered);
        }
        if check_expiry && claims.is_expired_at(Utc::now().timestamp()) {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    /// Verify `token` and return the embedded profile.
    ///
    /// # Errors
    ///
    /// Same as [`TokenCodec::decode_token`].
    pub fn decode(&self, token: &str, check_expiry: bool) -> Result<UserProfile> {
        self.decode_token(token, check_expiry).map(|t| t.github_user)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}
