//! Claims resolution.

use crate::error::Result;
use crate::state::{Claims, SubjectId};

/// Turns a verified subject id into claims for authorization.
///
/// Failing here does not discard the identity: the authenticator still
/// attaches the user so account provisioning can run.
pub trait ClaimsResolver: Send + Sync {
    /// Resolve claims for `subject`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownSubject` if the subject has no account, or
    /// `AuthError::StoreUnavailable` if the account store cannot be reached.
    fn claims_for_subject(
        &self,
        subject: &SubjectId,
    ) -> impl std::future::Future<Output = Result<Claims>> + Send;
}

/// Resolver that vouches for every subject under a fixed issuer.
#[derive(Debug, Clone)]
pub struct SubjectClaimsResolver {
    issuer: String,
}

impl SubjectClaimsResolver {
    /// Resolver issuing claims under `issuer`.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }
}

impl Default for SubjectClaimsResolver {
    fn default() -> Self {
        Self::new(crate::constants::GITHUB_ISSUER)
    }
}

impl ClaimsResolver for SubjectClaimsResolver {
    async fn claims_for_subject(&self, subject: &SubjectId) -> Result<Claims> {
        Ok(Claims {
            subject: subject.clone(),
            issuer: self.issuer.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subject_claims() {
        let subject = SubjectId::for_login("https://github.com", "alice");
        let claims = SubjectClaimsResolver::default()
            .claims_for_subject(&subject)
            .await
            .unwrap();

        assert_eq!(claims.subject, subject);
        assert_eq!(claims.issuer, "https://github.com");
    }
}
