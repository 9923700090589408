//! Mock claims resolver for testing.

use super::lock_failed;
use crate::constants::GITHUB_ISSUER;
use crate::error::{AuthError, Result};
use crate::providers::ClaimsResolver;
use crate::state::{Claims, SubjectId};
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Mock claims resolver.
///
/// Resolves registered subjects only, unless built with
/// [`MockClaimsResolver::accept_all`].
#[derive(Debug, Clone, Default)]
pub struct MockClaimsResolver {
    known: Arc<Mutex<HashSet<SubjectId>>>,
    accept_all: bool,
}

impl MockClaimsResolver {
    /// Resolver with no known subjects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver that vouches for every subject.
    #[must_use]
    pub fn accept_all() -> Self {
        Self {
            accept_all: true,
            ..Self::default()
        }
    }

    /// Register an account for `subject`.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn register(&self, subject: SubjectId) -> Result<()> {
        self.known.lock().map_err(lock_failed)?.insert(subject);
        Ok(())
    }
}

impl ClaimsResolver for MockClaimsResolver {
    fn claims_for_subject(
        &self,
        subject: &SubjectId,
    ) -> impl Future<Output = Result<Claims>> + Send {
        let known = Arc::clone(&self.known);
        let accept_all = self.accept_all;
        let subject = subject.clone();

        async move {
            if !accept_all && !known.lock().map_err(lock_failed)?.contains(&subject) {
                return Err(AuthError::UnknownSubject {
                    subject: subject.0,
                });
            }
            Ok(Claims {
                subject,
                issuer: GITHUB_ISSUER.to_string(),
            })
        }
    }
}
