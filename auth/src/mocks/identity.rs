//! Mock identity provider for testing.

use super::lock_failed;
use crate::error::{AuthError, Result};
use crate::providers::{CallbackRequest, IdentityProvider};
use crate::state::UserProfile;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock identity provider.
///
/// Exchanges any code for `mock_token_<code>` and returns the configured
/// profile for any token.
#[derive(Debug, Clone)]
pub struct MockIdentityProvider {
    profile: Arc<Mutex<UserProfile>>,
    fail_exchange: Arc<AtomicBool>,
    fail_user_info: Arc<AtomicBool>,
    exchanges: Arc<AtomicUsize>,
    user_info_calls: Arc<AtomicUsize>,
}

impl MockIdentityProvider {
    /// Provider returning `profile`.
    #[must_use]
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile: Arc::new(Mutex::new(profile)),
            fail_exchange: Arc::new(AtomicBool::new(false)),
            fail_user_info: Arc::new(AtomicBool::new(false)),
            exchanges: Arc::new(AtomicUsize::new(0)),
            user_info_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace the profile returned from now on.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn set_profile(&self, profile: UserProfile) -> Result<()> {
        *self.profile.lock().map_err(lock_failed)? = profile;
        Ok(())
    }

    /// Make code exchange fail.
    pub fn set_fail_exchange(&self, fail: bool) {
        self.fail_exchange.store(fail, Ordering::SeqCst);
    }

    /// Make profile fetches fail, simulating a provider outage.
    pub fn set_fail_user_info(&self, fail: bool) {
        self.fail_user_info.store(fail, Ordering::SeqCst);
    }

    /// Number of `exchange` calls.
    #[must_use]
    pub fn exchange_calls(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    /// Number of `fetch_user_info` calls.
    #[must_use]
    pub fn user_info_calls(&self) -> usize {
        self.user_info_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new(UserProfile::new("octocat"))
    }
}

impl IdentityProvider for MockIdentityProvider {
    fn authorization_url(
        &self,
        state: &str,
        redirect_uri: &str,
    ) -> impl Future<Output = Result<String>> + Send {
        let url = format!(
            "https://identity.test/authorize?state={state}&redirect_uri={redirect_uri}"
        );
        async move { Ok(url) }
    }

    fn exchange(&self, request: &CallbackRequest) -> impl Future<Output = Result<String>> + Send {
        let fail = self.fail_exchange.load(Ordering::SeqCst);
        let code = request.code.clone();
        self.exchanges.fetch_add(1, Ordering::SeqCst);

        async move {
            if fail {
                return Err(AuthError::ProviderExchangeFailed(
                    "bad_verification_code".to_string(),
                ));
            }
            Ok(format!("mock_token_{code}"))
        }
    }

    fn fetch_user_info(
        &self,
        _access_token: &str,
    ) -> impl Future<Output = Result<UserProfile>> + Send {
        let profile = Arc::clone(&self.profile);
        let fail = self.fail_user_info.load(Ordering::SeqCst);
        self.user_info_calls.fetch_add(1, Ordering::SeqCst);

        async move {
            if fail {
                return Err(AuthError::ProviderExchangeFailed(
                    "identity provider unavailable".to_string(),
                ));
            }
            let profile = profile.lock().map_err(lock_failed)?.clone();
            Ok(profile)
        }
    }
}
