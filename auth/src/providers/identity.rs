//! Identity provider trait.

use crate::error::Result;
use crate::state::UserProfile;

/// Authorization code returned to the callback path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackRequest {
    /// Authorization code.
    pub code: String,

    /// Redirect URI that was sent with the authorization request. Providers
    /// require it to match on exchange.
    pub redirect_uri: String,
}

/// OAuth identity provider.
///
/// # Implementation Notes
///
/// - `exchange` is not retried: a code can only be redeemed once.
/// - `fetch_user_info` doubles as renewal when the provider issues no
///   separate refresh grant.
pub trait IdentityProvider: Send + Sync {
    /// Build the URL of the provider's consent screen.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the URL cannot be built.
    fn authorization_url(
        &self,
        state: &str,
        redirect_uri: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Exchange an authorization code for a provider access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ProviderExchangeFailed` if the provider rejects
    /// the code or cannot be reached.
    fn exchange(
        &self,
        request: &CallbackRequest,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Fetch the profile of the user owning `access_token`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ProviderExchangeFailed` if the request fails.
    fn fetch_user_info(
        &self,
        access_token: &str,
    ) -> impl std::future::Future<Output = Result<UserProfile>> + Send;
}
