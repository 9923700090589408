//! Session store trait.

use crate::error::Result;
use crate::state::{SessionId, SessionRecord};

/// Session store.
///
/// Persistent mapping from [`SessionId`] to [`SessionRecord`].
///
/// # Implementation Notes
///
/// - Single-key upserts must be atomic; last writer wins.
/// - Concurrent refreshes of one session may both write. Both writes carry
///   an extended expiry, so either result is acceptable.
pub trait SessionStore: Send + Sync {
    /// Read a session.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No record exists → `AuthError::SessionNotFound`
    /// - The store cannot be reached → `AuthError::StoreUnavailable`
    fn read_session(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<SessionRecord>> + Send;

    /// Insert a session, or replace the record with the same id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::StoreUnavailable` if the write fails.
    fn insert_or_update_session(
        &self,
        session: &SessionRecord,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Delete a session. Deleting a missing session succeeds.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::StoreUnavailable` if the delete fails.
    fn clear_session(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
