//! Mock session store for testing.

use super::lock_failed;
use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::state::{SessionId, SessionRecord};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock session store.
///
/// Uses in-memory storage. Reads, writes and deletes can each be switched
/// to fail with `StoreUnavailable`, and every call is counted, including
/// failed ones.
#[derive(Debug, Clone, Default)]
pub struct MockSessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, SessionRecord>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    fail_clears: Arc<AtomicBool>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    clears: Arc<AtomicUsize>,
}

impl MockSessionStore {
    /// Create a new mock session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get count of stored sessions (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn session_count(&self) -> Result<usize> {
        Ok(self.sessions.lock().map_err(lock_failed)?.len())
    }

    /// Get a stored session without counting a read (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn snapshot(&self, session_id: &SessionId) -> Result<Option<SessionRecord>> {
        Ok(self
            .sessions
            .lock()
            .map_err(lock_failed)?
            .get(session_id)
            .cloned())
    }

    /// Make reads fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make inserts and updates fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make deletes fail.
    pub fn set_fail_clears(&self, fail: bool) {
        self.fail_clears.store(fail, Ordering::SeqCst);
    }

    /// Number of `read_session` calls.
    #[must_use]
    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `insert_or_update_session` calls.
    #[must_use]
    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of `clear_session` calls.
    #[must_use]
    pub fn clear_calls(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    /// Total number of store calls.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.read_calls() + self.write_calls() + self.clear_calls()
    }
}

fn unavailable() -> AuthError {
    AuthError::StoreUnavailable("mock store offline".to_string())
}

impl SessionStore for MockSessionStore {
    fn read_session(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<SessionRecord>> + Send {
        let sessions = Arc::clone(&self.sessions);
        let fail = self.fail_reads.load(Ordering::SeqCst);
        let session_id = *session_id;
        self.reads.fetch_add(1, Ordering::SeqCst);

        async move {
            if fail {
                return Err(unavailable());
            }
            let sessions_guard = sessions.lock().map_err(lock_failed)?;
            sessions_guard
                .get(&session_id)
                .cloned()
                .ok_or(AuthError::SessionNotFound)
        }
    }

    fn insert_or_update_session(
        &self,
        session: &SessionRecord,
    ) -> impl Future<Output = Result<()>> + Send {
        let sessions = Arc::clone(&self.sessions);
        let fail = self.fail_writes.load(Ordering::SeqCst);
        let session = session.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);

        async move {
            if fail {
                return Err(unavailable());
            }
            let mut sessions_guard = sessions.lock().map_err(lock_failed)?;
            sessions_guard.insert(session.session_id, session);
            Ok(())
        }
    }

    fn clear_session(&self, session_id: &SessionId) -> impl Future<Output = Result<()>> + Send {
        let sessions = Arc::clone(&self.sessions);
        let fail = self.fail_clears.load(Ordering::SeqCst);
        let session_id = *session_id;
        self.clears.fetch_add(1, Ordering::SeqCst);

        async move {
            if fail {
                return Err(unavailable());
            }
            let mut sessions_guard = sessions.lock().map_err(lock_failed)?;
            sessions_guard.remove(&session_id);
            Ok(())
        }
    }
}
