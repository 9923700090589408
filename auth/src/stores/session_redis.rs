//! Redis-based session store implementation.
//!
//! # Architecture
//!
//! Sessions are stored in Redis with:
//! - **Primary key**: `session:{session_id}` → bincode-serialized record
//! - **Tokens**: provider access and refresh tokens encrypted with AES-256-GCM,
//!   stored as `[nonce (12 bytes)][ciphertext]`
//! - **TTL**: time until the login token expires plus a refresh grace period,
//!   so an expired token can still find its session and renew
//!
//! # Example
//!
//! ```no_run
//! use forge_auth::stores::RedisSessionStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let encryption_key = vec![0u8; 32]; // Replace with actual secure key!
//! let store = RedisSessionStore::new("redis://127.0.0.1:6379", encryption_key).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::state::{SessionId, SessionRecord, SubjectId};
use crate::stores::cipher::TokenCipher;
use chrono::{DateTime, Duration, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};

/// Session as stored in Redis.
#[derive(Serialize, Deserialize)]
struct StoredSession {
    session_id: SessionId,
    subject_id: SubjectId,
    access_token: Vec<u8>,
    refresh_token: Vec<u8>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

/// Redis-based session store with encrypted tokens.
///
/// Provides:
/// - Session storage with automatic expiration
/// - AES-256-GCM encryption of provider tokens at rest
/// - Connection pooling via `ConnectionManager`
#[derive(Clone)]
pub struct RedisSessionStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
    cipher: TokenCipher,
    refresh_grace: Duration,
}

impl RedisSessionStore {
    /// Create a new Redis session store.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    /// * `encryption_key` - 32-byte AES-256 key for provider tokens
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Encryption key is not 32 bytes
    /// - Connection to Redis fails
    pub async fn new(redis_url: &str, encryption_key: Vec<u8>) -> Result<Self> {
        let cipher = TokenCipher::new(&encryption_key)?;

        let client = Client::open(redis_url).map_err(|e| {
            AuthError::Configuration(format!("Failed to create Redis client: {e}"))
        })?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            AuthError::StoreUnavailable(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self {
            conn_manager,
            cipher,
            refresh_grace: Duration::days(30),
        })
    }

    /// Keep sessions this long past token expiry.
    ///
    /// Default: 30 days
    #[must_use]
    pub const fn with_refresh_grace(mut self, grace: Duration) -> Self {
        self.refresh_grace = grace;
        self
    }

    /// Get the Redis key for a session.
    fn session_key(session_id: &SessionId) -> String {
        format!("session:{}", session_id.0)
    }

    fn ttl_seconds(&self, expires_at: DateTime<Utc>) -> u64 {
        let ttl = (expires_at - Utc::now() + self.refresh_grace).num_seconds();
        u64::try_from(ttl).unwrap_or(0).max(1)
    }

    fn seal(&self, session: &SessionRecord) -> Result<Vec<u8>> {
        let stored = StoredSession {
            session_id: session.session_id,
            subject_id: session.subject_id.clone(),
            access_token: self.cipher.seal(&session.access_token)?,
            refresh_token: self.cipher.seal(&session.refresh_token)?,
            expires_at: session.expires_at,
            created_at: session.created_at,
        };
        bincode::serialize(&stored).map_err(|e| AuthError::SerializationError(e.to_string()))
    }

    fn open(&self, bytes: &[u8]) -> Result<SessionRecord> {
        let stored: StoredSession =
            bincode::deserialize(bytes).map_err(|e| AuthError::SerializationError(e.to_string()))?;
        Ok(SessionRecord {
            session_id: stored.session_id,
            subject_id: stored.subject_id,
            access_token: self.cipher.open(&stored.access_token)?,
            refresh_token: self.cipher.open(&stored.refresh_token)?,
            expires_at: stored.expires_at,
            created_at: stored.created_at,
        })
    }
}

impl SessionStore for RedisSessionStore {
    async fn read_session(&self, session_id: &SessionId) -> Result<SessionRecord> {
        let mut conn = self.conn_manager.clone();
        let session_key = Self::session_key(session_id);

        let session_bytes: Option<Vec<u8>> = conn.get(&session_key).await.map_err(|e| {
            AuthError::StoreUnavailable(format!("Failed to get session from Redis: {e}"))
        })?;

        match session_bytes {
            Some(bytes) => self.open(&bytes),
            None => Err(AuthError::SessionNotFound),
        }
    }

    async fn insert_or_update_session(&self, session: &SessionRecord) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let session_key = Self::session_key(&session.session_id);
        let session_bytes = self.seal(session)?;
        let ttl_seconds = self.ttl_seconds(session.expires_at);

        let _: () = conn
            .set_ex(&session_key, session_bytes, ttl_seconds)
            .await
            .map_err(|e| AuthError::StoreUnavailable(format!("Failed to store session: {e}")))?;

        tracing::debug!(
            session_id = %session.session_id,
            subject = %session.subject_id,
            ttl_seconds = ttl_seconds,
            "Stored session in Redis"
        );

        Ok(())
    }

    async fn clear_session(&self, session_id: &SessionId) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let session_key = Self::session_key(session_id);

        let _: () = conn
            .del(&session_key)
            .await
            .map_err(|e| AuthError::StoreUnavailable(format!("Failed to delete session: {e}")))?;

        tracing::debug!(session_id = %session_id, "Deleted session from Redis");
        Ok(())
    }
}
