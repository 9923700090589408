//! PostgreSQL session store implementation.
//!
//! # Example
//!
//! ```no_run
//! use forge_auth::stores::postgres::PostgresSessionStore;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/forge").await?;
//! let encryption_key = vec![0u8; 32]; // Replace with actual secure key!
//! let store = PostgresSessionStore::new(pool, &encryption_key)?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::state::{SessionId, SessionRecord, SubjectId};
use crate::stores::cipher::TokenCipher;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// PostgreSQL session store.
///
/// Provider tokens are sealed with AES-256-GCM before they reach the
/// database, as in the Redis store.
#[derive(Clone)]
pub struct PostgresSessionStore {
    /// PostgreSQL connection pool.
    pool: PgPool,
    cipher: TokenCipher,
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: uuid::Uuid,
    subject_id: String,
    access_token: Vec<u8>,
    refresh_token: Vec<u8>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl PostgresSessionStore {
    /// Create a new PostgreSQL session store.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    /// * `encryption_key` - 32-byte AES-256 key for provider tokens
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the key is not 32 bytes.
    pub fn new(pool: PgPool, encryption_key: &[u8]) -> Result<Self> {
        Ok(Self {
            pool,
            cipher: TokenCipher::new(encryption_key)?,
        })
    }

    fn open(&self, row: SessionRow) -> Result<SessionRecord> {
        Ok(SessionRecord {
            session_id: SessionId(row.session_id),
            subject_id: SubjectId(row.subject_id),
            access_token: self.cipher.open(&row.access_token)?,
            refresh_token: self.cipher.open(&row.refresh_token)?,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AuthError::StoreUnavailable(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

impl SessionStore for PostgresSessionStore {
    async fn read_session(&self, session_id: &SessionId) -> Result<SessionRecord> {
        let row = sqlx::query_as::<_, SessionRow>(
            r"
            SELECT session_id, subject_id, access_token, refresh_token, expires_at, created_at
            FROM sessions
            WHERE session_id = $1
            ",
        )
        .bind(session_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::StoreUnavailable(format!("Failed to read session: {e}")))?
        .ok_or(AuthError::SessionNotFound)?;
        self.open(row)
    }

    async fn insert_or_update_session(&self, session: &SessionRecord) -> Result<()> {
        let access_token = self.cipher.seal(&session.access_token)?;
        let refresh_token = self.cipher.seal(&session.refresh_token)?;
        sqlx::query(
            r"
            INSERT INTO sessions
                (session_id, subject_id, access_token, refresh_token, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (session_id) DO UPDATE SET
                subject_id = EXCLUDED.subject_id,
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                expires_at = EXCLUDED.expires_at
            ",
        )
        .bind(session.session_id.0)
        .bind(session.subject_id.as_str())
        .bind(access_token)
        .bind(refresh_token)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::StoreUnavailable(format!("Failed to store session: {e}")))?;

        tracing::debug!(
            session_id = %session.session_id,
            subject = %session.subject_id,
            "Stored session in PostgreSQL"
        );
        Ok(())
    }

    async fn clear_session(&self, session_id: &SessionId) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE session_id = $1")
            .bind(session_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::StoreUnavailable(format!("Failed to delete session: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    // Requires PostgreSQL: DATABASE_URL=postgresql://localhost/forge_test

    #[tokio::test]
    #[ignore] // Requires PostgreSQL running
    #[allow(clippy::unwrap_used, clippy::expect_used)]
    async fn test_postgres_session_lifecycle() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let pool = PgPool::connect(&url).await.unwrap();
        let store = PostgresSessionStore::new(pool.clone(), &[7u8; 32]).unwrap();
        store.migrate().await.unwrap();

        let now = DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap();
        let mut session = SessionRecord {
            session_id: SessionId::new(),
            subject_id: SubjectId::for_login("https://github.com", "alice"),
            access_token: "gho_access".to_string(),
            refresh_token: "gho_access".to_string(),
            expires_at: now + Duration::hours(1),
            created_at: now,
        };

        store.insert_or_update_session(&session).await.unwrap();
        assert_eq!(store.read_session(&session.session_id).await.unwrap(), session);

        let (raw,): (Vec<u8>,) =
            sqlx::query_as("SELECT access_token FROM sessions WHERE session_id = $1")
                .bind(session.session_id.0)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(!raw.windows(10).any(|w| w == b"gho_access"));

        session.expires_at += Duration::days(365);
        store.insert_or_update_session(&session).await.unwrap();
        assert_eq!(
            store.read_session(&session.session_id).await.unwrap().expires_at,
            session.expires_at
        );

        store.clear_session(&session.session_id).await.unwrap();
        assert_eq!(
            store.read_session(&session.session_id).await,
            Err(AuthError::SessionNotFound)
        );
    }
}
