//! Storage implementations for auth system.
//!
//! - **Session Store** (Redis) - Session records with encrypted provider tokens
//! - **Session Store** (PostgreSQL, feature `postgres`) - Durable session records,
//!   tokens encrypted the same way

mod cipher;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod session_redis;

// Re-exports
#[cfg(feature = "postgres")]
pub use postgres::PostgresSessionStore;
pub use session_redis::RedisSessionStore;
