//! PostgreSQL storage implementations.
//!
//! Durable session storage for deployments that already run PostgreSQL.

pub mod session;

// Re-exports
pub use session::PostgresSessionStore;
