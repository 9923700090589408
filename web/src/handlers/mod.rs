//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by domain.

pub mod account;
pub mod auth;
pub mod health;

// Re-export common handler utilities
pub use health::health_check;
