//! Server configuration from the environment.

use axum_extra::extract::cookie::Key;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

/// Minimum cookie signing key length accepted by [`Key`].
const MIN_COOKIE_KEY_LEN: usize = 64;

/// AES-256 key length for session token encryption.
const SESSION_KEY_LEN: usize = 32;

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A variable is set but unusable.
    #[error("{name}: {reason}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// HTTP server settings.
///
/// Authentication settings live in [`forge_auth::AuthConfig`]; this covers
/// what the binary needs around it.
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: SocketAddr,

    /// Redis connection URL for the session store.
    pub redis_url: String,

    /// Cookie signing key material, if configured.
    pub cookie_key: Option<Vec<u8>>,

    /// AES-256 key for provider tokens at rest.
    pub session_encryption_key: Vec<u8>,
}

impl ServerConfig {
    /// Load from the process environment.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `HOST` | `0.0.0.0` |
    /// | `PORT` | `3000` |
    /// | `REDIS_URL` | `redis://127.0.0.1:6379` |
    /// | `FORGE_COOKIE_KEY` | random per process (base64, ≥ 64 bytes) |
    /// | `FORGE_SESSION_ENCRYPTION_KEY` | required (base64, 32 bytes) |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host: IpAddr = lookup("HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string())
            .parse()
            .map_err(|e| ConfigError::Invalid {
                name: "HOST",
                reason: format!("{e}"),
            })?;
        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: format!("{e}"),
            })?;

        let cookie_key = lookup("FORGE_COOKIE_KEY")
            .map(|value| decode_key("FORGE_COOKIE_KEY", &value))
            .transpose()?;
        if let Some(key) = &cookie_key {
            if key.len() < MIN_COOKIE_KEY_LEN {
                return Err(ConfigError::Invalid {
                    name: "FORGE_COOKIE_KEY",
                    reason: format!("must be at least {MIN_COOKIE_KEY_LEN} bytes"),
                });
            }
        }

        let session_encryption_key = lookup("FORGE_SESSION_ENCRYPTION_KEY")
            .ok_or(ConfigError::Missing("FORGE_SESSION_ENCRYPTION_KEY"))
            .and_then(|value| decode_key("FORGE_SESSION_ENCRYPTION_KEY", &value))?;
        if session_encryption_key.len() != SESSION_KEY_LEN {
            return Err(ConfigError::Invalid {
                name: "FORGE_SESSION_ENCRYPTION_KEY",
                reason: format!("must be exactly {SESSION_KEY_LEN} bytes"),
            });
        }

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            redis_url: lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            cookie_key,
            session_encryption_key,
        })
    }

    /// Cookie signing key.
    ///
    /// Falls back to a random key when none is configured, which logs
    /// everyone out on restart.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configured key is rejected.
    pub fn cookie_key(&self) -> Result<Key, ConfigError> {
        match &self.cookie_key {
            Some(bytes) => Key::try_from(bytes.as_slice()).map_err(|e| ConfigError::Invalid {
                name: "FORGE_COOKIE_KEY",
                reason: e.to_string(),
            }),
            None => {
                tracing::warn!("FORGE_COOKIE_KEY not set, using a random cookie key");
                Ok(Key::generate())
            }
        }
    }
}

fn decode_key(name: &'static str, value: &str) -> Result<Vec<u8>, ConfigError> {
    STANDARD.decode(value.trim()).map_err(|e| ConfigError::Invalid {
        name,
        reason: format!("invalid base64: {e}"),
    })
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("redis_url", &self.redis_url)
            .field("cookie_key", &self.cookie_key.as_ref().map(|_| "[REDACTED]"))
            .field("session_encryption_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn session_key() -> String {
        STANDARD.encode([9u8; SESSION_KEY_LEN])
    }

    #[test]
    fn test_defaults() {
        let key = session_key();
        let config =
            ServerConfig::from_lookup(lookup(&[("FORGE_SESSION_ENCRYPTION_KEY", &key)])).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert!(config.cookie_key.is_none());
        assert_eq!(config.session_encryption_key, vec![9u8; SESSION_KEY_LEN]);
    }

    #[test]
    fn test_overrides() {
        let key = session_key();
        let cookie = STANDARD.encode([3u8; MIN_COOKIE_KEY_LEN]);
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("REDIS_URL", "redis://cache:6379"),
            ("FORGE_COOKIE_KEY", &cookie),
            ("FORGE_SESSION_ENCRYPTION_KEY", &key),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.redis_url, "redis://cache:6379");
        assert!(config.cookie_key().is_ok());
    }

    #[test]
    fn test_session_key_required() {
        assert_eq!(
            ServerConfig::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::Missing("FORGE_SESSION_ENCRYPTION_KEY")
        );
    }

    #[test]
    fn test_rejects_bad_keys() {
        let short = STANDARD.encode([1u8; 16]);
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("FORGE_SESSION_ENCRYPTION_KEY", &short)])),
            Err(ConfigError::Invalid { name: "FORGE_SESSION_ENCRYPTION_KEY", .. })
        ));

        let key = session_key();
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[
                ("FORGE_SESSION_ENCRYPTION_KEY", &key),
                ("FORGE_COOKIE_KEY", "c2hvcnQ="),
            ])),
            Err(ConfigError::Invalid { name: "FORGE_COOKIE_KEY", .. })
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("FORGE_SESSION_ENCRYPTION_KEY", "%%%")])),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let key = session_key();
        let config =
            ServerConfig::from_lookup(lookup(&[("FORGE_SESSION_ENCRYPTION_KEY", &key)])).unwrap();
        assert!(!format!("{config:?}").contains(&key));
    }
}
