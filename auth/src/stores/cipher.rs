//! AES-256-GCM sealing of provider tokens at rest.
//!
//! Sealed form is `[nonce (12 bytes)][ciphertext]`, with a fresh nonce per
//! value. Shared by every session store that persists provider tokens.

use crate::error::{AuthError, Result};
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use std::sync::Arc;

const NONCE_LEN: usize = 12;

/// AES-256-GCM sealing of provider tokens.
#[derive(Clone)]
pub(crate) struct TokenCipher {
    cipher: Arc<Aes256Gcm>,
}

impl TokenCipher {
    pub(crate) fn new(key: &[u8]) -> Result<Self> {
        if key.len() != 32 {
            return Err(AuthError::Configuration(
                "Encryption key must be exactly 32 bytes (256 bits) for AES-256-GCM".to_string(),
            ));
        }
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| {
            AuthError::Configuration(format!("Failed to initialize AES-256-GCM cipher: {e}"))
        })?;
        Ok(Self {
            cipher: Arc::new(cipher),
        })
    }

    pub(crate) fn seal(&self, plaintext: &str) -> Result<Vec<u8>> {
        // Fresh nonce per field
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| AuthError::InternalError(format!("Encryption failed: {e}")))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    pub(crate) fn open(&self, sealed: &[u8]) -> Result<String> {
        if sealed.len() < NONCE_LEN {
            return Err(AuthError::SerializationError(
                "sealed token shorter than nonce".to_string(),
            ));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| AuthError::SerializationError(format!("Decryption failed: {e}")))?;
        String::from_utf8(plaintext).map_err(|e| AuthError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [7u8; 32];

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_cipher_round_trip() {
        let cipher = TokenCipher::new(&KEY).unwrap();
        let sealed = cipher.seal("gho_secret").unwrap();

        assert!(!sealed.windows(10).any(|w| w == b"gho_secret"));
        assert_eq!(cipher.open(&sealed).unwrap(), "gho_secret");
        // Random nonce per seal
        assert_ne!(sealed, cipher.seal("gho_secret").unwrap());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_cipher_rejects_tampering() {
        let cipher = TokenCipher::new(&KEY).unwrap();
        let mut sealed = cipher.seal("gho_secret").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;

        assert!(matches!(
            cipher.open(&sealed),
            Err(AuthError::SerializationError(_))
        ));
        assert!(cipher.open(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_cipher_key_length() {
        assert!(matches!(
            TokenCipher::new(&[0u8; 16]),
            Err(AuthError::Configuration(_))
        ));
    }
}
