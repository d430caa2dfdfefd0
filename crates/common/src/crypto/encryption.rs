//! AES-256-GCM encryption primitives.
//!
//! Payloads are encoded as `base64(nonce || ciphertext)` so they can be stored
//! in a single text column.
//!
//! ```rust
//! use pbxpresence_common::crypto::EncryptionService;
//!
//! let key = EncryptionService::generate_key();
//! let service = EncryptionService::new(key)?;
//!
//! let encrypted = service.encrypt_to_string(b"client-secret")?;
//! let decrypted = service.decrypt_from_string(&encrypted)?;
//! assert_eq!(decrypted, b"client-secret");
//! # Ok::<(), pbxpresence_common::error::CommonError>(())
//! ```

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CommonError, CommonResult};

/// Length of the AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Length of the GCM nonce prepended to every payload.
pub const NONCE_LEN: usize = 12;

/// AES-GCM encryption service keyed with a raw 32-byte key.
pub struct EncryptionService {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService").field("key", &"[REDACTED]").finish()
    }
}

impl EncryptionService {
    /// Create a new encryption service from a raw 32-byte key.
    pub fn new(key: Vec<u8>) -> CommonResult<Self> {
        if key.len() != KEY_LEN {
            return Err(CommonError::crypto("Encryption key must be exactly 32 bytes"));
        }

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| CommonError::crypto(format!("Failed to create encryption cipher: {e}")))?;

        Ok(Self { cipher })
    }

    /// Create a service from a base64-encoded key.
    pub fn from_base64_key(encoded: &str) -> CommonResult<Self> {
        let key = BASE64
            .decode(encoded.trim())
            .map_err(|e| CommonError::serialization(format!("Invalid key encoding: {e}")))?;
        Self::new(key)
    }

    /// Generate a random 32-byte symmetric key.
    pub fn generate_key() -> Vec<u8> {
        let mut key = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Generate a random key and return it base64-encoded.
    pub fn generate_base64_key() -> String {
        BASE64.encode(Self::generate_key())
    }

    /// Encrypt bytes, returning `nonce || ciphertext`.
    pub fn encrypt(&self, data: &[u8]) -> CommonResult<Vec<u8>> {
        let nonce_bytes = Self::generate_nonce();
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), data)
            .map_err(|e| CommonError::crypto(format!("Encryption failed: {e}")))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&ciphertext);
        Ok(payload)
    }

    /// Decrypt a `nonce || ciphertext` payload back into raw bytes.
    pub fn decrypt(&self, payload: &[u8]) -> CommonResult<Vec<u8>> {
        if payload.len() <= NONCE_LEN {
            return Err(CommonError::crypto("Encrypted payload is too short"));
        }

        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| CommonError::crypto(format!("Decryption failed: {e}")))
    }

    /// Encrypt bytes and encode the payload as a base64 string.
    pub fn encrypt_to_string(&self, data: &[u8]) -> CommonResult<String> {
        Ok(BASE64.encode(self.encrypt(data)?))
    }

    /// Decode a base64 string and decrypt the contained payload.
    pub fn decrypt_from_string(&self, encrypted: &str) -> CommonResult<Vec<u8>> {
        let decoded = BASE64
            .decode(encrypted.trim())
            .map_err(|e| CommonError::serialization(format!("Base64 decode failed: {e}")))?;
        self.decrypt(&decoded)
    }

    fn generate_nonce() -> [u8; NONCE_LEN] {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        nonce
    }
}
