//! AES-256-GCM implementation of the `SecretCipher` port.
//!
//! The key is 32 random bytes kept base64-encoded in a key file next to the
//! database. The file is created on first use.

use std::fs;
use std::path::Path;

use pbxpresence_common::EncryptionService;
use pbxpresence_core::SecretCipher;
use pbxpresence_domain::{PresenceError, Result};
use tracing::info;

use crate::errors::InfraError;

/// `SecretCipher` backed by [`EncryptionService`].
#[derive(Debug)]
pub struct AesSecretCipher {
    service: EncryptionService,
}

impl AesSecretCipher {
    pub fn new(service: EncryptionService) -> Self {
        Self { service }
    }

    /// Load the key at `path`, generating and persisting a new one when the
    /// file does not exist yet.
    pub fn from_key_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let encoded = if path.exists() {
            fs::read_to_string(path).map_err(|err| {
                PresenceError::Security(format!(
                    "failed to read key file {}: {err}",
                    path.display()
                ))
            })?
        } else {
            let key = EncryptionService::generate_base64_key();
            write_key_file(path, &key)?;
            info!(key_path = %path.display(), "generated new secret key");
            key
        };

        let service = EncryptionService::from_base64_key(encoded.trim())
            .map_err(|err| PresenceError::from(InfraError::from(err)))?;
        Ok(Self::new(service))
    }
}

fn write_key_file(path: &Path, key: &str) -> Result<()> {
    let io_err = |err: std::io::Error| {
        PresenceError::Security(format!("failed to write key file {}: {err}", path.display()))
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, key).map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(io_err)?;
    }

    Ok(())
}

impl SecretCipher for AesSecretCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        self.service
            .encrypt_to_string(plaintext.as_bytes())
            .map_err(|err| PresenceError::from(InfraError::from(err)))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let bytes = self
            .service
            .decrypt_from_string(ciphertext)
            .map_err(|err| PresenceError::from(InfraError::from(err)))?;
        String::from_utf8(bytes)
            .map_err(|_| PresenceError::Security("decrypted secret is not valid UTF-8".into()))
    }
}
