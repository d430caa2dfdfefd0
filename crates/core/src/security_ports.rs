//! Port for protecting secrets at rest.

use pbxpresence_domain::Result;

/// Opaque encrypt/decrypt capability for the PBX client secret.
pub trait SecretCipher: Send + Sync {
    /// Encrypt a plaintext secret into a storable string.
    fn encrypt(&self, plaintext: &str) -> Result<String>;

    /// Decrypt a string produced by [`SecretCipher::encrypt`].
    fn decrypt(&self, ciphertext: &str) -> Result<String>;
}
