//! Secret protection for values stored in the settings row.

pub mod secret_cipher;

pub use secret_cipher::AesSecretCipher;
