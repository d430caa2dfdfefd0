//! Symmetric encryption primitives used to protect secrets at rest.

pub mod encryption;

pub use encryption::EncryptionService;
