//! Common error types shared by the utility modules in this crate.
//!
//! Domain code does not surface `CommonError` directly; callers map it into
//! their own error enums at the crate boundary.

use thiserror::Error;

/// Errors raised by the shared utilities.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Invalid configuration handed to a utility constructor.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Encryption or decryption failed.
    #[error("Crypto error: {message}")]
    Crypto { message: String },

    /// Encoding/decoding of a serialized payload failed.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Invariant violation inside a utility.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CommonError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto { message: message.into() }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }
}

/// Result alias for the shared utilities.
pub type CommonResult<T> = Result<T, CommonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_render_messages() {
        assert_eq!(CommonError::config("bad").to_string(), "Configuration error: bad");
        assert_eq!(CommonError::crypto("tag").to_string(), "Crypto error: tag");
        assert_eq!(
            CommonError::serialization("b64").to_string(),
            "Serialization error: b64"
        );
    }
}
