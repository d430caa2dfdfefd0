//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for presence synchronisation
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum PresenceError {
    /// PBX URL, client id or client secret is not configured.
    #[error("PBX configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The PBX answered with a non-zero `errcode`.
    #[error("PBX API error {code}: {message}")]
    RemoteApi { code: i64, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Extension processing error: {0}")]
    ExtensionProcessing(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Security error: {0}")]
    Security(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PresenceError {
    /// Failure of a single remote call (auth, API or transport).
    ///
    /// Callers treat these identically: the operation failed and the message
    /// is recorded, nothing else is retried.
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::RemoteApi { .. } | Self::Transport(_))
    }
}

/// Result type alias for presence operations
pub type Result<T> = std::result::Result<T, PresenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_failures_are_classified() {
        assert!(PresenceError::Transport("timeout".into()).is_remote_failure());
        assert!(PresenceError::Authentication("bad creds".into()).is_remote_failure());
        assert!(PresenceError::RemoteApi { code: 10004, message: "x".into() }.is_remote_failure());
        assert!(!PresenceError::Database("locked".into()).is_remote_failure());
        assert!(!PresenceError::ConfigurationMissing("url".into()).is_remote_failure());
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(PresenceError::NotFound("extension 4".into())).unwrap();
        assert_eq!(json["type"], "NotFound");
        assert_eq!(json["message"], "extension 4");
    }

    #[test]
    fn remote_api_error_displays_code() {
        let err = PresenceError::RemoteApi { code: 40002, message: "invalid id".into() };
        assert_eq!(err.to_string(), "PBX API error 40002: invalid id");
    }
}
