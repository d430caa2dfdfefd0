//! PBX API error types.

use pbxpresence_domain::PresenceError;
use thiserror::Error;

/// Failures talking to the PBX OpenAPI.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PbxApiError {
    /// Token request rejected or unreachable.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The PBX answered with a non-zero `errcode`.
    #[error("PBX API error {code}: {message}")]
    Api { code: i64, message: String },

    /// Non-success HTTP status.
    #[error("HTTP {status} from {endpoint}")]
    Http { status: u16, endpoint: String },

    #[error("invalid PBX URL: {0}")]
    InvalidUrl(String),

    /// Body could not be decoded or lacked required fields.
    #[error("unexpected PBX response: {0}")]
    InvalidResponse(String),
}

impl From<PbxApiError> for PresenceError {
    fn from(err: PbxApiError) -> Self {
        match err {
            PbxApiError::Auth(message) => PresenceError::Authentication(message),
            PbxApiError::Api { code, message } => PresenceError::RemoteApi { code, message },
            PbxApiError::Http { status: 401 | 403, .. } => {
                PresenceError::Authentication(err.to_string())
            }
            PbxApiError::Http { .. } | PbxApiError::InvalidResponse(_) => {
                PresenceError::Transport(err.to_string())
            }
            PbxApiError::InvalidUrl(_) => PresenceError::Config(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_keep_code_and_message() {
        let err: PresenceError =
            PbxApiError::Api { code: 10002, message: "invalid id".into() }.into();
        assert_eq!(err, PresenceError::RemoteApi { code: 10002, message: "invalid id".into() });
    }

    #[test]
    fn unauthorized_status_is_an_authentication_error() {
        let err: PresenceError =
            PbxApiError::Http { status: 401, endpoint: "extension/search".into() }.into();
        assert!(matches!(err, PresenceError::Authentication(_)));

        let err: PresenceError =
            PbxApiError::Http { status: 502, endpoint: "extension/search".into() }.into();
        assert!(matches!(err, PresenceError::Transport(_)));
    }
}
