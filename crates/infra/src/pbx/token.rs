//! Access-token lifecycle.

use chrono::{DateTime, Duration, Utc};
use pbxpresence_domain::constants::TOKEN_REFRESH_WINDOW_SECS;
use serde::{Deserialize, Serialize};

/// Where the cached access token stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    /// Nothing cached; the next call authenticates.
    NoToken,
    Valid,
    /// Inside the refresh window; the next call re-authenticates first.
    Expiring,
    /// The last authentication attempt failed.
    Invalid,
}

impl TokenState {
    /// Classify a cached token at `now`. Never returns [`TokenState::Invalid`];
    /// that state only results from a failed authentication.
    pub fn evaluate(
        token: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        match (token.filter(|t| !t.is_empty()), expires_at) {
            (Some(_), Some(expires_at)) => {
                if now + Duration::seconds(TOKEN_REFRESH_WINDOW_SECS) >= expires_at {
                    Self::Expiring
                } else {
                    Self::Valid
                }
            }
            _ => Self::NoToken,
        }
    }

    pub fn needs_authentication(self) -> bool {
        !matches!(self, Self::Valid)
    }
}
