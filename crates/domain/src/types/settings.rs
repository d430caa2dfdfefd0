//! Singleton settings row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PresenceStatus;

/// PBX connection and sync settings plus the cached access token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSettings {
    pub pbx_url: Option<String>,
    pub client_id: Option<String>,
    /// Ciphertext produced by the secret cipher; never the plain secret.
    pub client_secret_encrypted: Option<String>,
    pub default_status: PresenceStatus,
    pub sync_interval_minutes: u64,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SystemSettings {
    /// URL, client id and secret are all present.
    pub fn has_credentials(&self) -> bool {
        [&self.pbx_url, &self.client_id, &self.client_secret_encrypted]
            .iter()
            .all(|value| value.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    /// Names of the missing credential fields, for error messages.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let blank = |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());
        if blank(&self.pbx_url) {
            missing.push("pbx_url");
        }
        if blank(&self.client_id) {
            missing.push("client_id");
        }
        if blank(&self.client_secret_encrypted) {
            missing.push("client_secret");
        }
        missing
    }
}

impl std::fmt::Debug for SystemSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemSettings")
            .field("pbx_url", &self.pbx_url)
            .field("client_id", &self.client_id)
            .field("client_secret_encrypted", &self.client_secret_encrypted.is_some())
            .field("default_status", &self.default_status)
            .field("sync_interval_minutes", &self.sync_interval_minutes)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_expires_at", &self.token_expires_at)
            .finish()
    }
}
