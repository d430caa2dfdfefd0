//! Configuration structures
//!
//! Loading (files, environment overrides) lives in the infra crate; this
//! module only defines the shape, defaults and validation.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CHANGE_DELAY_MS, DEFAULT_DATABASE_PATH, DEFAULT_DISCOVERY_PAUSE_MS, DEFAULT_POOL_SIZE,
    DEFAULT_REQUEST_SPACING_MS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SECRET_KEY_PATH,
    DEFAULT_STATUS, DEFAULT_SYNC_INTERVAL_MINUTES, DEFAULT_TIMEZONE, DISCOVERY_PAUSE_EVERY,
};
use crate::errors::{PresenceError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub pbx: PbxConfig,
    pub schedule: ScheduleConfig,
    pub sync: SyncConfig,
    pub security: SecurityConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// PBX connection settings used to seed the settings row on first start.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PbxConfig {
    pub url: Option<String>,
    pub client_id: Option<String>,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    pub request_timeout_secs: u64,
    pub request_spacing_ms: u64,
    pub accept_invalid_certs: bool,
}

/// Schedule resolution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// IANA timezone used for wall-clock comparisons.
    pub timezone: String,
    pub default_status: String,
}

/// Sync configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub interval_minutes: u64,
    pub change_delay_ms: u64,
    pub discovery_pause_every: usize,
    pub discovery_pause_ms: u64,
    pub enabled: bool,
}

/// Secret storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub secret_key_path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: DEFAULT_DATABASE_PATH.to_string(), pool_size: DEFAULT_POOL_SIZE }
    }
}

impl Default for PbxConfig {
    fn default() -> Self {
        Self {
            url: None,
            client_id: None,
            client_secret: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            request_spacing_ms: DEFAULT_REQUEST_SPACING_MS,
            // PBX appliances ship with self-signed certificates.
            accept_invalid_certs: true,
        }
    }
}

impl std::fmt::Debug for PbxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PbxConfig")
            .field("url", &self.url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("request_spacing_ms", &self.request_spacing_ms)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { timezone: DEFAULT_TIMEZONE.to_string(), default_status: DEFAULT_STATUS.to_string() }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_SYNC_INTERVAL_MINUTES,
            change_delay_ms: DEFAULT_CHANGE_DELAY_MS,
            discovery_pause_every: DISCOVERY_PAUSE_EVERY,
            discovery_pause_ms: DEFAULT_DISCOVERY_PAUSE_MS,
            enabled: true,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self { secret_key_path: DEFAULT_SECRET_KEY_PATH.to_string() }
    }
}

impl PbxConfig {
    /// True when url, client id and secret are all present and non-blank.
    pub fn is_complete(&self) -> bool {
        [&self.url, &self.client_id, &self.client_secret]
            .iter()
            .all(|value| value.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

impl ScheduleConfig {
    /// Parsed timezone.
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| PresenceError::Config(format!("unknown timezone '{}'", self.timezone)))
    }
}

impl AppConfig {
    /// Reject values that would make the service misbehave at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(PresenceError::Config("database.path must not be empty".into()));
        }
        if self.database.pool_size == 0 {
            return Err(PresenceError::Config("database.pool_size must be at least 1".into()));
        }
        if self.pbx.request_timeout_secs == 0 {
            return Err(PresenceError::Config(
                "pbx.request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.sync.interval_minutes == 0 {
            return Err(PresenceError::Config("sync.interval_minutes must be at least 1".into()));
        }
        if self.sync.discovery_pause_every == 0 {
            return Err(PresenceError::Config(
                "sync.discovery_pause_every must be at least 1".into(),
            ));
        }
        if self.schedule.default_status.trim().is_empty() {
            return Err(PresenceError::Config("schedule.default_status must not be empty".into()));
        }
        if let Some(url) = &self.pbx.url {
            if !url.trim().is_empty()
                && !(url.starts_with("http://") || url.starts_with("https://"))
            {
                return Err(PresenceError::Config(format!(
                    "pbx.url must start with http:// or https:// (got '{url}')"
                )));
            }
        }
        self.schedule.tz()?;
        Ok(())
    }
}
