//! Application constants
//!
//! Centralized location for all domain-level defaults used throughout the
//! application.

// PBX client
pub const DEFAULT_REQUEST_SPACING_MS: u64 = 2_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const TOKEN_REFRESH_WINDOW_SECS: i64 = 300;
pub const PBX_USER_AGENT: &str = "OpenAPI";
pub const PBX_API_PREFIX: &str = "openapi/v1.0";

// Reconciliation
pub const DEFAULT_SYNC_INTERVAL_MINUTES: u64 = 5;
pub const DEFAULT_CHANGE_DELAY_MS: u64 = 500;
pub const DISCOVERY_PAUSE_EVERY: usize = 10;
pub const DEFAULT_DISCOVERY_PAUSE_MS: u64 = 1_000;

// Schedule resolution
pub const DEFAULT_TIMEZONE: &str = "Europe/Paris";
pub const DEFAULT_STATUS: &str = "available";

// Calendar resync
pub const CALENDAR_LOOKAHEAD_DAYS: i64 = 30;

// Storage
pub const DEFAULT_DATABASE_PATH: &str = "pbxpresence.db";
pub const DEFAULT_POOL_SIZE: u32 = 4;
pub const DEFAULT_SECRET_KEY_PATH: &str = "instance/secret.key";
