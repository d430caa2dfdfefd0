//! The SQLite-backed store implementing every persistence port.
//!
//! One struct implements all repository traits; each trait lives in its own
//! module. Every method checks a connection out of the shared pool, so the
//! store is cheap to share behind an `Arc`.

use std::sync::Arc;

use pbxpresence_domain::constants::{DEFAULT_STATUS, DEFAULT_SYNC_INTERVAL_MINUTES};
use pbxpresence_domain::{PresenceStatus, Result};

use super::manager::{DbConnection, DbManager};

/// Values used when the settings row is created lazily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsDefaults {
    pub default_status: PresenceStatus,
    pub sync_interval_minutes: u64,
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            default_status: PresenceStatus::from(DEFAULT_STATUS),
            sync_interval_minutes: DEFAULT_SYNC_INTERVAL_MINUTES,
        }
    }
}

/// SQLite implementation of the store ports.
#[derive(Clone)]
pub struct SqlitePresenceStore {
    db: Arc<DbManager>,
    defaults: SettingsDefaults,
}

impl SqlitePresenceStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db, defaults: SettingsDefaults::default() }
    }

    pub fn with_settings_defaults(mut self, defaults: SettingsDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn db(&self) -> &Arc<DbManager> {
        &self.db
    }

    pub(crate) fn settings_defaults(&self) -> &SettingsDefaults {
        &self.defaults
    }

    pub(crate) fn conn(&self) -> Result<DbConnection> {
        self.db.get_connection()
    }
}
