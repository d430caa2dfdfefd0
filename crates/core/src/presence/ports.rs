//! Store ports for extensions, schedules, overrides, settings and the audit
//! log.
//!
//! These traits define the boundaries between core business logic and the
//! persistence layer. They are synchronous to match the pooled SQLite
//! implementation.

use chrono::{DateTime, Utc};
use pbxpresence_domain::{
    Extension, LogEntry, NewLogEntry, NewScheduleEntry, Override, PresenceStatus, Result,
    ScheduleEntry, SystemSettings,
};

/// Extension records.
pub trait ExtensionRepository: Send + Sync {
    fn list_extensions(&self) -> Result<Vec<Extension>>;

    /// Extensions with `planning_enabled`.
    fn list_planning_enabled(&self) -> Result<Vec<Extension>>;

    fn get_extension(&self, id: i64) -> Result<Option<Extension>>;

    fn set_planning_enabled(&self, id: i64, enabled: bool) -> Result<()>;

    fn set_override_enabled(&self, id: i64, enabled: bool) -> Result<()>;

    /// Record a status that was successfully applied on the PBX.
    fn update_status(
        &self,
        id: i64,
        status: &PresenceStatus,
        synced_at: DateTime<Utc>,
    ) -> Result<()>;

    fn set_calendar_url(&self, id: i64, url: Option<&str>) -> Result<()>;

    /// Admin removal. Cascades to schedule, overrides and audit rows.
    fn delete_extension(&self, id: i64) -> Result<()>;
}

/// Schedule entries.
pub trait ScheduleRepository: Send + Sync {
    fn list_schedule(&self, extension_id: i64) -> Result<Vec<ScheduleEntry>>;

    fn add_entry(&self, extension_id: i64, entry: &NewScheduleEntry) -> Result<ScheduleEntry>;

    /// Returns false when no entry had that id.
    fn delete_entry(&self, entry_id: i64) -> Result<bool>;

    /// Remove every entry of an extension, whatever its source.
    fn clear_schedule(&self, extension_id: i64) -> Result<usize>;

    /// Atomically delete the extension's calendar-sourced entries, insert
    /// `entries` and stamp `last_calendar_sync_at`.
    fn replace_calendar_entries(
        &self,
        extension_id: i64,
        entries: &[NewScheduleEntry],
        synced_at: DateTime<Utc>,
    ) -> Result<usize>;
}

/// Manual overrides.
pub trait OverrideRepository: Send + Sync {
    fn list_overrides(&self, extension_id: i64) -> Result<Vec<Override>>;

    /// Atomically replace any existing override of the extension.
    fn set_override(
        &self,
        extension_id: i64,
        status: &PresenceStatus,
        reason: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Result<Override>;

    fn remove_overrides(&self, extension_id: i64) -> Result<usize>;
}

/// The singleton settings row.
pub trait SettingsRepository: Send + Sync {
    /// Load the row, creating it from defaults when absent.
    fn load_settings(&self) -> Result<SystemSettings>;

    fn save_settings(&self, settings: &SystemSettings) -> Result<()>;

    /// Persist the cached access token. `None` clears it.
    fn save_token(&self, token: Option<&str>, expires_at: Option<DateTime<Utc>>) -> Result<()>;
}

/// Append-only audit log.
pub trait AuditLogRepository: Send + Sync {
    fn append(&self, entry: &NewLogEntry) -> Result<i64>;

    /// Newest first.
    fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>>;

    /// Newest first.
    fn logs_for_extension(&self, extension_id: i64, limit: usize) -> Result<Vec<LogEntry>>;
}
