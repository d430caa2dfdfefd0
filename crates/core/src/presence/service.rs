//! Manual presence actions: overrides, planning flags, schedule edits, bulk
//! updates and reporting.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use pbxpresence_domain::{
    Extension, LogEntry, NewLogEntry, NewScheduleEntry, Override, PresenceError, PresenceStatus,
    Resolution, Result, ScheduleEntry, TriggerType,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::ports::{
    AuditLogRepository, ExtensionRepository, OverrideRepository, ScheduleRepository,
    SettingsRepository,
};
use super::resolver::PresenceResolver;
use crate::security_ports::SecretCipher;
use crate::sync::ports::PbxGateway;
use crate::sync::PassLock;

/// Dashboard counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PresenceStats {
    pub total_extensions: usize,
    pub planning_enabled: usize,
    /// Keyed by stored status; extensions without one count as `unknown`.
    pub status_counts: BTreeMap<String, usize>,
    pub sync_interval_minutes: u64,
}

/// Outcome of a bulk status push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkUpdateReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// PBX connection settings entered by an administrator.
#[derive(Clone)]
pub struct PbxCredentials {
    pub url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for PbxCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PbxCredentials")
            .field("url", &self.url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Manual actions on extensions.
pub struct PresenceService {
    extensions: Arc<dyn ExtensionRepository>,
    schedules: Arc<dyn ScheduleRepository>,
    overrides: Arc<dyn OverrideRepository>,
    settings: Arc<dyn SettingsRepository>,
    audit: Arc<dyn AuditLogRepository>,
    gateway: Arc<dyn PbxGateway>,
    cipher: Arc<dyn SecretCipher>,
    timezone: Tz,
    pass_lock: PassLock,
}

impl PresenceService {
    /// `pass_lock` must be the reconciler's (`Reconciler::pass_lock`).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extensions: Arc<dyn ExtensionRepository>,
        schedules: Arc<dyn ScheduleRepository>,
        overrides: Arc<dyn OverrideRepository>,
        settings: Arc<dyn SettingsRepository>,
        audit: Arc<dyn AuditLogRepository>,
        gateway: Arc<dyn PbxGateway>,
        cipher: Arc<dyn SecretCipher>,
        timezone: Tz,
        pass_lock: PassLock,
    ) -> Self {
        Self {
            extensions,
            schedules,
            overrides,
            settings,
            audit,
            gateway,
            cipher,
            timezone,
            pass_lock,
        }
    }

    fn extension(&self, id: i64) -> Result<Extension> {
        self.extensions
            .get_extension(id)?
            .ok_or_else(|| PresenceError::NotFound(format!("extension {id}")))
    }

    /// Replace any override with a new one. `duration_hours == 0` means
    /// indefinite.
    #[instrument(skip(self, reason))]
    pub fn set_override(
        &self,
        extension_id: i64,
        status: PresenceStatus,
        reason: Option<&str>,
        duration_hours: u32,
        now: DateTime<Utc>,
    ) -> Result<Override> {
        self.extension(extension_id)?;

        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        let expires_at = (duration_hours > 0).then(|| now + Duration::hours(i64::from(duration_hours)));

        let created = self.overrides.set_override(extension_id, &status, reason, expires_at, now)?;

        let duration = if duration_hours > 0 {
            format!("{duration_hours} hours")
        } else {
            "indefinite".to_string()
        };
        self.audit.append(
            &NewLogEntry::new(Some(extension_id), "manual override set", TriggerType::Override, now)
                .with_statuses(None, Some(status))
                .with_details(format!(
                    "Reason: {}. Duration: {duration}",
                    reason.unwrap_or("not specified")
                )),
        )?;

        info!(extension_id, expires_at = ?created.expires_at, "Override set");
        Ok(created)
    }

    /// Delete every override of the extension.
    pub fn remove_override(&self, extension_id: i64, now: DateTime<Utc>) -> Result<usize> {
        let removed = self.overrides.remove_overrides(extension_id)?;
        self.audit.append(&NewLogEntry::new(
            Some(extension_id),
            "manual override removed",
            TriggerType::Manual,
            now,
        ))?;
        Ok(removed)
    }

    /// Flip `planning_enabled`, returning the new value.
    pub fn toggle_planning(&self, extension_id: i64) -> Result<bool> {
        let extension = self.extension(extension_id)?;
        let enabled = !extension.planning_enabled;
        self.extensions.set_planning_enabled(extension_id, enabled)?;
        info!(extension = %extension.number, enabled, "Planning toggled");
        Ok(enabled)
    }

    /// Flip `override_enabled`, returning the new value.
    pub fn toggle_override_flag(&self, extension_id: i64) -> Result<bool> {
        let extension = self.extension(extension_id)?;
        let enabled = !extension.override_enabled;
        self.extensions.set_override_enabled(extension_id, enabled)?;
        info!(extension = %extension.number, enabled, "Manual override flag toggled");
        Ok(enabled)
    }

    /// Push `available` to every extension.
    ///
    /// Waits for any running pass so the pass cannot commit statuses read
    /// before this push.
    #[instrument(skip(self))]
    pub async fn set_all_available(&self, now: DateTime<Utc>) -> Result<BulkUpdateReport> {
        let _pass = self.pass_lock.lock().await;

        let settings = self.settings.load_settings()?;
        if !settings.has_credentials() {
            return Err(PresenceError::ConfigurationMissing(
                settings.missing_credentials().join(", "),
            ));
        }

        let mut report = BulkUpdateReport::default();
        for extension in self.extensions.list_extensions()? {
            let status = PresenceStatus::Available;
            match self.gateway.set_presence(extension.remote_id, &status).await {
                Ok(()) => {
                    self.extensions.update_status(extension.id, &status, now)?;
                    self.audit.append(
                        &NewLogEntry::status_change(
                            extension.id,
                            "global set available",
                            extension.current_status.clone(),
                            status,
                            TriggerType::Manual,
                            now,
                        )
                        .with_details("all extensions set to available"),
                    )?;
                    report.succeeded += 1;
                }
                Err(err) => {
                    warn!(extension = %extension.number, error = %err, "Failed to set available");
                    report.failed += 1;
                }
            }
        }

        info!(succeeded = report.succeeded, failed = report.failed, "Bulk available complete");
        Ok(report)
    }

    pub fn add_schedule_entry(
        &self,
        extension_id: i64,
        entry: &NewScheduleEntry,
    ) -> Result<ScheduleEntry> {
        self.extension(extension_id)?;
        self.schedules.add_entry(extension_id, entry)
    }

    pub fn delete_schedule_entry(&self, entry_id: i64) -> Result<()> {
        if self.schedules.delete_entry(entry_id)? {
            Ok(())
        } else {
            Err(PresenceError::NotFound(format!("schedule entry {entry_id}")))
        }
    }

    pub fn clear_schedule(&self, extension_id: i64) -> Result<usize> {
        self.extension(extension_id)?;
        self.schedules.clear_schedule(extension_id)
    }

    pub fn schedule(&self, extension_id: i64) -> Result<Vec<ScheduleEntry>> {
        self.schedules.list_schedule(extension_id)
    }

    /// Set or clear the calendar feed URL used by calendar resync.
    pub fn set_calendar_url(&self, extension_id: i64, url: Option<&str>) -> Result<()> {
        self.extension(extension_id)?;
        let url = url.map(str::trim).filter(|u| !u.is_empty());
        self.extensions.set_calendar_url(extension_id, url)
    }

    pub fn stats(&self) -> Result<PresenceStats> {
        let extensions = self.extensions.list_extensions()?;
        let settings = self.settings.load_settings()?;

        let mut status_counts = BTreeMap::new();
        for extension in &extensions {
            let key = extension
                .current_status
                .as_ref()
                .map_or_else(|| "unknown".to_string(), |s| s.as_str().to_string());
            *status_counts.entry(key).or_insert(0) += 1;
        }

        Ok(PresenceStats {
            total_extensions: extensions.len(),
            planning_enabled: extensions.iter().filter(|e| e.planning_enabled).count(),
            status_counts,
            sync_interval_minutes: settings.sync_interval_minutes,
        })
    }

    /// Resolution the next pass would compute for the extension.
    pub fn preview(&self, extension_id: i64, now: DateTime<Utc>) -> Result<Resolution> {
        let extension = self.extension(extension_id)?;
        let settings = self.settings.load_settings()?;
        let resolver = PresenceResolver::new(settings.default_status, self.timezone);

        let schedule = self.schedules.list_schedule(extension_id)?;
        let overrides = self.overrides.list_overrides(extension_id)?;
        Ok(resolver.resolve(&extension, &schedule, &overrides, now))
    }

    pub fn audit_trail(&self, extension_id: Option<i64>, limit: usize) -> Result<Vec<LogEntry>> {
        match extension_id {
            Some(id) => self.audit.logs_for_extension(id, limit),
            None => self.audit.recent_logs(limit),
        }
    }

    /// Store new PBX credentials. The secret is encrypted and the cached
    /// token dropped so the next call authenticates with the new values.
    pub fn configure_pbx(&self, credentials: &PbxCredentials, now: DateTime<Utc>) -> Result<()> {
        for (field, value) in [
            ("url", &credentials.url),
            ("client_id", &credentials.client_id),
            ("client_secret", &credentials.client_secret),
        ] {
            if value.trim().is_empty() {
                return Err(PresenceError::InvalidInput(format!("PBX {field} must not be empty")));
            }
        }

        let mut settings = self.settings.load_settings()?;
        settings.pbx_url = Some(credentials.url.trim().trim_end_matches('/').to_string());
        settings.client_id = Some(credentials.client_id.trim().to_string());
        settings.client_secret_encrypted = Some(self.cipher.encrypt(&credentials.client_secret)?);
        settings.access_token = None;
        settings.token_expires_at = None;
        settings.updated_at = Some(now);
        self.settings.save_settings(&settings)?;

        info!(url = ?settings.pbx_url, "PBX credentials updated");
        Ok(())
    }
}
