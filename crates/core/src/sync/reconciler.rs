//! Reconciliation pass and discovery.
//!
//! A pass resolves every planning-enabled extension, pushes differences to the
//! PBX and commits all resulting store mutations together. Failures below the
//! pass level become `api_error` audit rows; only missing configuration and
//! the final commit can fail a pass.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use pbxpresence_domain::constants::{
    DEFAULT_CHANGE_DELAY_MS, DEFAULT_DISCOVERY_PAUSE_MS, DISCOVERY_PAUSE_EVERY,
};
use pbxpresence_domain::{
    Extension, NewLogEntry, PresenceError, PresenceStatus, Result, SyncConfig, SystemSettings,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use super::ports::{DiscoveryOutcome, PbxGateway, StatusUpdate, SyncBatch, SyncBatchWriter};
use super::PassLock;
use crate::presence::ports::{
    ExtensionRepository, OverrideRepository, ScheduleRepository, SettingsRepository,
};
use crate::presence::resolver::PresenceResolver;

const ACTION_STATUS_CHANGED: &str = "automatic status change";
const ACTION_UPDATE_FAILED: &str = "status update failed";
const ACTION_SYNC_ERROR: &str = "sync error";

/// Waits applied during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Pause before each remote status change.
    pub change_delay: Duration,
    /// Discovery pauses once per `discovery_pause_every` fetched extensions.
    /// The pauses pace the pass, not the store: discovery commits once.
    pub discovery_pause_every: usize,
    pub discovery_pause: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            change_delay: Duration::from_millis(DEFAULT_CHANGE_DELAY_MS),
            discovery_pause_every: DISCOVERY_PAUSE_EVERY,
            discovery_pause: Duration::from_millis(DEFAULT_DISCOVERY_PAUSE_MS),
        }
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            change_delay: Duration::from_millis(config.change_delay_ms),
            discovery_pause_every: config.discovery_pause_every.max(1),
            discovery_pause: Duration::from_millis(config.discovery_pause_ms),
        }
    }
}

/// Counts for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub processed: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub errors: usize,
}

/// Stores and gateway used by the reconciler.
#[derive(Clone)]
pub struct ReconcilerDeps {
    pub extensions: Arc<dyn ExtensionRepository>,
    pub schedules: Arc<dyn ScheduleRepository>,
    pub overrides: Arc<dyn OverrideRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub batch_writer: Arc<dyn SyncBatchWriter>,
    pub gateway: Arc<dyn PbxGateway>,
}

enum Outcome {
    Unchanged,
    Updated,
    Failed,
}

/// Orchestrates resolver and gateway across all planning-enabled extensions.
pub struct Reconciler {
    deps: ReconcilerDeps,
    timezone: Tz,
    options: SyncOptions,
    // Shared with PresenceService so bulk pushes never interleave with a pass.
    pass_lock: PassLock,
}

impl Reconciler {
    pub fn new(deps: ReconcilerDeps, timezone: Tz, options: SyncOptions) -> Self {
        Self { deps, timezone, options, pass_lock: Arc::new(Mutex::new(())) }
    }

    /// Guard to hand to anything else that pushes statuses to the PBX.
    pub fn pass_lock(&self) -> PassLock {
        Arc::clone(&self.pass_lock)
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Run one reconciliation pass.
    #[instrument(skip(self), fields(now = %now))]
    pub async fn sync_all(&self, now: DateTime<Utc>) -> Result<SyncReport> {
        let _pass = self.pass_lock.lock().await;

        let settings = self.deps.settings.load_settings()?;
        ensure_configured(&settings)?;

        let resolver = PresenceResolver::new(settings.default_status.clone(), self.timezone);
        let extensions = self.deps.extensions.list_planning_enabled()?;
        info!(count = extensions.len(), "Starting presence sync pass");

        let mut batch = SyncBatch::default();
        let mut report = SyncReport::default();

        for extension in &extensions {
            report.processed += 1;
            match self.sync_extension(&resolver, extension, now, &mut batch).await {
                Ok(Outcome::Unchanged) => report.unchanged += 1,
                Ok(Outcome::Updated) => report.updated += 1,
                Ok(Outcome::Failed) => report.errors += 1,
                Err(err) => {
                    report.errors += 1;
                    error!(
                        extension = %extension.number,
                        error = %err,
                        "Failed to process extension"
                    );
                    batch.logs.push(NewLogEntry::api_error(
                        Some(extension.id),
                        ACTION_SYNC_ERROR,
                        err.to_string(),
                        now,
                    ));
                }
            }
        }

        self.deps.batch_writer.commit_sync(&batch)?;

        info!(
            processed = report.processed,
            updated = report.updated,
            unchanged = report.unchanged,
            errors = report.errors,
            "Presence sync pass complete"
        );
        Ok(report)
    }

    async fn sync_extension(
        &self,
        resolver: &PresenceResolver,
        extension: &Extension,
        now: DateTime<Utc>,
        batch: &mut SyncBatch,
    ) -> Result<Outcome> {
        let schedule = self.deps.schedules.list_schedule(extension.id)?;
        let overrides = self.deps.overrides.list_overrides(extension.id)?;
        let resolution = resolver.resolve(extension, &schedule, &overrides, now);

        let Some(target) = resolution.change_from(extension.current_status.as_ref()) else {
            debug!(extension = %extension.number, reason = %resolution.reason, "Status unchanged");
            batch.touched.push((extension.id, now));
            return Ok(Outcome::Unchanged);
        };

        if !self.options.change_delay.is_zero() {
            tokio::time::sleep(self.options.change_delay).await;
        }

        match self.deps.gateway.set_presence(extension.remote_id, target).await {
            Ok(()) => {
                info!(
                    extension = %extension.number,
                    old = ?extension.current_status.as_ref().map(PresenceStatus::as_str),
                    new = %target,
                    reason = %resolution.reason,
                    "Presence status changed"
                );
                batch.status_updates.push(StatusUpdate {
                    extension_id: extension.id,
                    status: target.clone(),
                    synced_at: now,
                });
                batch.logs.push(
                    NewLogEntry::status_change(
                        extension.id,
                        ACTION_STATUS_CHANGED,
                        extension.current_status.clone(),
                        target.clone(),
                        resolution.reason,
                        now,
                    )
                    .with_details("automatic sync"),
                );
                Ok(Outcome::Updated)
            }
            Err(err) => {
                warn!(extension = %extension.number, error = %err, "PBX rejected status change");
                batch.logs.push(NewLogEntry::api_error(
                    Some(extension.id),
                    ACTION_UPDATE_FAILED,
                    err.to_string(),
                    now,
                ));
                Ok(Outcome::Failed)
            }
        }
    }

    /// Fetch every extension from the PBX and upsert the local records.
    #[instrument(skip(self), fields(now = %now))]
    pub async fn refresh_from_remote(&self, now: DateTime<Utc>) -> Result<DiscoveryOutcome> {
        let _pass = self.pass_lock.lock().await;

        let settings = self.deps.settings.load_settings()?;
        ensure_configured(&settings)?;

        let remote = self.deps.gateway.list_extensions().await?;
        info!(count = remote.len(), "Fetched extensions from PBX");

        // One pause per full group of `discovery_pause_every` extensions past
        // the first. Nothing is written before the commit below, so the pauses
        // only stretch the time discovery holds the pass lock.
        let pauses = remote.len().saturating_sub(1) / self.options.discovery_pause_every.max(1);
        for _ in 0..pauses {
            tokio::time::sleep(self.options.discovery_pause).await;
        }

        let outcome = self.deps.batch_writer.commit_discovery(&remote, now)?;
        info!(created = outcome.created, updated = outcome.updated, "Extension discovery complete");
        Ok(outcome)
    }
}

fn ensure_configured(settings: &SystemSettings) -> Result<()> {
    if settings.has_credentials() {
        return Ok(());
    }
    let missing = settings.missing_credentials().join(", ");
    warn!(missing = %missing, "PBX configuration missing, skipping");
    Err(PresenceError::ConfigurationMissing(missing))
}
