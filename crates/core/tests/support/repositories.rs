//! In-memory implementations of every store port.
//!
//! One [`InMemoryStore`] implements all repositories so tests can seed and
//! inspect a single shared state. Clones share that state.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pbxpresence_core::{
    AuditLogRepository, DiscoveryOutcome, ExtensionRepository, OverrideRepository,
    ScheduleRepository, SecretCipher, SettingsRepository, SyncBatch, SyncBatchWriter,
};
use pbxpresence_domain::{
    Extension, LogEntry, NewLogEntry, NewScheduleEntry, Override, PresenceError, PresenceStatus,
    RemoteExtension, Result, ScheduleEntry, ScheduleSource, SystemSettings,
};

use super::fixtures::configured_settings;

struct StoreState {
    extensions: Vec<Extension>,
    schedule: Vec<ScheduleEntry>,
    overrides: Vec<Override>,
    settings: SystemSettings,
    logs: Vec<LogEntry>,
    next_id: i64,
    commits: usize,
    broken_schedules: HashSet<i64>,
    fail_commits: bool,
}

impl StoreState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn push_log(&mut self, entry: &NewLogEntry) -> i64 {
        let id = self.next_id();
        self.logs.push(LogEntry {
            id,
            extension_id: entry.extension_id,
            action: entry.action.clone(),
            old_status: entry.old_status.clone(),
            new_status: entry.new_status.clone(),
            trigger: entry.trigger,
            details: entry.details.clone(),
            created_at: entry.created_at,
        });
        id
    }

    fn extension_mut(&mut self, id: i64) -> Result<&mut Extension> {
        self.extensions
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| PresenceError::NotFound(format!("extension {id}")))
    }
}

#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(configured_settings())
    }
}

impl InMemoryStore {
    pub fn new(settings: SystemSettings) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                extensions: Vec::new(),
                schedule: Vec::new(),
                overrides: Vec::new(),
                settings,
                logs: Vec::new(),
                next_id: 10_000,
                commits: 0,
                broken_schedules: HashSet::new(),
                fail_commits: false,
            })),
        }
    }

    pub fn with_extension(self, extension: Extension) -> Self {
        self.state.lock().extensions.push(extension);
        self
    }

    pub fn with_entry(self, entry: ScheduleEntry) -> Self {
        self.state.lock().schedule.push(entry);
        self
    }

    pub fn with_override(self, entry: Override) -> Self {
        self.state.lock().overrides.push(entry);
        self
    }

    /// Make `list_schedule` fail for the extension, as a corrupt row would.
    pub fn with_broken_schedule(self, extension_id: i64) -> Self {
        self.state.lock().broken_schedules.insert(extension_id);
        self
    }

    pub fn failing_commits(self) -> Self {
        self.state.lock().fail_commits = true;
        self
    }

    pub fn extension(&self, id: i64) -> Option<Extension> {
        self.state.lock().extensions.iter().find(|e| e.id == id).cloned()
    }

    pub fn extensions(&self) -> Vec<Extension> {
        self.state.lock().extensions.clone()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.state.lock().logs.clone()
    }

    pub fn overrides(&self) -> Vec<Override> {
        self.state.lock().overrides.clone()
    }

    pub fn schedule(&self) -> Vec<ScheduleEntry> {
        self.state.lock().schedule.clone()
    }

    pub fn settings(&self) -> SystemSettings {
        self.state.lock().settings.clone()
    }

    pub fn commits(&self) -> usize {
        self.state.lock().commits
    }
}

impl ExtensionRepository for InMemoryStore {
    fn list_extensions(&self) -> Result<Vec<Extension>> {
        Ok(self.state.lock().extensions.clone())
    }

    fn list_planning_enabled(&self) -> Result<Vec<Extension>> {
        Ok(self.state.lock().extensions.iter().filter(|e| e.planning_enabled).cloned().collect())
    }

    fn get_extension(&self, id: i64) -> Result<Option<Extension>> {
        Ok(self.extension(id))
    }

    fn set_planning_enabled(&self, id: i64, enabled: bool) -> Result<()> {
        self.state.lock().extension_mut(id)?.planning_enabled = enabled;
        Ok(())
    }

    fn set_override_enabled(&self, id: i64, enabled: bool) -> Result<()> {
        self.state.lock().extension_mut(id)?.override_enabled = enabled;
        Ok(())
    }

    fn update_status(
        &self,
        id: i64,
        status: &PresenceStatus,
        synced_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let extension = state.extension_mut(id)?;
        extension.current_status = Some(status.clone());
        extension.last_synced_at = Some(synced_at);
        Ok(())
    }

    fn set_calendar_url(&self, id: i64, url: Option<&str>) -> Result<()> {
        self.state.lock().extension_mut(id)?.calendar_url = url.map(str::to_string);
        Ok(())
    }

    fn delete_extension(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock();
        state.extensions.retain(|e| e.id != id);
        state.schedule.retain(|e| e.extension_id != id);
        state.overrides.retain(|o| o.extension_id != id);
        state.logs.retain(|l| l.extension_id != Some(id));
        Ok(())
    }
}

impl ScheduleRepository for InMemoryStore {
    fn list_schedule(&self, extension_id: i64) -> Result<Vec<ScheduleEntry>> {
        let state = self.state.lock();
        if state.broken_schedules.contains(&extension_id) {
            return Err(PresenceError::InvalidInput("invalid time '25:99', expected HH:MM".into()));
        }
        Ok(state.schedule.iter().filter(|e| e.extension_id == extension_id).cloned().collect())
    }

    fn add_entry(&self, extension_id: i64, entry: &NewScheduleEntry) -> Result<ScheduleEntry> {
        let mut state = self.state.lock();
        let stored = ScheduleEntry {
            id: state.next_id(),
            extension_id,
            slot: entry.slot,
            start_time: entry.start_time,
            end_time: entry.end_time,
            status: entry.status.clone(),
            source: entry.source,
        };
        state.schedule.push(stored.clone());
        Ok(stored)
    }

    fn delete_entry(&self, entry_id: i64) -> Result<bool> {
        let mut state = self.state.lock();
        let before = state.schedule.len();
        state.schedule.retain(|e| e.id != entry_id);
        Ok(state.schedule.len() != before)
    }

    fn clear_schedule(&self, extension_id: i64) -> Result<usize> {
        let mut state = self.state.lock();
        let before = state.schedule.len();
        state.schedule.retain(|e| e.extension_id != extension_id);
        Ok(before - state.schedule.len())
    }

    fn replace_calendar_entries(
        &self,
        extension_id: i64,
        entries: &[NewScheduleEntry],
        synced_at: DateTime<Utc>,
    ) -> Result<usize> {
        let mut state = self.state.lock();
        state
            .schedule
            .retain(|e| !(e.extension_id == extension_id && e.source == ScheduleSource::Calendar));
        for entry in entries {
            let id = state.next_id();
            state.schedule.push(ScheduleEntry {
                id,
                extension_id,
                slot: entry.slot,
                start_time: entry.start_time,
                end_time: entry.end_time,
                status: entry.status.clone(),
                source: ScheduleSource::Calendar,
            });
        }
        state.extension_mut(extension_id)?.last_calendar_sync_at = Some(synced_at);
        Ok(entries.len())
    }
}

impl OverrideRepository for InMemoryStore {
    fn list_overrides(&self, extension_id: i64) -> Result<Vec<Override>> {
        Ok(self
            .state
            .lock()
            .overrides
            .iter()
            .filter(|o| o.extension_id == extension_id)
            .cloned()
            .collect())
    }

    fn set_override(
        &self,
        extension_id: i64,
        status: &PresenceStatus,
        reason: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Result<Override> {
        let mut state = self.state.lock();
        state.overrides.retain(|o| o.extension_id != extension_id);
        let created = Override {
            id: state.next_id(),
            extension_id,
            status: status.clone(),
            reason: reason.map(str::to_string),
            expires_at,
            created_at,
        };
        state.overrides.push(created.clone());
        Ok(created)
    }

    fn remove_overrides(&self, extension_id: i64) -> Result<usize> {
        let mut state = self.state.lock();
        let before = state.overrides.len();
        state.overrides.retain(|o| o.extension_id != extension_id);
        Ok(before - state.overrides.len())
    }
}

impl SettingsRepository for InMemoryStore {
    fn load_settings(&self) -> Result<SystemSettings> {
        Ok(self.settings())
    }

    fn save_settings(&self, settings: &SystemSettings) -> Result<()> {
        self.state.lock().settings = settings.clone();
        Ok(())
    }

    fn save_token(&self, token: Option<&str>, expires_at: Option<DateTime<Utc>>) -> Result<()> {
        let mut state = self.state.lock();
        state.settings.access_token = token.map(str::to_string);
        state.settings.token_expires_at = expires_at;
        Ok(())
    }
}

impl AuditLogRepository for InMemoryStore {
    fn append(&self, entry: &NewLogEntry) -> Result<i64> {
        Ok(self.state.lock().push_log(entry))
    }

    fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>> {
        Ok(self.state.lock().logs.iter().rev().take(limit).cloned().collect())
    }

    fn logs_for_extension(&self, extension_id: i64, limit: usize) -> Result<Vec<LogEntry>> {
        Ok(self
            .state
            .lock()
            .logs
            .iter()
            .rev()
            .filter(|l| l.extension_id == Some(extension_id))
            .take(limit)
            .cloned()
            .collect())
    }
}

impl SyncBatchWriter for InMemoryStore {
    fn commit_sync(&self, batch: &SyncBatch) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_commits {
            return Err(PresenceError::Database("database is locked".into()));
        }
        for update in &batch.status_updates {
            let extension = state.extension_mut(update.extension_id)?;
            extension.current_status = Some(update.status.clone());
            extension.last_synced_at = Some(update.synced_at);
        }
        for (id, at) in &batch.touched {
            state.extension_mut(*id)?.last_synced_at = Some(*at);
        }
        for log in &batch.logs {
            state.push_log(log);
        }
        state.commits += 1;
        Ok(())
    }

    fn commit_discovery(
        &self,
        extensions: &[RemoteExtension],
        synced_at: DateTime<Utc>,
    ) -> Result<DiscoveryOutcome> {
        let mut state = self.state.lock();
        let mut outcome = DiscoveryOutcome::default();
        for remote in extensions {
            let status = remote
                .presence_status
                .clone()
                .unwrap_or_else(|| PresenceStatus::from("unknown"));
            if let Some(existing) =
                state.extensions.iter_mut().find(|e| e.remote_id == remote.remote_id)
            {
                existing.number = remote.number.clone();
                existing.name = remote.name.clone();
                existing.email = remote.email.clone();
                existing.current_status = Some(status);
                existing.last_synced_at = Some(synced_at);
                outcome.updated += 1;
            } else {
                let id = state.next_id();
                state.extensions.push(Extension {
                    id,
                    remote_id: remote.remote_id,
                    number: remote.number.clone(),
                    name: remote.name.clone(),
                    email: remote.email.clone(),
                    planning_enabled: false,
                    override_enabled: false,
                    current_status: Some(status),
                    last_synced_at: Some(synced_at),
                    calendar_url: None,
                    last_calendar_sync_at: None,
                });
                outcome.created += 1;
            }
        }
        state.commits += 1;
        Ok(outcome)
    }
}

/// Prefixes plaintext with `enc:`. Enough to check that secrets are stored
/// through the cipher.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReversibleCipher;

impl SecretCipher for ReversibleCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        Ok(format!("enc:{plaintext}"))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        ciphertext
            .strip_prefix("enc:")
            .map(str::to_string)
            .ok_or_else(|| PresenceError::Security("not encrypted by this cipher".into()))
    }
}
