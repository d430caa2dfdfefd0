//! Calendar resync service.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use pbxpresence_domain::constants::CALENDAR_LOOKAHEAD_DAYS;
use pbxpresence_domain::{Extension, NewScheduleEntry, PresenceError, Result, ScheduleSource, WallTime};
use serde::Serialize;
use tracing::{error, info, instrument};

use super::ports::{CalendarEvent, CalendarFeed};
use super::rules::status_for_summary;
use crate::presence::ports::{ExtensionRepository, ScheduleRepository};

/// Counts for a resync over every extension with a calendar URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CalendarSyncReport {
    pub synced: usize,
    pub failed: usize,
    pub entries: usize,
}

/// Replaces calendar-sourced schedule entries from each extension's feed.
pub struct CalendarSyncService {
    feed: Arc<dyn CalendarFeed>,
    extensions: Arc<dyn ExtensionRepository>,
    schedules: Arc<dyn ScheduleRepository>,
    timezone: Tz,
    lookahead: Duration,
}

impl CalendarSyncService {
    pub fn new(
        feed: Arc<dyn CalendarFeed>,
        extensions: Arc<dyn ExtensionRepository>,
        schedules: Arc<dyn ScheduleRepository>,
        timezone: Tz,
    ) -> Self {
        Self {
            feed,
            extensions,
            schedules,
            timezone,
            lookahead: Duration::days(CALENDAR_LOOKAHEAD_DAYS),
        }
    }

    /// Resync one extension. Returns the number of entries written.
    #[instrument(skip(self, extension), fields(extension = %extension.number))]
    pub async fn sync_extension(&self, extension: &Extension, now: DateTime<Utc>) -> Result<usize> {
        let url = extension
            .calendar_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                PresenceError::InvalidInput(format!(
                    "extension {} has no calendar URL",
                    extension.number
                ))
            })?;

        let events = self.feed.fetch_events(url).await?;
        let entries = self.entries_for(&events, now);
        let written = self.schedules.replace_calendar_entries(extension.id, &entries, now)?;

        info!(events = events.len(), entries = written, "Calendar entries replaced");
        Ok(written)
    }

    /// Resync every extension that has a calendar URL.
    pub async fn sync_all(&self, now: DateTime<Utc>) -> Result<CalendarSyncReport> {
        let mut report = CalendarSyncReport::default();

        for extension in self.extensions.list_extensions()? {
            if extension.calendar_url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                continue;
            }
            match self.sync_extension(&extension, now).await {
                Ok(written) => {
                    report.synced += 1;
                    report.entries += written;
                }
                Err(err) => {
                    report.failed += 1;
                    error!(extension = %extension.number, error = %err, "Calendar resync failed");
                }
            }
        }

        Ok(report)
    }

    /// Keep events still running or starting within the lookahead window and
    /// map each to a dated entry in local time.
    fn entries_for(&self, events: &[CalendarEvent], now: DateTime<Utc>) -> Vec<NewScheduleEntry> {
        let horizon = now + self.lookahead;

        events
            .iter()
            .filter(|event| event.end >= now && event.start <= horizon)
            .map(|event| {
                let start = event.start.with_timezone(&self.timezone);
                let end = event.end.with_timezone(&self.timezone);
                NewScheduleEntry::dated(
                    start.date_naive(),
                    WallTime::from_time(start.time()),
                    WallTime::from_time(end.time()),
                    status_for_summary(&event.summary),
                )
                .with_source(ScheduleSource::Calendar)
            })
            .collect()
    }
}
