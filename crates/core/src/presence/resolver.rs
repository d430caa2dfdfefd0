//! Decides which status an extension should have at a given instant.
//!
//! Precedence, first match wins:
//! 1. an active override
//! 2. planning disabled: the default status
//! 3. `override_enabled`: keep the current status
//! 4. a dated schedule entry for today covering the current minute
//! 5. a recurring entry for today's weekday covering the current minute
//! 6. the default status
//!
//! Dates, weekdays and times are taken from the configured timezone's wall
//! clock. Override expiry is compared in UTC. When several entries of the same
//! tier match, the most recently created one (highest id) wins; overrides are
//! ordered by creation time, then id.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use pbxpresence_domain::{
    Extension, Override, PresenceStatus, Resolution, ScheduleEntry, ScheduleSlot, TriggerType,
    WallTime,
};

/// Stateless resolver bound to a default status and a timezone.
#[derive(Debug, Clone)]
pub struct PresenceResolver {
    default_status: PresenceStatus,
    timezone: Tz,
}

impl PresenceResolver {
    pub fn new(default_status: PresenceStatus, timezone: Tz) -> Self {
        Self { default_status, timezone }
    }

    pub fn default_status(&self) -> &PresenceStatus {
        &self.default_status
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Resolve the desired status of `extension` at `now`.
    ///
    /// `schedule` and `overrides` are the extension's rows; rows belonging to
    /// other extensions are ignored.
    pub fn resolve(
        &self,
        extension: &Extension,
        schedule: &[ScheduleEntry],
        overrides: &[Override],
        now: DateTime<Utc>,
    ) -> Resolution {
        if let Some(active) = overrides
            .iter()
            .filter(|o| o.extension_id == extension.id && o.is_active(now))
            .max_by_key(|o| (o.created_at, o.id))
        {
            return Resolution::set(active.status.clone(), TriggerType::Override);
        }

        if !extension.planning_enabled {
            return Resolution::set(self.default_status.clone(), TriggerType::NoPlanning);
        }

        if extension.override_enabled {
            return Resolution::keep(TriggerType::OverrideManual);
        }

        let local = now.with_timezone(&self.timezone);
        let today = local.date_naive();
        let weekday = local.weekday();
        let current = WallTime::from_time(local.time());

        let own = || schedule.iter().filter(|e| e.extension_id == extension.id);

        if let Some(entry) = latest_match(own().filter(|e| e.slot == ScheduleSlot::Date(today)), current)
        {
            return Resolution::set(entry.status.clone(), TriggerType::ScheduleSpecific);
        }

        if let Some(entry) =
            latest_match(own().filter(|e| e.slot == ScheduleSlot::Recurring(weekday)), current)
        {
            return Resolution::set(entry.status.clone(), TriggerType::ScheduleRecurring);
        }

        Resolution::set(self.default_status.clone(), TriggerType::OutsideSchedule)
    }
}

fn latest_match<'a>(
    entries: impl Iterator<Item = &'a ScheduleEntry>,
    current: WallTime,
) -> Option<&'a ScheduleEntry> {
    entries
        .filter(|e| time_in_range(e.start_time, e.end_time, current))
        .max_by_key(|e| e.id)
}

/// Inclusive range check at minute resolution.
///
/// `end < start` wraps past midnight: `22:00-06:00` contains both `23:00`
/// and `05:59`.
pub fn time_in_range(start: WallTime, end: WallTime, current: WallTime) -> bool {
    if start <= end {
        start <= current && current <= end
    } else {
        current >= start || current <= end
    }
}
