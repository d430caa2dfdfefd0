//! Fixture builders.

use chrono::{DateTime, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Europe::Paris;
use pbxpresence_domain::{
    Extension, Override, PresenceStatus, ScheduleEntry, ScheduleSlot, ScheduleSource,
    SystemSettings, WallTime,
};

/// Instant for a Paris wall-clock time.
pub fn paris(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Paris
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("unambiguous local time")
        .with_timezone(&Utc)
}

/// 2024-01-01 is a Monday.
pub fn monday_at(hour: u32, minute: u32) -> DateTime<Utc> {
    paris(2024, 1, 1, hour, minute)
}

pub fn wall(s: &str) -> WallTime {
    s.parse().expect("valid HH:MM")
}

pub fn extension(id: i64) -> Extension {
    Extension {
        id,
        remote_id: 1000 + id,
        number: format!("{}", 100 + id),
        name: Some(format!("Agent {id}")),
        email: None,
        planning_enabled: true,
        override_enabled: false,
        current_status: None,
        last_synced_at: None,
        calendar_url: None,
        last_calendar_sync_at: None,
    }
}

pub fn with_status(mut extension: Extension, status: PresenceStatus) -> Extension {
    extension.current_status = Some(status);
    extension
}

pub fn recurring(
    id: i64,
    extension_id: i64,
    day: Weekday,
    start: &str,
    end: &str,
    status: PresenceStatus,
) -> ScheduleEntry {
    ScheduleEntry {
        id,
        extension_id,
        slot: ScheduleSlot::Recurring(day),
        start_time: wall(start),
        end_time: wall(end),
        status,
        source: ScheduleSource::Manual,
    }
}

pub fn dated(
    id: i64,
    extension_id: i64,
    date: NaiveDate,
    start: &str,
    end: &str,
    status: PresenceStatus,
) -> ScheduleEntry {
    ScheduleEntry {
        id,
        extension_id,
        slot: ScheduleSlot::Date(date),
        start_time: wall(start),
        end_time: wall(end),
        status,
        source: ScheduleSource::Manual,
    }
}

pub fn override_for(
    id: i64,
    extension_id: i64,
    status: PresenceStatus,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
) -> Override {
    Override { id, extension_id, status, reason: None, expires_at, created_at }
}

pub fn configured_settings() -> SystemSettings {
    SystemSettings {
        pbx_url: Some("https://pbx.example".into()),
        client_id: Some("client".into()),
        client_secret_encrypted: Some("enc:secret".into()),
        default_status: PresenceStatus::Available,
        sync_interval_minutes: 5,
        access_token: None,
        token_expires_at: None,
        updated_at: None,
    }
}

pub fn unconfigured_settings() -> SystemSettings {
    SystemSettings {
        pbx_url: None,
        client_id: None,
        client_secret_encrypted: None,
        ..configured_settings()
    }
}
