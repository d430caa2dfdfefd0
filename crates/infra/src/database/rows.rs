//! Column conversions shared by the repositories.

use chrono::{DateTime, NaiveDate, Utc};
use pbxpresence_domain::{
    Extension, LogEntry, Override, PresenceError, PresenceStatus, ScheduleEntry, ScheduleSlot,
    ScheduleSource, TriggerType, WallTime,
};
use rusqlite::types::Type;
use rusqlite::Row;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) const EXTENSION_COLUMNS: &str = "id, remote_id, number, name, email, planning_enabled,
        override_enabled, current_status, last_synced_at, calendar_url, last_calendar_sync_at";

pub(crate) const SCHEDULE_COLUMNS: &str =
    "id, extension_id, day_of_week, specific_date, start_time, end_time, status, source";

pub(crate) const OVERRIDE_COLUMNS: &str =
    "id, extension_id, status, reason, expires_at, created_at";

pub(crate) const LOG_COLUMNS: &str =
    "id, extension_id, action, old_status, new_status, trigger_type, details, created_at";

pub(crate) fn to_unix(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn conversion_error(index: usize, ty: Type, err: PresenceError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, ty, Box::new(err))
}

fn timestamp_at(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let Some(secs) = row.get::<_, Option<i64>>(index)? else {
        return Ok(None);
    };
    DateTime::from_timestamp(secs, 0).map(Some).ok_or_else(|| {
        conversion_error(
            index,
            Type::Integer,
            PresenceError::Database(format!("timestamp out of range: {secs}")),
        )
    })
}

fn required_timestamp_at(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    timestamp_at(row, index)?.ok_or(rusqlite::Error::InvalidColumnType(
        index,
        "created_at".into(),
        Type::Null,
    ))
}

fn status_at(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<PresenceStatus>> {
    Ok(row.get::<_, Option<String>>(index)?.map(PresenceStatus::from))
}

fn wall_time_at(row: &Row<'_>, index: usize) -> rusqlite::Result<WallTime> {
    let raw: String = row.get(index)?;
    raw.parse().map_err(|err| conversion_error(index, Type::Text, err))
}

pub(crate) fn map_extension_row(row: &Row<'_>) -> rusqlite::Result<Extension> {
    Ok(Extension {
        id: row.get(0)?,
        remote_id: row.get(1)?,
        number: row.get(2)?,
        name: row.get(3)?,
        email: row.get(4)?,
        planning_enabled: row.get::<_, i64>(5)? != 0,
        override_enabled: row.get::<_, i64>(6)? != 0,
        current_status: status_at(row, 7)?,
        last_synced_at: timestamp_at(row, 8)?,
        calendar_url: row.get(9)?,
        last_calendar_sync_at: timestamp_at(row, 10)?,
    })
}

pub(crate) fn map_schedule_row(row: &Row<'_>) -> rusqlite::Result<ScheduleEntry> {
    let specific_date = row
        .get::<_, Option<String>>(3)?
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|_| {
                conversion_error(
                    3,
                    Type::Text,
                    PresenceError::InvalidInput(format!("invalid date '{raw}'")),
                )
            })
        })
        .transpose()?;
    let slot = ScheduleSlot::from_columns(row.get(2)?, specific_date)
        .map_err(|err| conversion_error(2, Type::Integer, err))?;

    Ok(ScheduleEntry {
        id: row.get(0)?,
        extension_id: row.get(1)?,
        slot,
        start_time: wall_time_at(row, 4)?,
        end_time: wall_time_at(row, 5)?,
        status: PresenceStatus::from(row.get::<_, String>(6)?),
        source: ScheduleSource::from_stored(&row.get::<_, String>(7)?),
    })
}

pub(crate) fn map_override_row(row: &Row<'_>) -> rusqlite::Result<Override> {
    Ok(Override {
        id: row.get(0)?,
        extension_id: row.get(1)?,
        status: PresenceStatus::from(row.get::<_, String>(2)?),
        reason: row.get(3)?,
        expires_at: timestamp_at(row, 4)?,
        created_at: required_timestamp_at(row, 5)?,
    })
}

pub(crate) fn map_log_row(row: &Row<'_>) -> rusqlite::Result<LogEntry> {
    // Unknown trigger labels from older rows are kept as absent.
    let trigger = row
        .get::<_, Option<String>>(5)?
        .and_then(|raw| raw.parse::<TriggerType>().ok());

    Ok(LogEntry {
        id: row.get(0)?,
        extension_id: row.get(1)?,
        action: row.get(2)?,
        old_status: status_at(row, 3)?,
        new_status: status_at(row, 4)?,
        trigger,
        details: row.get(6)?,
        created_at: required_timestamp_at(row, 7)?,
    })
}

pub(crate) fn usize_to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
