//! Schedule entries: recurring weekday slots and one-off dated slots.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use super::PresenceStatus;
use crate::errors::PresenceError;

/// Minute-resolution wall-clock time (`HH:MM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WallTime {
    minutes: u16,
}

impl WallTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, PresenceError> {
        if hour > 23 || minute > 59 {
            return Err(PresenceError::InvalidInput(format!(
                "time out of range: {hour:02}:{minute:02}"
            )));
        }
        Ok(Self { minutes: u16::from(hour) * 60 + u16::from(minute) })
    }

    /// Truncates seconds.
    pub fn from_time(time: NaiveTime) -> Self {
        // hour() < 24 and minute() < 60 always hold for NaiveTime
        Self { minutes: (time.hour() * 60 + time.minute()) as u16 }
    }

    pub fn hour(self) -> u8 {
        (self.minutes / 60) as u8
    }

    pub fn minute(self) -> u8 {
        (self.minutes % 60) as u8
    }

    /// Minutes since midnight.
    pub fn minutes(self) -> u16 {
        self.minutes
    }
}

impl FromStr for WallTime {
    type Err = PresenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PresenceError::InvalidInput(format!("invalid time '{s}', expected HH:MM"));
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        let minute: u8 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for WallTime {
    type Error = PresenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WallTime> for String {
    fn from(value: WallTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// When an entry applies: every given weekday, or on one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleSlot {
    Recurring(Weekday),
    Date(NaiveDate),
}

impl ScheduleSlot {
    /// Build from the stored column pair. Exactly one must be set.
    pub fn from_columns(
        day_of_week: Option<i64>,
        specific_date: Option<NaiveDate>,
    ) -> Result<Self, PresenceError> {
        match (day_of_week, specific_date) {
            (Some(day), None) => Ok(Self::Recurring(weekday_from_index(day)?)),
            (None, Some(date)) => Ok(Self::Date(date)),
            (Some(_), Some(_)) => Err(PresenceError::InvalidInput(
                "schedule entry has both day_of_week and specific_date".into(),
            )),
            (None, None) => Err(PresenceError::InvalidInput(
                "schedule entry has neither day_of_week nor specific_date".into(),
            )),
        }
    }

    /// 0 = Monday .. 6 = Sunday, for recurring slots.
    pub fn day_of_week(&self) -> Option<u8> {
        match self {
            Self::Recurring(day) => Some(day.num_days_from_monday() as u8),
            Self::Date(_) => None,
        }
    }

    pub fn specific_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Recurring(_) => None,
        }
    }
}

/// Map 0 = Monday .. 6 = Sunday onto [`Weekday`].
pub fn weekday_from_index(index: i64) -> Result<Weekday, PresenceError> {
    match index {
        0 => Ok(Weekday::Mon),
        1 => Ok(Weekday::Tue),
        2 => Ok(Weekday::Wed),
        3 => Ok(Weekday::Thu),
        4 => Ok(Weekday::Fri),
        5 => Ok(Weekday::Sat),
        6 => Ok(Weekday::Sun),
        other => Err(PresenceError::InvalidInput(format!("day_of_week out of range: {other}"))),
    }
}

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleSource {
    Manual,
    Imported,
    Calendar,
}

crate::impl_domain_status_conversions!(ScheduleSource {
    Manual => "manual",
    Imported => "imported",
    Calendar => "calendar",
});

impl ScheduleSource {
    /// Lenient parse for stored rows; older rows used `ical`/`csv`.
    pub fn from_stored(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "calendar" | "ical" => Self::Calendar,
            "imported" | "csv" | "json" => Self::Imported,
            _ => Self::Manual,
        }
    }
}

/// Stored schedule entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: i64,
    pub extension_id: i64,
    pub slot: ScheduleSlot,
    pub start_time: WallTime,
    pub end_time: WallTime,
    pub status: PresenceStatus,
    pub source: ScheduleSource,
}

impl ScheduleEntry {
    /// `end < start` means the range runs past midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.end_time < self.start_time
    }
}

/// Schedule entry not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScheduleEntry {
    pub slot: ScheduleSlot,
    pub start_time: WallTime,
    pub end_time: WallTime,
    pub status: PresenceStatus,
    pub source: ScheduleSource,
}

impl NewScheduleEntry {
    pub fn recurring(
        day: Weekday,
        start_time: WallTime,
        end_time: WallTime,
        status: PresenceStatus,
    ) -> Self {
        Self {
            slot: ScheduleSlot::Recurring(day),
            start_time,
            end_time,
            status,
            source: ScheduleSource::Manual,
        }
    }

    pub fn dated(
        date: NaiveDate,
        start_time: WallTime,
        end_time: WallTime,
        status: PresenceStatus,
    ) -> Self {
        Self {
            slot: ScheduleSlot::Date(date),
            start_time,
            end_time,
            status,
            source: ScheduleSource::Manual,
        }
    }

    pub fn with_source(mut self, source: ScheduleSource) -> Self {
        self.source = source;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_time_parses_and_formats() {
        let t: WallTime = "09:05".parse().unwrap();
        assert_eq!((t.hour(), t.minute()), (9, 5));
        assert_eq!(t.to_string(), "09:05");
        assert_eq!("7:30".parse::<WallTime>().unwrap().to_string(), "07:30");
    }

    #[test]
    fn wall_time_rejects_garbage() {
        for bad in ["", "24:00", "12:60", "12", "ab:cd", "12:5", "123:00"] {
            assert!(bad.parse::<WallTime>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn slot_requires_exactly_one_column() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(
            ScheduleSlot::from_columns(Some(0), None).unwrap(),
            ScheduleSlot::Recurring(Weekday::Mon)
        );
        assert_eq!(ScheduleSlot::from_columns(None, Some(date)).unwrap(), ScheduleSlot::Date(date));
        assert!(ScheduleSlot::from_columns(Some(1), Some(date)).is_err());
        assert!(ScheduleSlot::from_columns(None, None).is_err());
        assert!(ScheduleSlot::from_columns(Some(7), None).is_err());
    }

    #[test]
    fn day_of_week_is_monday_based() {
        assert_eq!(ScheduleSlot::Recurring(Weekday::Mon).day_of_week(), Some(0));
        assert_eq!(ScheduleSlot::Recurring(Weekday::Sun).day_of_week(), Some(6));
    }

    #[test]
    fn legacy_sources_are_mapped() {
        assert_eq!(ScheduleSource::from_stored("ical"), ScheduleSource::Calendar);
        assert_eq!(ScheduleSource::from_stored("csv"), ScheduleSource::Imported);
        assert_eq!(ScheduleSource::from_stored("manual"), ScheduleSource::Manual);
        assert_eq!(ScheduleSource::Calendar.as_str(), "calendar");
    }
}
