//! Append-only audit log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PresenceStatus;

/// Why a status transition was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    ScheduleSpecific,
    ScheduleRecurring,
    Override,
    OverrideManual,
    NoPlanning,
    OutsideSchedule,
    ApiError,
    Manual,
}

crate::impl_domain_status_conversions!(TriggerType {
    ScheduleSpecific => "schedule_specific",
    ScheduleRecurring => "schedule_recurring",
    Override => "override",
    OverrideManual => "override_manual",
    NoPlanning => "no_planning",
    OutsideSchedule => "outside_schedule",
    ApiError => "api_error",
    Manual => "manual",
});

/// Stored audit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub extension_id: Option<i64>,
    pub action: String,
    pub old_status: Option<PresenceStatus>,
    pub new_status: Option<PresenceStatus>,
    pub trigger: Option<TriggerType>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Audit row to append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLogEntry {
    pub extension_id: Option<i64>,
    pub action: String,
    pub old_status: Option<PresenceStatus>,
    pub new_status: Option<PresenceStatus>,
    pub trigger: Option<TriggerType>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewLogEntry {
    pub fn new(
        extension_id: Option<i64>,
        action: impl Into<String>,
        trigger: TriggerType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            extension_id,
            action: action.into(),
            old_status: None,
            new_status: None,
            trigger: Some(trigger),
            details: None,
            created_at,
        }
    }

    /// Successful status change.
    pub fn status_change(
        extension_id: i64,
        action: impl Into<String>,
        old_status: Option<PresenceStatus>,
        new_status: PresenceStatus,
        trigger: TriggerType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            old_status,
            new_status: Some(new_status),
            ..Self::new(Some(extension_id), action, trigger, created_at)
        }
    }

    /// Failed remote update or per-extension fault.
    pub fn api_error(
        extension_id: Option<i64>,
        action: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::new(extension_id, action, TriggerType::ApiError, created_at).with_details(message)
    }

    pub fn with_statuses(
        mut self,
        old_status: Option<PresenceStatus>,
        new_status: Option<PresenceStatus>,
    ) -> Self {
        self.old_status = old_status;
        self.new_status = new_status;
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
