//! Extensions and their manual overrides.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PresenceStatus;

/// Local record of a PBX extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub id: i64,
    /// Identifier assigned by the PBX.
    pub remote_id: i64,
    pub number: String,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Gates whether the schedule applies at all.
    pub planning_enabled: bool,
    /// Keep whatever status is currently set instead of recomputing it.
    pub override_enabled: bool,
    /// Last status known to be applied on the PBX.
    pub current_status: Option<PresenceStatus>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub calendar_url: Option<String>,
    pub last_calendar_sync_at: Option<DateTime<Utc>>,
}

impl Extension {
    /// Name if set, otherwise the dial number.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or(&self.number)
    }
}

/// Extension as reported by the PBX listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteExtension {
    pub remote_id: i64,
    pub number: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub presence_status: Option<PresenceStatus>,
}

/// Manually forced status that beats the schedule until it expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    pub id: i64,
    pub extension_id: i64,
    pub status: PresenceStatus,
    pub reason: Option<String>,
    /// `None` means indefinite.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Override {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires| expires > now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn override_expiring(expires_at: Option<DateTime<Utc>>) -> Override {
        Override {
            id: 1,
            extension_id: 1,
            status: PresenceStatus::Away,
            reason: None,
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn override_activity_follows_expiry() {
        let now = Utc::now();
        assert!(override_expiring(None).is_active(now));
        assert!(override_expiring(Some(now + Duration::minutes(1))).is_active(now));
        assert!(!override_expiring(Some(now - Duration::hours(1))).is_active(now));
        assert!(!override_expiring(Some(now)).is_active(now));
    }

    #[test]
    fn display_name_falls_back_to_number() {
        let mut ext = Extension {
            id: 1,
            remote_id: 10,
            number: "1001".into(),
            name: None,
            email: None,
            planning_enabled: false,
            override_enabled: false,
            current_status: None,
            last_synced_at: None,
            calendar_url: None,
            last_calendar_sync_at: None,
        };
        assert_eq!(ext.display_name(), "1001");
        ext.name = Some("Reception".into());
        assert_eq!(ext.display_name(), "Reception");
    }
}
