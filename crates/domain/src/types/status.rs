//! Presence status vocabulary.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// PBX-visible availability state of an extension.
///
/// Values outside the known vocabulary are carried as [`PresenceStatus::Unknown`]
/// with the raw string, so a status set directly on the PBX never fails to load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PresenceStatus {
    Available,
    Lunch,
    BusinessTrip,
    Away,
    DoNotDisturb,
    OffWork,
    Unknown(String),
}

impl PresenceStatus {
    /// Every known status, in display order.
    pub const KNOWN: [PresenceStatus; 6] = [
        PresenceStatus::Available,
        PresenceStatus::Lunch,
        PresenceStatus::BusinessTrip,
        PresenceStatus::Away,
        PresenceStatus::DoNotDisturb,
        PresenceStatus::OffWork,
    ];

    /// Wire and storage representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Available => "available",
            Self::Lunch => "lunch",
            Self::BusinessTrip => "business_trip",
            Self::Away => "away",
            Self::DoNotDisturb => "do_not_disturb",
            Self::OffWork => "off_work",
            Self::Unknown(raw) => raw,
        }
    }

    /// Human-readable label. Unknown values display as-is.
    pub fn label(&self) -> &str {
        match self {
            Self::Available => "Available",
            Self::Lunch => "Lunch",
            Self::BusinessTrip => "Business trip",
            Self::Away => "Away",
            Self::DoNotDisturb => "Do not disturb",
            Self::OffWork => "Off work",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<&str> for PresenceStatus {
    fn from(value: &str) -> Self {
        match value.trim() {
            "available" => Self::Available,
            "lunch" => Self::Lunch,
            "business_trip" => Self::BusinessTrip,
            "away" => Self::Away,
            "do_not_disturb" => Self::DoNotDisturb,
            "off_work" => Self::OffWork,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for PresenceStatus {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<PresenceStatus> for String {
    fn from(value: PresenceStatus) -> Self {
        match value {
            PresenceStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for PresenceStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
