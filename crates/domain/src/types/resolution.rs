//! Output of presence resolution.

use serde::{Deserialize, Serialize};

use super::{PresenceStatus, TriggerType};

/// Status an extension should have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum DesiredStatus {
    Set(PresenceStatus),
    /// Leave the current status alone.
    Keep,
}

/// Desired status plus the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub desired: DesiredStatus,
    pub reason: TriggerType,
}

impl Resolution {
    pub fn set(status: PresenceStatus, reason: TriggerType) -> Self {
        Self { desired: DesiredStatus::Set(status), reason }
    }

    pub fn keep(reason: TriggerType) -> Self {
        Self { desired: DesiredStatus::Keep, reason }
    }

    /// Status to push, or `None` when nothing needs to change relative to
    /// `current`.
    pub fn change_from(&self, current: Option<&PresenceStatus>) -> Option<&PresenceStatus> {
        match &self.desired {
            DesiredStatus::Keep => None,
            DesiredStatus::Set(status) if Some(status) == current => None,
            DesiredStatus::Set(status) => Some(status),
        }
    }
}
