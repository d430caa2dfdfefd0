//! Domain types and models

pub mod audit;
pub mod extension;
pub mod resolution;
pub mod schedule;
pub mod settings;
pub mod status;

pub use audit::{LogEntry, NewLogEntry, TriggerType};
pub use extension::{Extension, Override, RemoteExtension};
pub use resolution::{DesiredStatus, Resolution};
pub use schedule::{NewScheduleEntry, ScheduleEntry, ScheduleSlot, ScheduleSource, WallTime};
pub use settings::SystemSettings;
pub use status::PresenceStatus;
