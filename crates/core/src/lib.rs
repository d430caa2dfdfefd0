//! # PBX Presence Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Presence resolution rules (override, planning flags, schedule)
//! - Port/adapter interfaces (traits) for stores, the PBX and calendar feeds
//! - The reconciliation pass, calendar resync and manual actions
//!
//! ## Architecture Principles
//! - Only depends on `pbxpresence-common` and `pbxpresence-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod calendar;
pub mod presence;
pub mod security_ports;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use calendar::ports::{CalendarEvent, CalendarFeed};
pub use calendar::{CalendarSyncReport, CalendarSyncService};
pub use presence::ports::{
    AuditLogRepository, ExtensionRepository, OverrideRepository, ScheduleRepository,
    SettingsRepository,
};
pub use presence::resolver::{time_in_range, PresenceResolver};
pub use presence::service::{BulkUpdateReport, PbxCredentials, PresenceService, PresenceStats};
pub use security_ports::SecretCipher;
pub use sync::ports::{DiscoveryOutcome, PbxGateway, StatusUpdate, SyncBatch, SyncBatchWriter};
pub use sync::reconciler::{Reconciler, ReconcilerDeps, SyncOptions, SyncReport};
pub use sync::PassLock;
