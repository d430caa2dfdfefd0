//! SQLite persistence for extensions, schedules, overrides, settings and the
//! audit log.

mod audit_repository;
mod extension_repository;
pub mod manager;
mod override_repository;
mod rows;
mod schedule_repository;
mod settings_repository;
pub mod store;
mod sync_batch_writer;

pub use manager::{DbConnection, DbManager, DbPool};
pub use store::{SettingsDefaults, SqlitePresenceStore};
