//! # PBX Presence Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite repositories behind an r2d2 pool
//! - The rate-limited, token-authenticated PBX API client
//! - The periodic sync scheduler
//! - Configuration loading and secret encryption
//! - The iCalendar feed adapter
//! - The per-database instance lock
//!
//! ## Architecture
//! - Implements traits defined in `pbxpresence-core`
//! - Depends on `pbxpresence-common`, `pbxpresence-domain` and `pbxpresence-core`
//! - Contains all "impure" code (I/O, network, filesystem)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod instance_lock;
pub mod integrations;
pub mod pbx;
pub mod scheduling;
pub mod security;

// Re-export commonly used items
pub use config::{apply_env_overrides, load as load_config, load_from_file};
pub use database::{DbManager, SqlitePresenceStore};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use instance_lock::InstanceLock;
pub use integrations::calendar::IcsCalendarFeed;
pub use pbx::{PbxApiError, PbxClient, PbxClientConfig, TokenState};
pub use scheduling::{SchedulerError, SchedulerResult, SyncScheduler, SyncSchedulerConfig};
pub use security::AesSecretCipher;
