//! Reconciliation of desired presence against the PBX.

pub mod ports;
pub mod reconciler;

pub use reconciler::{Reconciler, ReconcilerDeps, SyncOptions, SyncReport};

/// Single-flight guard held by every sequence of PBX status changes: passes,
/// discovery and bulk manual pushes.
pub type PassLock = std::sync::Arc<tokio::sync::Mutex<()>>;
