//! # PBX Presence service
//!
//! Application layer: wires the store, PBX client, reconciler and scheduler
//! together and runs them as a long-lived process.
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core` and `infra`
//! - [`AppContext`] is the dependency injection container
//! - `main.rs` owns process lifecycle (logging, signals, shutdown)

pub mod context;
pub mod utils;

pub use context::AppContext;
