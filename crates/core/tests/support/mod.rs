//! Shared test helpers for `pbxpresence-core` integration tests.
//!
//! In-memory stores, a scripted PBX gateway and fixture builders so the
//! tests can focus on behaviour instead of wiring.

#![allow(dead_code)]

pub mod fixtures;
pub mod gateway;
pub mod repositories;

use std::sync::Arc;

use chrono_tz::Europe::Paris;
use pbxpresence_core::{Reconciler, ReconcilerDeps, SyncOptions};

pub use fixtures::*;
pub use gateway::ScriptedGateway;
pub use repositories::{InMemoryStore, ReversibleCipher};

/// Reconciler over `store` and `gateway` with the given options.
pub fn reconciler(
    store: &InMemoryStore,
    gateway: &ScriptedGateway,
    options: SyncOptions,
) -> Reconciler {
    let store = Arc::new(store.clone());
    let deps = ReconcilerDeps {
        extensions: store.clone(),
        schedules: store.clone(),
        overrides: store.clone(),
        settings: store.clone(),
        batch_writer: store,
        gateway: Arc::new(gateway.clone()),
    };
    Reconciler::new(deps, Paris, options)
}
