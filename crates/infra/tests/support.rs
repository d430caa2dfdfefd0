//! Shared fixtures for the infra integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use pbxpresence_core::SyncBatchWriter;
use pbxpresence_domain::{PresenceStatus, RemoteExtension};
use pbxpresence_infra::database::{DbManager, SqlitePresenceStore};
use pbxpresence_infra::AesSecretCipher;
use tempfile::TempDir;

/// Migrated SQLite store in a temporary directory. The directory lives as
/// long as the harness.
pub struct TestStore {
    pub store: Arc<SqlitePresenceStore>,
    pub cipher: Arc<AesSecretCipher>,
    temp_dir: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager = DbManager::new(temp_dir.path().join("presence.db"), 4)
            .expect("db manager should be created");
        manager.run_migrations().expect("migrations should apply");

        let cipher = AesSecretCipher::from_key_file(temp_dir.path().join("secret.key"))
            .expect("cipher should be created");

        Self {
            store: Arc::new(SqlitePresenceStore::new(Arc::new(manager))),
            cipher: Arc::new(cipher),
            temp_dir,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        self.temp_dir.path()
    }

    /// Insert extensions through discovery and return their local ids in
    /// input order.
    pub fn seed_extensions(&self, remotes: &[RemoteExtension]) -> Vec<i64> {
        use pbxpresence_core::ExtensionRepository;

        self.store.commit_discovery(remotes, fixed_now()).expect("discovery should commit");
        let stored = self.store.list_extensions().expect("extensions should list");
        remotes
            .iter()
            .map(|remote| {
                stored
                    .iter()
                    .find(|ext| ext.remote_id == remote.remote_id)
                    .map(|ext| ext.id)
                    .expect("seeded extension should exist")
            })
            .collect()
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

pub fn remote(remote_id: i64, number: &str, status: Option<PresenceStatus>) -> RemoteExtension {
    RemoteExtension {
        remote_id,
        number: number.to_string(),
        name: Some(format!("Ext {number}")),
        email: None,
        presence_status: status,
    }
}

/// Monday 2024-01-08 09:00 UTC (10:00 in Paris).
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap()
}
