//! Ports used by the reconciliation pass: the remote PBX and the batch writer
//! that commits a whole pass at once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pbxpresence_domain::{NewLogEntry, PresenceStatus, RemoteExtension, Result};

/// Remote PBX operations.
#[async_trait]
pub trait PbxGateway: Send + Sync {
    /// Every extension known to the PBX.
    async fn list_extensions(&self) -> Result<Vec<RemoteExtension>>;

    /// Apply `status` to the extension with PBX id `remote_id`.
    async fn set_presence(&self, remote_id: i64, status: &PresenceStatus) -> Result<()>;
}

/// A status successfully applied on the PBX during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub extension_id: i64,
    pub status: PresenceStatus,
    pub synced_at: DateTime<Utc>,
}

/// Every store mutation produced by one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncBatch {
    pub status_updates: Vec<StatusUpdate>,
    /// Extensions whose status was already correct: only `last_synced_at`
    /// moves.
    pub touched: Vec<(i64, DateTime<Utc>)>,
    pub logs: Vec<NewLogEntry>,
}

impl SyncBatch {
    pub fn is_empty(&self) -> bool {
        self.status_updates.is_empty() && self.touched.is_empty() && self.logs.is_empty()
    }
}

/// Result of a discovery upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    pub created: usize,
    pub updated: usize,
}

/// Commits a pass's mutations in a single transaction.
pub trait SyncBatchWriter: Send + Sync {
    fn commit_sync(&self, batch: &SyncBatch) -> Result<()>;

    /// Upsert extensions by remote id. Unseen ids are created with planning
    /// disabled; a missing presence status is stored as `unknown`.
    fn commit_discovery(
        &self,
        extensions: &[RemoteExtension],
        synced_at: DateTime<Utc>,
    ) -> Result<DiscoveryOutcome>;
}
