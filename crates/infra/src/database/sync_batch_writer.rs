use chrono::{DateTime, Utc};
use pbxpresence_core::{DiscoveryOutcome, SyncBatch, SyncBatchWriter};
use pbxpresence_domain::{PresenceStatus, RemoteExtension, Result};
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::audit_repository::insert_log;
use super::rows::to_unix;
use super::store::SqlitePresenceStore;
use crate::errors::conversions::sql_err;

impl SyncBatchWriter for SqlitePresenceStore {
    fn commit_sync(&self, batch: &SyncBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(sql_err)?;

        for update in &batch.status_updates {
            tx.execute(
                "UPDATE extensions SET current_status = ?1, last_synced_at = ?2 WHERE id = ?3",
                params![update.status.as_str(), to_unix(update.synced_at), update.extension_id],
            )
            .map_err(sql_err)?;
        }

        for (extension_id, synced_at) in &batch.touched {
            tx.execute(
                "UPDATE extensions SET last_synced_at = ?1 WHERE id = ?2",
                params![to_unix(*synced_at), extension_id],
            )
            .map_err(sql_err)?;
        }

        for entry in &batch.logs {
            insert_log(&tx, entry).map_err(sql_err)?;
        }

        tx.commit().map_err(sql_err)?;

        debug!(
            updates = batch.status_updates.len(),
            touched = batch.touched.len(),
            logs = batch.logs.len(),
            "sync batch committed"
        );
        Ok(())
    }

    fn commit_discovery(
        &self,
        extensions: &[RemoteExtension],
        synced_at: DateTime<Utc>,
    ) -> Result<DiscoveryOutcome> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(sql_err)?;
        let mut outcome = DiscoveryOutcome::default();
        let synced_at = to_unix(synced_at);

        for remote in extensions {
            let status = remote
                .presence_status
                .clone()
                .unwrap_or_else(|| PresenceStatus::from("unknown"));

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM extensions WHERE remote_id = ?1",
                    params![remote.remote_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(sql_err)?;

            match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE extensions
                         SET number = ?1, name = ?2, email = ?3, current_status = ?4,
                             last_synced_at = ?5
                         WHERE id = ?6",
                        params![
                            remote.number,
                            remote.name,
                            remote.email,
                            status.as_str(),
                            synced_at,
                            id
                        ],
                    )
                    .map_err(sql_err)?;
                    outcome.updated += 1;
                }
                None => {
                    tx.execute(
                        "INSERT INTO extensions
                            (remote_id, number, name, email, planning_enabled, override_enabled,
                             current_status, last_synced_at)
                         VALUES (?1, ?2, ?3, ?4, 0, 0, ?5, ?6)",
                        params![
                            remote.remote_id,
                            remote.number,
                            remote.name,
                            remote.email,
                            status.as_str(),
                            synced_at
                        ],
                    )
                    .map_err(sql_err)?;
                    outcome.created += 1;
                }
            }
        }

        tx.commit().map_err(sql_err)?;
        Ok(outcome)
    }
}
