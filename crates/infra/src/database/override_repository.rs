use chrono::{DateTime, Utc};
use pbxpresence_core::OverrideRepository;
use pbxpresence_domain::{Override, PresenceStatus, Result};
use rusqlite::params;

use super::rows::{map_override_row, to_unix, OVERRIDE_COLUMNS};
use super::store::SqlitePresenceStore;
use crate::errors::conversions::sql_err;

impl OverrideRepository for SqlitePresenceStore {
    fn list_overrides(&self, extension_id: i64) -> Result<Vec<Override>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {OVERRIDE_COLUMNS} FROM overrides WHERE extension_id = ?1 ORDER BY created_at, id"
        );
        let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
        let rows = stmt.query_map(params![extension_id], map_override_row).map_err(sql_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(sql_err)
    }

    fn set_override(
        &self,
        extension_id: i64,
        status: &PresenceStatus,
        reason: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Result<Override> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(sql_err)?;

        tx.execute("DELETE FROM overrides WHERE extension_id = ?1", params![extension_id])
            .map_err(sql_err)?;
        tx.execute(
            "INSERT INTO overrides (extension_id, status, reason, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                extension_id,
                status.as_str(),
                reason,
                expires_at.map(to_unix),
                to_unix(created_at)
            ],
        )
        .map_err(sql_err)?;
        let id = tx.last_insert_rowid();

        tx.commit().map_err(sql_err)?;

        Ok(Override {
            id,
            extension_id,
            status: status.clone(),
            reason: reason.map(str::to_string),
            expires_at,
            created_at,
        })
    }

    fn remove_overrides(&self, extension_id: i64) -> Result<usize> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM overrides WHERE extension_id = ?1", params![extension_id])
            .map_err(sql_err)
    }
}
