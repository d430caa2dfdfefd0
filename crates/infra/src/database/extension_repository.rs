use chrono::{DateTime, Utc};
use pbxpresence_core::ExtensionRepository;
use pbxpresence_domain::{Extension, PresenceError, PresenceStatus, Result};
use rusqlite::{params, OptionalExtension};

use super::rows::{bool_to_int, map_extension_row, to_unix, EXTENSION_COLUMNS};
use super::store::SqlitePresenceStore;
use crate::errors::conversions::sql_err;

impl SqlitePresenceStore {
    fn query_extensions(&self, filter: &str) -> Result<Vec<Extension>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {EXTENSION_COLUMNS} FROM extensions {filter} ORDER BY number, id");
        let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
        let rows = stmt.query_map([], map_extension_row).map_err(sql_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(sql_err)
    }

    fn update_extension(&self, id: i64, sql: &str, value: &dyn rusqlite::ToSql) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(sql, params![value, id]).map_err(sql_err)?;
        if changed == 0 {
            return Err(PresenceError::NotFound(format!("extension {id}")));
        }
        Ok(())
    }
}

impl ExtensionRepository for SqlitePresenceStore {
    fn list_extensions(&self) -> Result<Vec<Extension>> {
        self.query_extensions("")
    }

    fn list_planning_enabled(&self) -> Result<Vec<Extension>> {
        self.query_extensions("WHERE planning_enabled = 1")
    }

    fn get_extension(&self, id: i64) -> Result<Option<Extension>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {EXTENSION_COLUMNS} FROM extensions WHERE id = ?1");
        conn.query_row(&sql, params![id], map_extension_row).optional().map_err(sql_err)
    }

    fn set_planning_enabled(&self, id: i64, enabled: bool) -> Result<()> {
        self.update_extension(
            id,
            "UPDATE extensions SET planning_enabled = ?1 WHERE id = ?2",
            &bool_to_int(enabled),
        )
    }

    fn set_override_enabled(&self, id: i64, enabled: bool) -> Result<()> {
        self.update_extension(
            id,
            "UPDATE extensions SET override_enabled = ?1 WHERE id = ?2",
            &bool_to_int(enabled),
        )
    }

    fn update_status(
        &self,
        id: i64,
        status: &PresenceStatus,
        synced_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE extensions SET current_status = ?1, last_synced_at = ?2 WHERE id = ?3",
                params![status.as_str(), to_unix(synced_at), id],
            )
            .map_err(sql_err)?;
        if changed == 0 {
            return Err(PresenceError::NotFound(format!("extension {id}")));
        }
        Ok(())
    }

    fn set_calendar_url(&self, id: i64, url: Option<&str>) -> Result<()> {
        self.update_extension(id, "UPDATE extensions SET calendar_url = ?1 WHERE id = ?2", &url)
    }

    fn delete_extension(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed =
            conn.execute("DELETE FROM extensions WHERE id = ?1", params![id]).map_err(sql_err)?;
        if changed == 0 {
            return Err(PresenceError::NotFound(format!("extension {id}")));
        }
        Ok(())
    }
}
