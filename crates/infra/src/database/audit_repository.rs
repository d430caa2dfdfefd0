use pbxpresence_core::AuditLogRepository;
use pbxpresence_domain::{LogEntry, NewLogEntry, Result};
use rusqlite::{params, Connection};

use super::rows::{map_log_row, to_unix, usize_to_i64, LOG_COLUMNS};
use super::store::SqlitePresenceStore;
use crate::errors::conversions::sql_err;

/// Insert one audit row. Shared with the batch writer so a pass's logs land
/// in the same transaction as its status changes.
pub(crate) fn insert_log(conn: &Connection, entry: &NewLogEntry) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO logs
            (extension_id, action, old_status, new_status, trigger_type, details, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.extension_id,
            entry.action,
            entry.old_status.as_ref().map(|s| s.as_str()),
            entry.new_status.as_ref().map(|s| s.as_str()),
            entry.trigger.map(|t| t.as_str()),
            entry.details,
            to_unix(entry.created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl AuditLogRepository for SqlitePresenceStore {
    fn append(&self, entry: &NewLogEntry) -> Result<i64> {
        let conn = self.conn()?;
        insert_log(&conn, entry).map_err(sql_err)
    }

    fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {LOG_COLUMNS} FROM logs ORDER BY created_at DESC, id DESC LIMIT ?1");
        let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
        let rows = stmt.query_map(params![usize_to_i64(limit)], map_log_row).map_err(sql_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(sql_err)
    }

    fn logs_for_extension(&self, extension_id: i64, limit: usize) -> Result<Vec<LogEntry>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM logs WHERE extension_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2"
        );
        let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
        let rows = stmt
            .query_map(params![extension_id, usize_to_i64(limit)], map_log_row)
            .map_err(sql_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(sql_err)
    }
}
