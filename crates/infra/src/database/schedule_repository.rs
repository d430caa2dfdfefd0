use chrono::{DateTime, Utc};
use pbxpresence_core::ScheduleRepository;
use pbxpresence_domain::{
    NewScheduleEntry, PresenceError, Result, ScheduleEntry, ScheduleSource,
};
use rusqlite::{params, Connection};

use super::rows::{format_date, map_schedule_row, to_unix, SCHEDULE_COLUMNS};
use super::store::SqlitePresenceStore;
use crate::errors::conversions::sql_err;

const SCHEDULE_INSERT_SQL: &str = "INSERT INTO schedules
        (extension_id, day_of_week, specific_date, start_time, end_time, status, source)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

fn insert_entry(
    conn: &Connection,
    extension_id: i64,
    entry: &NewScheduleEntry,
    source: ScheduleSource,
) -> rusqlite::Result<ScheduleEntry> {
    conn.execute(
        SCHEDULE_INSERT_SQL,
        params![
            extension_id,
            entry.slot.day_of_week(),
            entry.slot.specific_date().map(format_date),
            entry.start_time.to_string(),
            entry.end_time.to_string(),
            entry.status.as_str(),
            source.as_str(),
        ],
    )?;
    Ok(ScheduleEntry {
        id: conn.last_insert_rowid(),
        extension_id,
        slot: entry.slot,
        start_time: entry.start_time,
        end_time: entry.end_time,
        status: entry.status.clone(),
        source,
    })
}

impl ScheduleRepository for SqlitePresenceStore {
    fn list_schedule(&self, extension_id: i64) -> Result<Vec<ScheduleEntry>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE extension_id = ?1 ORDER BY id");
        let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
        let rows = stmt.query_map(params![extension_id], map_schedule_row).map_err(sql_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(sql_err)
    }

    fn add_entry(&self, extension_id: i64, entry: &NewScheduleEntry) -> Result<ScheduleEntry> {
        let conn = self.conn()?;
        insert_entry(&conn, extension_id, entry, entry.source).map_err(sql_err)
    }

    fn delete_entry(&self, entry_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn
            .execute("DELETE FROM schedules WHERE id = ?1", params![entry_id])
            .map_err(sql_err)?;
        Ok(changed > 0)
    }

    fn clear_schedule(&self, extension_id: i64) -> Result<usize> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM schedules WHERE extension_id = ?1", params![extension_id])
            .map_err(sql_err)
    }

    fn replace_calendar_entries(
        &self,
        extension_id: i64,
        entries: &[NewScheduleEntry],
        synced_at: DateTime<Utc>,
    ) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(sql_err)?;

        let stamped = tx
            .execute(
                "UPDATE extensions SET last_calendar_sync_at = ?1 WHERE id = ?2",
                params![to_unix(synced_at), extension_id],
            )
            .map_err(sql_err)?;
        if stamped == 0 {
            return Err(PresenceError::NotFound(format!("extension {extension_id}")));
        }

        tx.execute(
            "DELETE FROM schedules WHERE extension_id = ?1 AND source IN ('calendar', 'ical')",
            params![extension_id],
        )
        .map_err(sql_err)?;

        for entry in entries {
            insert_entry(&tx, extension_id, entry, ScheduleSource::Calendar).map_err(sql_err)?;
        }

        tx.commit().map_err(sql_err)?;
        Ok(entries.len())
    }
}
