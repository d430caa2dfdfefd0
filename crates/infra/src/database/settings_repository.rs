use chrono::{DateTime, Utc};
use pbxpresence_core::SettingsRepository;
use pbxpresence_domain::{PresenceStatus, Result, SystemSettings};
use rusqlite::{params, Connection, Row};

use super::rows::to_unix;
use super::store::{SettingsDefaults, SqlitePresenceStore};
use crate::errors::conversions::sql_err;

const SETTINGS_SELECT_SQL: &str = "SELECT pbx_url, client_id, client_secret_encrypted,
        default_status, sync_interval_minutes, access_token, token_expires_at, updated_at
    FROM settings WHERE id = 1";

const SETTINGS_UPSERT_SQL: &str = "INSERT INTO settings
        (id, pbx_url, client_id, client_secret_encrypted, default_status,
         sync_interval_minutes, access_token, token_expires_at, updated_at)
    VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(id) DO UPDATE SET
        pbx_url = excluded.pbx_url,
        client_id = excluded.client_id,
        client_secret_encrypted = excluded.client_secret_encrypted,
        default_status = excluded.default_status,
        sync_interval_minutes = excluded.sync_interval_minutes,
        access_token = excluded.access_token,
        token_expires_at = excluded.token_expires_at,
        updated_at = excluded.updated_at";

fn ensure_row(conn: &Connection, defaults: &SettingsDefaults) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO settings (id, default_status, sync_interval_minutes)
         VALUES (1, ?1, ?2)",
        params![
            defaults.default_status.as_str(),
            i64::try_from(defaults.sync_interval_minutes).unwrap_or(i64::MAX)
        ],
    )?;
    Ok(())
}

fn timestamp(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn map_settings_row(row: &Row<'_>, defaults: &SettingsDefaults) -> rusqlite::Result<SystemSettings> {
    let interval: i64 = row.get(4)?;
    Ok(SystemSettings {
        pbx_url: row.get(0)?,
        client_id: row.get(1)?,
        client_secret_encrypted: row.get(2)?,
        default_status: PresenceStatus::from(row.get::<_, String>(3)?),
        sync_interval_minutes: u64::try_from(interval)
            .ok()
            .filter(|minutes| *minutes > 0)
            .unwrap_or(defaults.sync_interval_minutes),
        access_token: row.get(5)?,
        token_expires_at: timestamp(row.get(6)?),
        updated_at: timestamp(row.get(7)?),
    })
}

impl SettingsRepository for SqlitePresenceStore {
    fn load_settings(&self) -> Result<SystemSettings> {
        let conn = self.conn()?;
        let defaults = self.settings_defaults();
        ensure_row(&conn, defaults).map_err(sql_err)?;
        conn.query_row(SETTINGS_SELECT_SQL, [], |row| map_settings_row(row, defaults))
            .map_err(sql_err)
    }

    fn save_settings(&self, settings: &SystemSettings) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            SETTINGS_UPSERT_SQL,
            params![
                settings.pbx_url,
                settings.client_id,
                settings.client_secret_encrypted,
                settings.default_status.as_str(),
                i64::try_from(settings.sync_interval_minutes).unwrap_or(i64::MAX),
                settings.access_token,
                settings.token_expires_at.map(to_unix),
                settings.updated_at.map(to_unix),
            ],
        )
        .map_err(sql_err)?;
        Ok(())
    }

    fn save_token(&self, token: Option<&str>, expires_at: Option<DateTime<Utc>>) -> Result<()> {
        let conn = self.conn()?;
        ensure_row(&conn, self.settings_defaults()).map_err(sql_err)?;
        conn.execute(
            "UPDATE settings SET access_token = ?1, token_expires_at = ?2 WHERE id = 1",
            params![token, expires_at.map(to_unix)],
        )
        .map_err(sql_err)?;
        Ok(())
    }
}
