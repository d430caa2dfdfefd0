//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Load `.env` into the process environment (if present)
//! 2. Read a JSON or TOML file from the first probed location, or start from
//!    defaults when none exists
//! 3. Apply environment overrides
//! 4. Validate
//!
//! ## Environment Variables
//! - `PBXPRESENCE_DB_PATH`, `PBXPRESENCE_DB_POOL_SIZE`
//! - `PBXPRESENCE_PBX_URL` (or `YEASTAR_PBX_URL`)
//! - `PBXPRESENCE_CLIENT_ID` (or `YEASTAR_CLIENT_ID`)
//! - `PBXPRESENCE_CLIENT_SECRET` (or `YEASTAR_CLIENT_SECRET`)
//! - `PBXPRESENCE_REQUEST_TIMEOUT_SECS`, `PBXPRESENCE_REQUEST_SPACING_MS`
//! - `PBXPRESENCE_ACCEPT_INVALID_CERTS` (true/false)
//! - `PBXPRESENCE_TIMEZONE`
//! - `PBXPRESENCE_DEFAULT_STATUS` (or `DEFAULT_STATUS`)
//! - `PBXPRESENCE_SYNC_INTERVAL_MINUTES`, `PBXPRESENCE_CHANGE_DELAY_MS`
//! - `PBXPRESENCE_SYNC_ENABLED` (true/false)
//! - `PBXPRESENCE_SECRET_KEY_PATH`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.{json,toml}` and `./pbxpresence.{json,toml}`
//! 2. `../config.{json,toml}`
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use pbxpresence_domain::{AppConfig, PresenceError, Result};

/// Environment variable overriding the probed config file path.
pub const CONFIG_PATH_ENV: &str = "PBXPRESENCE_CONFIG";

/// Load configuration: `.env`, file (or defaults), environment overrides,
/// validation.
///
/// # Errors
/// Returns `PresenceError::Config` if a file is unreadable or malformed, an
/// override cannot be parsed, or the result fails validation.
pub fn load() -> Result<AppConfig> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "failed to read .env file"),
    }

    let explicit = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
    let mut config = match explicit.or_else(probe_config_paths) {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::info!("No config file found, using defaults");
            AppConfig::default()
        }
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `PresenceError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(PresenceError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            PresenceError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| PresenceError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PresenceError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PresenceError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(PresenceError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["config.json", "config.toml", "pbxpresence.json", "pbxpresence.toml"];

    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(NAMES.iter().map(|name| cwd.join(name)));
        candidates.push(cwd.join("../config.json"));
        candidates.push(cwd.join("../config.toml"));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Overlay environment variables onto `config`.
///
/// # Errors
/// Returns `PresenceError::Config` when a numeric or boolean variable cannot
/// be parsed.
pub fn apply_env_overrides(config: &mut AppConfig) -> Result<()> {
    if let Some(path) = env_var(&["PBXPRESENCE_DB_PATH"]) {
        config.database.path = path;
    }
    if let Some(size) = env_parse(&["PBXPRESENCE_DB_POOL_SIZE"])? {
        config.database.pool_size = size;
    }

    if let Some(url) = env_var(&["PBXPRESENCE_PBX_URL", "YEASTAR_PBX_URL"]) {
        config.pbx.url = Some(url);
    }
    if let Some(client_id) = env_var(&["PBXPRESENCE_CLIENT_ID", "YEASTAR_CLIENT_ID"]) {
        config.pbx.client_id = Some(client_id);
    }
    if let Some(secret) = env_var(&["PBXPRESENCE_CLIENT_SECRET", "YEASTAR_CLIENT_SECRET"]) {
        config.pbx.client_secret = Some(secret);
    }
    if let Some(timeout) = env_parse(&["PBXPRESENCE_REQUEST_TIMEOUT_SECS"])? {
        config.pbx.request_timeout_secs = timeout;
    }
    if let Some(spacing) = env_parse(&["PBXPRESENCE_REQUEST_SPACING_MS"])? {
        config.pbx.request_spacing_ms = spacing;
    }
    config.pbx.accept_invalid_certs =
        env_bool("PBXPRESENCE_ACCEPT_INVALID_CERTS", config.pbx.accept_invalid_certs);

    if let Some(timezone) = env_var(&["PBXPRESENCE_TIMEZONE"]) {
        config.schedule.timezone = timezone;
    }
    if let Some(status) = env_var(&["PBXPRESENCE_DEFAULT_STATUS", "DEFAULT_STATUS"]) {
        config.schedule.default_status = status;
    }

    if let Some(minutes) = env_parse(&["PBXPRESENCE_SYNC_INTERVAL_MINUTES"])? {
        config.sync.interval_minutes = minutes;
    }
    if let Some(delay) = env_parse(&["PBXPRESENCE_CHANGE_DELAY_MS"])? {
        config.sync.change_delay_ms = delay;
    }
    config.sync.enabled = env_bool("PBXPRESENCE_SYNC_ENABLED", config.sync.enabled);

    if let Some(path) = env_var(&["PBXPRESENCE_SECRET_KEY_PATH"]) {
        config.security.secret_key_path = path;
    }

    Ok(())
}

/// First non-blank value among `keys`.
fn env_var(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn env_parse<T>(keys: &[&str]) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(keys)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| {
                PresenceError::Config(format!("Invalid value for {}: {} ({})", keys[0], raw, e))
            })
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
