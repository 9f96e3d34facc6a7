//! Configuration management.
//!
//! quotesync keeps everything under one data directory:
//! - **Records**: `~/.quotesync/records.json` (the persisted snapshot)
//! - **Config**: `~/.quotesync/config.json` (optional)
//!
//! Every setting resolves with the same priority:
//! 1. Explicit CLI flag
//! 2. Environment variable (`QSYNC_STORE`, `QSYNC_ENDPOINT`, `QSYNC_CONFIG`)
//! 3. `config.json`
//! 4. Built-in default

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sync::ConflictPolicy;

/// Default remote collection endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";

/// Default period between automatic sync cycles.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Default timeout for a single fetch or post.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Snapshot file name inside the data directory.
const RECORDS_FILE: &str = "records.json";

/// Contents of `config.json`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QsyncConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_policy: Option<ConflictPolicy>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub store_path: PathBuf,
    pub endpoint: String,
    #[serde(with = "duration_secs")]
    pub interval: Duration,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub conflict_policy: ConflictPolicy,
}

impl Settings {
    /// Resolve settings from CLI overrides, environment and `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no data directory can be determined or the
    /// endpoint is not an http(s) URL.
    pub fn resolve(
        store: Option<&Path>,
        endpoint: Option<&str>,
        config: &QsyncConfig,
    ) -> Result<Self> {
        let store_path = resolve_store_path(store)
            .ok_or_else(|| Error::Config("Could not determine home directory".into()))?;
        let endpoint = resolve_endpoint(endpoint, config)?;

        let interval = config.interval_secs.unwrap_or(DEFAULT_INTERVAL_SECS).max(1);
        let timeout = config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1);

        Ok(Self {
            store_path,
            endpoint,
            interval: Duration::from_secs(interval),
            timeout: Duration::from_secs(timeout),
            conflict_policy: config.conflict_policy.unwrap_or_default(),
        })
    }
}

/// Get the global quotesync directory location (`~/.quotesync/`).
#[must_use]
pub fn global_quotesync_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".quotesync"))
}

/// Resolve the record snapshot path.
///
/// Priority: explicit path, `QSYNC_STORE`, `~/.quotesync/records.json`.
#[must_use]
pub fn resolve_store_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("QSYNC_STORE") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    global_quotesync_dir().map(|dir| dir.join(RECORDS_FILE))
}

/// Resolve the remote endpoint.
///
/// Priority: explicit value, `QSYNC_ENDPOINT`, config file, [`DEFAULT_ENDPOINT`].
///
/// # Errors
///
/// Returns `Error::Config` if the winning value is not an http(s) URL.
pub fn resolve_endpoint(explicit: Option<&str>, config: &QsyncConfig) -> Result<String> {
    let from_env = std::env::var("QSYNC_ENDPOINT")
        .ok()
        .filter(|v| !v.trim().is_empty());

    let raw = explicit
        .map(ToString::to_string)
        .or(from_env)
        .or_else(|| config.endpoint.clone())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    normalize_endpoint(&raw)
}

/// Trim and validate an endpoint URL, dropping any trailing slash.
///
/// # Errors
///
/// Returns `Error::Config` for empty or non-http(s) values.
pub fn normalize_endpoint(raw: &str) -> Result<String> {
    let endpoint = raw.trim();
    if endpoint.is_empty() {
        return Err(Error::Config("endpoint must not be empty".into()));
    }
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(Error::Config(format!(
            "endpoint must include http:// or https:// (got '{endpoint}')"
        )))
    }
}

/// Path of `config.json`.
///
/// Priority: `QSYNC_CONFIG`, `~/.quotesync/config.json`.
///
/// # Errors
///
/// Returns `Error::Config` if no home directory can be determined.
pub fn config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("QSYNC_CONFIG") {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    global_quotesync_dir()
        .map(|dir| dir.join("config.json"))
        .ok_or_else(|| Error::Config("Could not determine home directory".into()))
}

/// Load `~/.quotesync/config.json`, or defaults if it does not exist.
///
/// # Errors
///
/// Returns `Error::Config` if the file exists but cannot be read or parsed.
pub fn load_config() -> Result<QsyncConfig> {
    load_config_from(&config_path()?)
}

/// Load a config file from an explicit path.
///
/// # Errors
///
/// Returns `Error::Config` if the file exists but cannot be read or parsed.
pub fn load_config_from(path: &Path) -> Result<QsyncConfig> {
    if !path.exists() {
        return Ok(QsyncConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}

/// Save `config.json`, merging `update` over the existing values.
///
/// # Errors
///
/// Returns `Error::Config` if the file cannot be written.
pub fn save_config(update: &QsyncConfig) -> Result<QsyncConfig> {
    save_config_to(&config_path()?, update)
}

/// Merge `update` into the config at `path` and write it back.
///
/// # Errors
///
/// Returns `Error::Config` if the file cannot be read, parsed or written.
pub fn save_config_to(path: &Path, update: &QsyncConfig) -> Result<QsyncConfig> {
    let existing = load_config_from(path)?;
    let merged = QsyncConfig {
        endpoint: update.endpoint.clone().or(existing.endpoint),
        interval_secs: update.interval_secs.or(existing.interval_secs),
        timeout_secs: update.timeout_secs.or(existing.timeout_secs),
        conflict_policy: update.conflict_policy.or(existing.conflict_policy),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
    }

    let content = serde_json::to_string_pretty(&merged)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

    fs::write(path, content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {e}")))?;

    Ok(merged)
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}
