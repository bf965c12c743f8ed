//! Environment configuration and access lists.

use std::collections::HashSet;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use starlane_core::constants::{DEFAULT_MAX_CLIENTS, DEFAULT_PORT, TICK_RATE};

use crate::error::ServerError;

/// Nominal duration of one simulation tick.
pub const TICK_DURATION: Duration = Duration::from_nanos(1_000_000_000 / TICK_RATE as u64);

/// The shared snapshot is refreshed once per this many ticks.
pub const SNAPSHOT_INTERVAL_TICKS: u64 = TICK_RATE as u64;

pub const DEFAULT_MESSAGE: &str = "A Starlane server";

/// Runtime settings read from the environment (and `.env`, if present).
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub max_clients: usize,
    /// Free-form text shown by the status endpoint.
    pub message: String,
    pub whitelist: bool,
    pub blacklist: bool,
    /// Expose uptime through the status endpoint.
    pub public_uptime: bool,
    /// Level file loaded at startup and written on shutdown.
    pub save_path: Option<PathBuf>,
    /// Seed for a freshly generated level.
    pub seed: u64,
    /// Directory holding whitelist.json, blacklist.json and ops.json.
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_clients: DEFAULT_MAX_CLIENTS,
            message: DEFAULT_MESSAGE.to_string(),
            whitelist: false,
            blacklist: true,
            public_uptime: false,
            save_path: None,
            seed: 42,
            data_dir: PathBuf::from("."),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parsed("STARLANE_PORT", defaults.port),
            max_clients: parsed("STARLANE_MAX_CLIENTS", defaults.max_clients),
            message: env::var("STARLANE_MESSAGE").unwrap_or(defaults.message),
            whitelist: flag("STARLANE_WHITELIST", defaults.whitelist),
            blacklist: flag("STARLANE_BLACKLIST", defaults.blacklist),
            public_uptime: flag("STARLANE_PUBLIC_UPTIME", defaults.public_uptime),
            save_path: env::var("STARLANE_SAVE_PATH")
                .ok()
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
            seed: parsed("STARLANE_SEED", defaults.seed),
            data_dir: env::var("STARLANE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        }
    }
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn flag(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|value| parse_flag(&value))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Account ids allowed, banned, or granted operator rights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessLists {
    pub whitelist: HashSet<String>,
    pub blacklist: HashSet<String>,
    pub ops: HashSet<String>,
}

impl AccessLists {
    /// Load the three lists from `dir`. A missing file is an empty list.
    pub fn load(dir: &Path) -> Result<Self, ServerError> {
        Ok(Self {
            whitelist: read_list(&dir.join("whitelist.json"))?,
            blacklist: read_list(&dir.join("blacklist.json"))?,
            ops: read_list(&dir.join("ops.json"))?,
        })
    }

    pub fn is_op(&self, account: &str) -> bool {
        self.ops.contains(account)
    }
}

fn read_list(path: &Path) -> Result<HashSet<String>, ServerError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => return Err(e.into()),
    };
    let entries: Vec<String> = serde_json::from_str(&text)?;
    tracing::debug!(path = %path.display(), count = entries.len(), "access list loaded");
    Ok(entries.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("starlane-config-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_tick_duration_constant() {
        // 30Hz = 33.333ms per tick
        let expected_nanos = 1_000_000_000u64 / 30;
        assert_eq!(TICK_DURATION.as_nanos(), expected_nanos as u128);
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 1123);
        assert_eq!(config.max_clients, 10);
        assert!(!config.whitelist);
        assert!(config.save_path.is_none());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag(" ON "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_missing_access_lists_are_empty() {
        let dir = scratch_dir("missing");
        let lists = AccessLists::load(&dir).unwrap();
        assert_eq!(lists, AccessLists::default());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_access_lists_load_from_json() {
        let dir = scratch_dir("present");
        std::fs::write(dir.join("ops.json"), r#"["captain"]"#).unwrap();
        std::fs::write(dir.join("blacklist.json"), r#"["griefer", "spammer"]"#).unwrap();
        let lists = AccessLists::load(&dir).unwrap();
        assert!(lists.is_op("captain"));
        assert!(!lists.is_op("griefer"));
        assert_eq!(lists.blacklist.len(), 2);
        assert!(lists.whitelist.is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_malformed_access_list_is_an_error() {
        let dir = scratch_dir("malformed");
        std::fs::write(dir.join("whitelist.json"), "{not json").unwrap();
        assert!(matches!(AccessLists::load(&dir), Err(ServerError::Json(_))));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
