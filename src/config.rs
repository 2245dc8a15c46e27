//! Engine configuration and data directory resolution

use crate::error::IndexError;
use crate::matcher::DEFAULT_CACHE_CAPACITY;
use crate::scroll::ScrollConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Name of the shipped dictionary database inside the data directory
pub const DB_FILE_NAME: &str = "dictionary.db";

const APP_DIR_NAME: &str = "M3ajem";

pub const ENV_DB_PATH: &str = "M3AJEM_DB_PATH";
pub const ENV_CACHE_CAPACITY: &str = "M3AJEM_CACHE_CAPACITY";
pub const ENV_TOP_BUFFER: &str = "M3AJEM_TOP_BUFFER";
pub const ENV_BOTTOM_BUFFER: &str = "M3AJEM_BOTTOM_BUFFER";
pub const ENV_SCROLL_LEAD: &str = "M3AJEM_SCROLL_LEAD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub db_path: PathBuf,
    pub occurrence_cache_capacity: usize,
    pub scroll: ScrollConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: get_data_dir().join(DB_FILE_NAME),
            occurrence_cache_capacity: DEFAULT_CACHE_CAPACITY,
            scroll: ScrollConfig::default(),
        }
    }
}

/// Get the data directory
///
/// - Development: `./data` when it already holds the database
/// - Otherwise: the platform data directory (`~/.local/share/M3ajem`,
///   `~/Library/Application Support/M3ajem`, `%APPDATA%\M3ajem`)
/// - Fallback: `./data`
pub fn get_data_dir() -> PathBuf {
    let local = PathBuf::from("data");
    if local.join(DB_FILE_NAME).exists() {
        return local;
    }

    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or(local)
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, IndexError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| IndexError::Config(format!("{}={:?}: {}", name, value, e)))
}

impl EngineConfig {
    /// Defaults overridden by `M3AJEM_*` environment variables.
    pub fn from_env() -> Result<Self, IndexError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, IndexError> {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            config.db_path = PathBuf::from(path.trim());
        }
        if let Some(v) = lookup(ENV_CACHE_CAPACITY) {
            config.occurrence_cache_capacity = parse_var(ENV_CACHE_CAPACITY, &v)?;
            if config.occurrence_cache_capacity == 0 {
                return Err(IndexError::Config(format!("{} must be at least 1", ENV_CACHE_CAPACITY)));
            }
        }
        if let Some(v) = lookup(ENV_TOP_BUFFER) {
            config.scroll.top_buffer = parse_var(ENV_TOP_BUFFER, &v)?;
        }
        if let Some(v) = lookup(ENV_BOTTOM_BUFFER) {
            config.scroll.bottom_buffer = parse_var(ENV_BOTTOM_BUFFER, &v)?;
        }
        if let Some(v) = lookup(ENV_SCROLL_LEAD) {
            config.scroll.scroll_lead = parse_var(ENV_SCROLL_LEAD, &v)?;
        }

        Ok(config)
    }
}
