// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Environment variable that overrides the default config location.
pub const CONFIG_PATH_ENV: &str = "TEST_EXECUTOR_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "TestExecutor.toml";

/// Read `path` and deserialize it into a [`RawConfigFile`].
///
/// Durations stay strings here; see [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = contents.len(), "config file read");
    parse_raw(&contents)
}

/// Deserialize TOML text without touching the filesystem.
pub fn parse_raw(contents: &str) -> Result<RawConfigFile> {
    Ok(toml::from_str(contents)?)
}

/// Load a config file and turn it into a validated [`ConfigFile`]:
/// defaults filled in, durations parsed, command checked.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    ConfigFile::try_from(load_from_path(path)?)
}

/// `$TEST_EXECUTOR_CONFIG` if set and non-empty, else `TestExecutor.toml`
/// in the current working directory.
pub fn default_config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
