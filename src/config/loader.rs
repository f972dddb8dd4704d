// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "Sitepipe.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks globs, output paths, qualities, browser targets and that the
///   cleanup targets are disjoint.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the config for a CLI invocation.
///
/// An explicit path must exist. Without one, `Sitepipe.toml` is used when
/// present and the built-in defaults otherwise.
pub fn resolve_config(explicit: Option<&str>) -> Result<(PathBuf, ConfigFile)> {
    if let Some(path) = explicit {
        let path = PathBuf::from(path);
        let cfg = load_and_validate(&path)?;
        return Ok((path, cfg));
    }

    let path = default_config_path();
    if path.is_file() {
        let cfg = load_and_validate(&path)?;
        return Ok((path, cfg));
    }

    info!(
        "no {} found; using built-in path configuration",
        DEFAULT_CONFIG_FILE
    );
    let cfg = ConfigFile::try_from(RawConfigFile::default())?;
    Ok((path, cfg))
}

/// Default config location: `Sitepipe.toml` in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
