// src/config/loader.rs

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{Configuration, RawConfigFile};
use crate::errors::{Result, SitepipeError};

/// Parse an override file into the raw, all-optional model.
///
/// Returns `Ok(None)` when the file does not exist. Any other read failure,
/// a TOML syntax error, or a value of the wrong shape is a `ConfigError`.
pub fn load_override(path: impl AsRef<Path>) -> Result<Option<RawConfigFile>> {
    let path = path.as_ref();
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(?path, "no override config file found");
            return Ok(None);
        }
        Err(err) => {
            return Err(SitepipeError::ConfigError(format!(
                "reading {}: {err}",
                path.display()
            )));
        }
    };

    let raw: RawConfigFile = toml::from_str(&contents).map_err(|err| {
        SitepipeError::ConfigError(format!("parsing {}: {err}", path.display()))
    })?;

    Ok(Some(raw))
}

/// Resolve the effective configuration.
///
/// - Missing override file: `defaults` verbatim.
/// - Present override: merged over `defaults` (see [`Configuration::merge`]).
///
/// Reads exactly one external source and has no other side effects.
pub fn resolve(defaults: &Configuration, override_path: impl AsRef<Path>) -> Result<Configuration> {
    let override_path = override_path.as_ref();
    match load_override(override_path)? {
        Some(raw) => {
            let cfg = defaults.merge(raw)?;
            info!(path = %override_path.display(), "loaded override config");
            Ok(cfg)
        }
        None => Ok(defaults.clone()),
    }
}

/// Default location of the override file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "sitepipe.toml";

/// Figure out the project root for a config path.
///
/// - If the config path has a non-empty parent (e.g. `site/sitepipe.toml`),
///   that directory is the root.
/// - A bare file name falls back to the current working directory.
pub fn project_root_for(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
