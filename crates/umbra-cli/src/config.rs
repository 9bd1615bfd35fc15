//! Engine configuration lookup for the CLI.
//!
//! A configuration file is optional. When `--config` is not given, the first
//! existing file among the well-known locations is used; otherwise the engine
//! runs with [`EngineConfig::default`].

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use umbra::config::EngineConfig;

const CONFIG_FILE: &str = "config.toml";

/// Errors raised while locating or reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Configuration file {0} does not exist")]
    MissingFile(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    Read(#[from] io::Error),
}

/// Loads the engine configuration.
///
/// An explicit path must exist. Without one, these are tried in order:
/// `umbra/config.toml` relative to the working directory, then
/// `config.toml` in the platform configuration directory.
///
/// # Errors
///
/// Returns [`ConfigError`] if the explicit path is missing, or if the chosen
/// file cannot be read or is not a valid configuration.
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<EngineConfig, ConfigError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Using configuration given on the command line");
        return load_config_file(path);
    }

    match default_locations().into_iter().find(|path| path.exists()) {
        Some(path) => {
            info!(path = path.display().to_string(); "Using discovered configuration");
            load_config_file(&path)
        }
        None => {
            debug!("No configuration file found, using defaults");
            Ok(EngineConfig::default())
        }
    }
}

/// Well-known configuration paths, most specific first.
fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![Path::new("umbra").join(CONFIG_FILE)];
    match ProjectDirs::from("com", "umbra", "umbra") {
        Some(dirs) => locations.push(dirs.config_dir().join(CONFIG_FILE)),
        None => debug!("Platform configuration directory unavailable"),
    }
    locations
}

fn load_config_file(path: &Path) -> Result<EngineConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_explicit_path_is_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[markers]\nclone = \"data-clone\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.markers().clone_marker(), "data-clone");
        assert_eq!(config.markers().reference_marker(), "ref");
    }

    #[test]
    fn test_missing_explicit_path_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(missing) if missing == path));
    }

    #[test]
    fn test_invalid_toml_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[dispatch]\nmax_flush_rounds = \"many\"\n").unwrap();

        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Parse(_))
        ));
    }
}
