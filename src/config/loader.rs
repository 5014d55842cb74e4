//! Configuration loading and discovery for `mpal.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::{MpalConfig, OutputFormat};
use log::debug;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up by [`find_config`].
pub const CONFIG_FILE_NAME: &str = "mpal.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse mpal.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Definition files given on the command line replace the configured ones
    pub definitions: Vec<PathBuf>,
    /// Override cycle detection
    pub detect_cycles: Option<bool>,
    /// Override output format
    pub format: Option<OutputFormat>,
}

/// Find mpal.toml by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find mpal.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from an mpal.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the default
/// configuration.
pub fn load_config(path: Option<&Path>) -> Result<MpalConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(MpalConfig::default()),
    }
}

/// Load configuration from a specific file path.
///
/// Relative definition paths are resolved against the file's directory.
pub fn load_config_file(path: &Path) -> Result<MpalConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let mut config: MpalConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    if let Some(base) = path.parent() {
        for definition in &mut config.definitions.paths {
            if definition.is_relative() {
                *definition = base.join(&*definition);
            }
        }
    }

    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Apply command line overrides on top of a loaded configuration.
pub fn merge_cli_overrides(mut config: MpalConfig, overrides: &CliOverrides) -> MpalConfig {
    if !overrides.definitions.is_empty() {
        config.definitions.paths = overrides.definitions.clone();
    }
    if let Some(detect_cycles) = overrides.detect_cycles {
        config.resolver.detect_cycles = detect_cycles;
    }
    if let Some(format) = overrides.format {
        config.output.format = format;
    }
    config
}
