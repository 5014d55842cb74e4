//! Configuration schema types for `mpal.toml`
//!
//! ```toml
//! [definitions]
//! paths = ["palettes/news.json", "palettes/events.toml"]
//!
//! [resolver]
//! detect_cycles = true
//!
//! [output]
//! format = "json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::definitions::is_definition_file;
use crate::resolver::ResolverOptions;

/// Output format of the resolve command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per legend
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Where palette definitions come from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionsConfig {
    /// Definition files, relative to the directory holding `mpal.toml`
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

/// Resolver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Fail on cyclic `extends` chains instead of recursing forever
    #[serde(default = "default_true")]
    pub detect_cycles: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { detect_cycles: true }
    }
}

impl ResolverConfig {
    pub fn options(&self) -> ResolverOptions {
        ResolverOptions { detect_cycles: self.detect_cycles }
    }
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Complete `mpal.toml` configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MpalConfig {
    #[serde(default)]
    pub definitions: DefinitionsConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "definitions.paths[0]")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mpal.toml: '{}' {}", self.field, self.message)
    }
}

impl MpalConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        for (i, path) in self.definitions.paths.iter().enumerate() {
            if path.as_os_str().is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("definitions.paths[{}]", i),
                    message: "must be a non-empty path".to_string(),
                });
            } else if !is_definition_file(path) {
                errors.push(ConfigValidationError {
                    field: format!("definitions.paths[{}]", i),
                    message: format!("'{}' must be a .json or .toml file", path.display()),
                });
            }
        }

        errors
    }
}
