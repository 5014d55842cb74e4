//! Palette definition sources
//!
//! The resolver never reads definitions itself; it asks a
//! [`DefinitionProvider`] for the raw palette set of a table. A missing table
//! is not an error, it simply means there is nothing to resolve.
//!
//! [`DefinitionSet`] is the in-memory provider. It can be filled by hand or
//! loaded from JSON/TOML documents shaped as
//! `table -> palette name -> legend token -> [field tokens]`:
//!
//! ```json
//! {
//!   "tl_news": {
//!     "default": { "general": ["title", "alias"] },
//!     "extended extends default": { "+general": ["-alias", "date after title"] }
//!   }
//! }
//! ```

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{LegendDefinition, RawPaletteSet};

/// Source of raw palette definitions, keyed by table.
pub trait DefinitionProvider {
    /// Raw palettes of `table`, or `None` when the table has no definitions.
    fn lookup(&self, table: &str) -> Option<&RawPaletteSet>;
}

impl<P: DefinitionProvider + ?Sized> DefinitionProvider for &P {
    fn lookup(&self, table: &str) -> Option<&RawPaletteSet> {
        (**self).lookup(table)
    }
}

impl DefinitionProvider for IndexMap<String, RawPaletteSet> {
    fn lookup(&self, table: &str) -> Option<&RawPaletteSet> {
        self.get(table)
    }
}

/// Error while loading definition documents.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DefinitionError {
    /// File could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Malformed JSON document
    #[error("invalid JSON definitions: {0}")]
    Json(#[from] serde_json::Error),
    /// Malformed TOML document
    #[error("invalid TOML definitions: {0}")]
    Toml(#[from] toml::de::Error),
    /// File extension is neither `.json` nor `.toml`
    #[error("unsupported definition file {} (expected .json or .toml)", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Supported definition document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Json,
    Toml,
}

impl DefinitionFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(DefinitionFormat::Json),
            Some("toml") => Some(DefinitionFormat::Toml),
            _ => None,
        }
    }
}

/// Check if a path looks like a definition document.
pub fn is_definition_file(path: &Path) -> bool {
    DefinitionFormat::from_path(path).is_some()
}

/// In-memory palette definitions for any number of tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionSet {
    tables: IndexMap<String, RawPaletteSet>,
}

impl DefinitionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self { tables: IndexMap::new() }
    }

    /// Replace all palettes of `table`.
    pub fn insert_table(&mut self, table: impl Into<String>, palettes: RawPaletteSet) {
        self.tables.insert(table.into(), palettes);
    }

    /// Define a single palette. `palette` is the full palette-name-string,
    /// including any `extends` clauses.
    ///
    /// Redefining a palette keeps its original declaration slot.
    pub fn define(
        &mut self,
        table: impl Into<String>,
        palette: impl Into<String>,
        legends: LegendDefinition,
    ) {
        self.tables.entry(table.into()).or_default().insert(palette.into(), legends);
    }

    /// Table names in declaration order.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|s| s.as_str())
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Merge `other` into this set, palette by palette.
    ///
    /// Palettes already known keep their position and take the new
    /// definition; unknown palettes are appended.
    pub fn merge(&mut self, other: DefinitionSet) {
        for (table, palettes) in other.tables {
            let target = self.tables.entry(table).or_default();
            for (palette, legends) in palettes {
                target.insert(palette, legends);
            }
        }
    }

    /// Parse a JSON definition document.
    pub fn from_json_str(source: &str) -> Result<Self, DefinitionError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Parse a TOML definition document.
    pub fn from_toml_str(source: &str) -> Result<Self, DefinitionError> {
        Ok(toml::from_str(source)?)
    }

    /// Parse a document in the given format.
    pub fn parse(source: &str, format: DefinitionFormat) -> Result<Self, DefinitionError> {
        match format {
            DefinitionFormat::Json => Self::from_json_str(source),
            DefinitionFormat::Toml => Self::from_toml_str(source),
        }
    }

    /// Load a definition file, choosing the format by extension.
    pub fn load_file(path: &Path) -> Result<Self, DefinitionError> {
        let format = DefinitionFormat::from_path(path)
            .ok_or_else(|| DefinitionError::UnsupportedFormat(path.to_path_buf()))?;
        let source = fs::read_to_string(path)
            .map_err(|source| DefinitionError::Io { path: path.to_path_buf(), source })?;
        let set = Self::parse(&source, format)?;
        debug!("Loaded {} table(s) from {}", set.tables.len(), path.display());
        Ok(set)
    }

    /// Load and merge several files; later files win on conflicts.
    pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, DefinitionError> {
        let mut set = Self::new();
        for path in paths {
            set.merge(Self::load_file(path.as_ref())?);
        }
        Ok(set)
    }
}

impl DefinitionProvider for DefinitionSet {
    fn lookup(&self, table: &str) -> Option<&RawPaletteSet> {
        self.tables.get(table)
    }
}

impl From<IndexMap<String, RawPaletteSet>> for DefinitionSet {
    fn from(tables: IndexMap<String, RawPaletteSet>) -> Self {
        Self { tables }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NEWS_JSON: &str = r#"{
        "tl_news": {
            "default": { "general": ["title", "alias"], "date": ["date", ":hide"] },
            "extended extends default": { "+general": ["-alias", "date after title"] }
        }
    }"#;

    const NEWS_TOML: &str = r#"
[tl_news.default]
general = ["title", "alias"]
date = ["date", ":hide"]

[tl_news."extended extends default"]
"+general" = ["-alias", "date after title"]
"#;

    fn legends(entries: &[(&str, &[&str])]) -> LegendDefinition {
        entries
            .iter()
            .map(|(legend, fields)| {
                (legend.to_string(), fields.iter().map(|f| f.to_string()).collect())
            })
            .collect()
    }

    #[test]
    fn test_lookup_missing_table() {
        let set = DefinitionSet::new();
        assert!(set.lookup("tl_news").is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn test_json_preserves_declaration_order() {
        let set = DefinitionSet::from_json_str(NEWS_JSON).unwrap();
        let palettes = set.lookup("tl_news").unwrap();
        let names: Vec<&str> = palettes.keys().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["default", "extended extends default"]);

        let legends: Vec<&str> = palettes["default"].keys().map(|s| s.as_str()).collect();
        assert_eq!(legends, vec!["general", "date"]);
    }

    #[test]
    fn test_toml_matches_json() {
        let json = DefinitionSet::from_json_str(NEWS_JSON).unwrap();
        let toml = DefinitionSet::from_toml_str(NEWS_TOML).unwrap();
        assert_eq!(json, toml);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let result = DefinitionSet::from_json_str(r#"{"tl_news": {"default": "nope"}}"#);
        assert!(matches!(result, Err(DefinitionError::Json(_))));
    }

    #[test]
    fn test_define_keeps_slot_on_redefinition() {
        let mut set = DefinitionSet::new();
        set.define("t", "a", legends(&[("one", &["x"])]));
        set.define("t", "b", legends(&[("two", &["y"])]));
        set.define("t", "a", legends(&[("three", &["z"])]));

        let palettes = set.lookup("t").unwrap();
        let names: Vec<&str> = palettes.keys().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(palettes["a"].contains_key("three"));
    }

    #[test]
    fn test_merge_appends_new_palettes_and_tables() {
        let mut base = DefinitionSet::new();
        base.define("t", "a", legends(&[("one", &["x"])]));

        let mut extra = DefinitionSet::new();
        extra.define("t", "b", legends(&[("two", &["y"])]));
        extra.define("u", "c", legends(&[]));

        base.merge(extra);
        assert_eq!(base.tables().collect::<Vec<_>>(), vec!["t", "u"]);
        assert_eq!(base.lookup("t").unwrap().len(), 2);
    }

    #[test]
    fn test_load_files_by_extension() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("news.json");
        let toml_path = dir.path().join("events.toml");
        fs::write(&json_path, NEWS_JSON).unwrap();
        fs::write(&toml_path, "[tl_events.default]\ngeneral = [\"title\"]\n").unwrap();

        let set = DefinitionSet::load_files(&[&json_path, &toml_path]).unwrap();
        assert!(set.contains_table("tl_news"));
        assert!(set.contains_table("tl_events"));
    }

    #[test]
    fn test_load_file_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("news.yaml");
        fs::write(&path, "").unwrap();

        let result = DefinitionSet::load_file(&path);
        assert!(matches!(result, Err(DefinitionError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_file_missing() {
        let dir = TempDir::new().unwrap();
        let result = DefinitionSet::load_file(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(DefinitionError::Io { .. })));
    }

    #[test]
    fn test_is_definition_file() {
        assert!(is_definition_file(Path::new("palettes.json")));
        assert!(is_definition_file(Path::new("dir/palettes.toml")));
        assert!(!is_definition_file(Path::new("palettes.yaml")));
        assert!(!is_definition_file(Path::new("palettes")));
    }
}
