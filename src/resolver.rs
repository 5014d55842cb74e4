//! Meta palette resolver
//!
//! Palette names declare their parents inline: `"extended extends default"`
//! names the palette `extended` and makes it inherit from `default`. With
//! several parents (`"a extends b extends c"`) the chain is stored reversed,
//! `["c", "b"]`, and parents are announced to the interpreter in that order.
//!
//! Resolving a table prepares a per-table cache of [`PreparedPalette`]s, walks
//! every palette in declaration order and emits events to an
//! [`Interpreter`]. The cache only lives for the duration of one
//! [`Resolver::resolve`] call.
//!
//! # Example
//!
//! ```
//! use metapalettes::definitions::DefinitionSet;
//! use metapalettes::interpreter::{Event, EventRecorder};
//! use metapalettes::resolver::Resolver;
//!
//! let definitions = DefinitionSet::from_json_str(
//!     r#"{"tl_news": {"default": {"general": ["title"]}}}"#,
//! ).unwrap();
//!
//! let mut resolver = Resolver::new(&definitions);
//! let mut recorder = EventRecorder::new();
//! assert!(resolver.resolve("tl_news", &mut recorder).unwrap());
//! assert_eq!(recorder.events().last(), Some(&Event::Finish));
//!
//! assert!(!resolver.resolve("tl_missing", &mut EventRecorder::new()).unwrap());
//! ```

use indexmap::IndexMap;
use log::{debug, trace};
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

use crate::definitions::DefinitionProvider;
use crate::interpreter::{dispatch_field, Interpreter};
use crate::models::{LegendDefinition, RawPaletteSet};
use crate::tokens::parse_legend;

/// Separator between a palette name and its parents.
pub const EXTENDS_SEPARATOR: &str = " extends ";

/// Error raised while resolving palettes. Any error aborts the resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A palette (or a parent it extends) has no definition
    #[error("meta palette definition of palette '{palette}' does not exist in table '{table}'")]
    UndefinedPalette { table: String, palette: String },
    /// A palette extends itself, directly or through its parents
    #[error("cyclic palette inheritance: {}", chain.join(" -> "))]
    CyclicInheritance { chain: Vec<String> },
}

/// Split a palette-name-string into its canonical name and parent chain.
///
/// Parents are returned most distant declaration first.
///
/// ```
/// use metapalettes::resolver::extract_parents;
///
/// let (name, parents) = extract_parents("a extends b extends c");
/// assert_eq!(name, "a");
/// assert_eq!(parents, vec!["c", "b"]);
/// ```
pub fn extract_parents(palette: &str) -> (&str, Vec<String>) {
    let mut segments = palette.split(EXTENDS_SEPARATOR);
    let name = segments.next().unwrap_or(palette);
    let mut parents: Vec<String> = segments.map(str::to_string).collect();
    parents.reverse();
    (name, parents)
}

/// A palette with its parent chain split off the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPalette {
    pub name: String,
    pub parents: Vec<String>,
    pub legends: LegendDefinition,
}

/// All palettes of one table, keyed by canonical name in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedTable {
    palettes: IndexMap<String, PreparedPalette>,
}

impl PreparedTable {
    /// Prepare raw definitions.
    ///
    /// Two palette-name-strings with the same canonical name share one slot;
    /// the later definition wins.
    pub fn from_raw(raw: &RawPaletteSet) -> Self {
        let mut palettes = IndexMap::with_capacity(raw.len());
        for (palette, legends) in raw {
            let (name, parents) = extract_parents(palette);
            palettes.insert(
                name.to_string(),
                PreparedPalette { name: name.to_string(), parents, legends: legends.clone() },
            );
        }
        Self { palettes }
    }

    pub fn get(&self, name: &str) -> Option<&PreparedPalette> {
        self.palettes.get(name)
    }

    /// Canonical palette names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.palettes.keys().map(|s| s.as_str())
    }

    pub fn palettes(&self) -> impl Iterator<Item = &PreparedPalette> {
        self.palettes.values()
    }

    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }
}

/// Resolver behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Fail with [`ResolveError::CyclicInheritance`] when a palette is
    /// entered again while it is still being resolved.
    pub detect_cycles: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self { detect_cycles: true }
    }
}

/// Resolves meta palettes from a [`DefinitionProvider`].
///
/// A resolver keeps transient per-table state and is not meant to be shared
/// between concurrent resolutions.
#[derive(Debug)]
pub struct Resolver<P> {
    provider: P,
    options: ResolverOptions,
    cache: HashMap<String, Rc<PreparedTable>>,
}

impl<P: DefinitionProvider> Resolver<P> {
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, ResolverOptions::default())
    }

    pub fn with_options(provider: P, options: ResolverOptions) -> Self {
        Self { provider, options, cache: HashMap::new() }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Resolve every palette of `table`.
    ///
    /// Returns `Ok(false)` without calling the interpreter when the provider
    /// has no definitions for `table`. Otherwise every palette is resolved in
    /// declaration order, `finish` is called and `Ok(true)` returned. The
    /// table's cache is dropped before returning, on success and on error.
    pub fn resolve<I: Interpreter>(
        &mut self,
        table: &str,
        interpreter: &mut I,
    ) -> Result<bool, ResolveError> {
        let prepared = match self.prepare_shared(table) {
            Some(prepared) => prepared,
            None => {
                debug!("No meta palettes defined for table '{}'", table);
                return Ok(false);
            }
        };

        let result = self.resolve_table(table, &prepared, interpreter);
        self.clear(table);
        result.map(|()| true)
    }

    fn resolve_table(
        &mut self,
        table: &str,
        prepared: &PreparedTable,
        interpreter: &mut dyn Interpreter,
    ) -> Result<(), ResolveError> {
        for name in prepared.names() {
            self.resolve_one(table, name, interpreter, false, &mut Vec::new())?;
        }
        interpreter.finish();
        Ok(())
    }

    /// Resolve a single palette as a top-level build.
    ///
    /// The table is prepared on demand and stays cached until [`clear`] or
    /// the next [`resolve`] of the same table. `finish` is not called.
    ///
    /// [`clear`]: Resolver::clear
    /// [`resolve`]: Resolver::resolve
    pub fn resolve_palette<I: Interpreter>(
        &mut self,
        table: &str,
        palette: &str,
        interpreter: &mut I,
    ) -> Result<(), ResolveError> {
        self.resolve_one(table, palette, interpreter, false, &mut Vec::new())
    }

    /// Prepare (or re-prepare) `table`. Returns false if the provider has no
    /// definitions for it.
    pub fn prepare(&mut self, table: &str) -> bool {
        self.prepare_shared(table).is_some()
    }

    /// Cached preparation of `table`, if any.
    pub fn prepared(&self, table: &str) -> Option<&PreparedTable> {
        self.cache.get(table).map(|t| t.as_ref())
    }

    /// Drop the cached preparation of `table`.
    pub fn clear(&mut self, table: &str) {
        self.cache.remove(table);
    }

    fn prepare_shared(&mut self, table: &str) -> Option<Rc<PreparedTable>> {
        let raw = self.provider.lookup(table)?;
        let prepared = Rc::new(PreparedTable::from_raw(raw));
        debug!("Prepared {} meta palette(s) for table '{}'", prepared.len(), table);
        self.cache.insert(table.to_string(), Rc::clone(&prepared));
        Some(prepared)
    }

    fn resolve_one(
        &mut self,
        table: &str,
        name: &str,
        interpreter: &mut dyn Interpreter,
        is_ancestor: bool,
        lineage: &mut Vec<String>,
    ) -> Result<(), ResolveError> {
        let prepared = match self.cache.get(table) {
            Some(prepared) => Rc::clone(prepared),
            None => self.prepare_shared(table).unwrap_or_default(),
        };

        let palette = prepared.get(name).ok_or_else(|| ResolveError::UndefinedPalette {
            table: table.to_string(),
            palette: name.to_string(),
        })?;

        if self.options.detect_cycles && lineage.iter().any(|seen| seen == name) {
            let mut chain = lineage.clone();
            chain.push(name.to_string());
            return Err(ResolveError::CyclicInheritance { chain });
        }

        if is_ancestor {
            trace!("Resolving ancestor '{}' of '{}'", name, lineage.join(" <- "));
        } else {
            debug!("Resolving meta palette '{}' of table '{}'", name, table);
            interpreter.start(table, name);
        }

        lineage.push(name.to_string());
        let result = self.resolve_body(table, palette, interpreter, is_ancestor, lineage);
        lineage.pop();
        result
    }

    fn resolve_body(
        &mut self,
        table: &str,
        palette: &PreparedPalette,
        interpreter: &mut dyn Interpreter,
        is_ancestor: bool,
        lineage: &mut Vec<String>,
    ) -> Result<(), ResolveError> {
        for parent in &palette.parents {
            let mut ancestors =
                AncestorResolver { source: &mut *self, table, parent, lineage: &mut *lineage };
            interpreter.inherit(parent, &mut ancestors)?;
        }

        for (legend, fields) in &palette.legends {
            let parsed = parse_legend(legend, fields, is_ancestor);
            interpreter.add_legend(&parsed.event);
            for field in &parsed.fields {
                dispatch_field(interpreter, field);
            }
        }

        Ok(())
    }
}

/// Internal re-entry point used by [`AncestorResolver`].
trait AncestorSource {
    fn resolve_ancestor(
        &mut self,
        table: &str,
        palette: &str,
        interpreter: &mut dyn Interpreter,
        lineage: &mut Vec<String>,
    ) -> Result<(), ResolveError>;
}

impl<P: DefinitionProvider> AncestorSource for Resolver<P> {
    fn resolve_ancestor(
        &mut self,
        table: &str,
        palette: &str,
        interpreter: &mut dyn Interpreter,
        lineage: &mut Vec<String>,
    ) -> Result<(), ResolveError> {
        self.resolve_one(table, palette, interpreter, true, lineage)
    }
}

/// Handle given to [`Interpreter::inherit`].
///
/// It can only resolve the parent it was created for, as an ancestor of the
/// palette currently being built. Calling [`resolve`](Self::resolve) is
/// optional and may happen more than once.
pub struct AncestorResolver<'a> {
    source: &'a mut dyn AncestorSource,
    table: &'a str,
    parent: &'a str,
    lineage: &'a mut Vec<String>,
}

impl AncestorResolver<'_> {
    pub fn table(&self) -> &str {
        self.table
    }

    pub fn parent(&self) -> &str {
        self.parent
    }

    /// Emit the parent palette's events to `interpreter`.
    pub fn resolve(&mut self, interpreter: &mut dyn Interpreter) -> Result<(), ResolveError> {
        self.source.resolve_ancestor(self.table, self.parent, interpreter, self.lineage)
    }
}
