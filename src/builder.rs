//! Palette materialization
//!
//! [`PaletteBuilder`] is the [`Interpreter`] that turns the resolver's event
//! stream into final palettes: ordered legends holding ordered field names.
//! Inherited content is pulled in as soon as a parent is announced, so the
//! palette's own legends edit whatever its ancestors produced.

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::interpreter::Interpreter;
use crate::models::{LegendEvent, Position};
use crate::resolver::{AncestorResolver, ResolveError};

/// A legend of a materialized palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLegend {
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    pub fields: Vec<String>,
}

impl ResolvedLegend {
    fn new(name: &str) -> Self {
        Self { name: name.to_string(), hidden: false, fields: Vec::new() }
    }

    fn position_of(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    fn remove(&mut self, field: &str) -> bool {
        match self.position_of(field) {
            Some(index) => {
                self.fields.remove(index);
                true
            }
            None => false,
        }
    }
}

/// A fully merged palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPalette {
    pub name: String,
    pub legends: Vec<ResolvedLegend>,
}

impl ResolvedPalette {
    fn new(name: &str) -> Self {
        Self { name: name.to_string(), legends: Vec::new() }
    }

    pub fn legend(&self, name: &str) -> Option<&ResolvedLegend> {
        self.legends.iter().find(|l| l.name == name)
    }

    /// All field names, legend by legend.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.legends.iter().flat_map(|l| l.fields.iter().map(|f| f.as_str()))
    }

    fn legend_mut(&mut self, name: &str) -> Option<&mut ResolvedLegend> {
        self.legends.iter_mut().find(|l| l.name == name)
    }

    fn legend_or_insert(&mut self, name: &str) -> &mut ResolvedLegend {
        match self.legends.iter().position(|l| l.name == name) {
            Some(index) => &mut self.legends[index],
            None => {
                self.legends.push(ResolvedLegend::new(name));
                let last = self.legends.len() - 1;
                &mut self.legends[last]
            }
        }
    }
}

/// Interpreter building [`ResolvedPalette`]s.
#[derive(Debug, Clone, Default)]
pub struct PaletteBuilder {
    palettes: IndexMap<String, ResolvedPalette>,
    current: Option<ResolvedPalette>,
}

impl PaletteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed palettes, in the order they were started.
    pub fn palettes(&self) -> &IndexMap<String, ResolvedPalette> {
        &self.palettes
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedPalette> {
        self.palettes.get(name)
    }

    /// Close any palette still being built and return all palettes.
    pub fn into_palettes(mut self) -> IndexMap<String, ResolvedPalette> {
        self.close_current();
        self.palettes
    }

    fn close_current(&mut self) {
        if let Some(mut palette) = self.current.take() {
            palette.legends.retain(|legend| !legend.fields.is_empty());
            debug!("Built palette '{}' with {} legend(s)", palette.name, palette.legends.len());
            self.palettes.insert(palette.name.clone(), palette);
        }
    }

    fn current_mut(&mut self, action: &str) -> Option<&mut ResolvedPalette> {
        if self.current.is_none() {
            warn!("Ignoring {} outside of a palette", action);
        }
        self.current.as_mut()
    }
}

impl Interpreter for PaletteBuilder {
    fn start(&mut self, _table: &str, palette: &str) {
        self.close_current();
        self.current = Some(ResolvedPalette::new(palette));
    }

    fn inherit(
        &mut self,
        _parent: &str,
        ancestors: &mut AncestorResolver<'_>,
    ) -> Result<(), ResolveError> {
        ancestors.resolve(self)
    }

    fn add_legend(&mut self, event: &LegendEvent) {
        let Some(palette) = self.current_mut("legend") else {
            return;
        };
        let legend = palette.legend_or_insert(&event.legend);
        legend.hidden = event.hide.apply(legend.hidden);
    }

    fn remove_field_from(&mut self, legend: &str, field: &str) {
        if let Some(target) = self.current_mut("field removal").and_then(|p| p.legend_mut(legend)) {
            target.remove(field);
        }
    }

    fn add_field(&mut self, legend: &str, field: &str) {
        let Some(palette) = self.current_mut("field") else {
            return;
        };
        let target = palette.legend_or_insert(legend);
        if target.position_of(field).is_none() {
            target.fields.push(field.to_string());
        }
    }

    fn add_field_at(&mut self, legend: &str, field: &str, position: Position, anchor: &str) {
        let Some(palette) = self.current_mut("field") else {
            return;
        };
        let target = palette.legend_or_insert(legend);
        target.remove(field);

        let index = match (target.position_of(anchor), position) {
            (Some(index), Position::Before) => index,
            (Some(index), Position::After) => index + 1,
            (None, _) => target.fields.len(),
        };
        target.fields.insert(index, field.to_string());
    }

    fn finish(&mut self) {
        self.close_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Hide;

    fn legend_event(name: &str, hide: Hide) -> LegendEvent {
        LegendEvent { legend: name.to_string(), override_fields: true, hide }
    }

    fn built(builder: PaletteBuilder, name: &str) -> ResolvedPalette {
        builder.into_palettes().shift_remove(name).unwrap()
    }

    #[test]
    fn test_append_ignores_duplicates() {
        let mut builder = PaletteBuilder::new();
        builder.start("T", "p");
        builder.add_legend(&legend_event("general", Hide::Visible));
        builder.add_field("general", "title");
        builder.add_field("general", "alias");
        builder.add_field("general", "title");

        let palette = built(builder, "p");
        assert_eq!(palette.legend("general").unwrap().fields, vec!["title", "alias"]);
    }

    #[test]
    fn test_positioned_insert_moves_existing_field() {
        let mut builder = PaletteBuilder::new();
        builder.start("T", "p");
        builder.add_legend(&legend_event("general", Hide::Visible));
        for field in ["a", "b", "c"] {
            builder.add_field("general", field);
        }
        builder.add_field_at("general", "c", Position::Before, "a");
        builder.add_field_at("general", "d", Position::After, "a");

        let palette = built(builder, "p");
        assert_eq!(palette.legend("general").unwrap().fields, vec!["c", "a", "d", "b"]);
    }

    #[test]
    fn test_positioned_insert_with_missing_anchor_appends() {
        let mut builder = PaletteBuilder::new();
        builder.start("T", "p");
        builder.add_field("general", "a");
        builder.add_field_at("general", "b", Position::Before, "missing");

        let palette = built(builder, "p");
        assert_eq!(palette.legend("general").unwrap().fields, vec!["a", "b"]);
    }

    #[test]
    fn test_unspecified_hide_keeps_visibility() {
        let mut builder = PaletteBuilder::new();
        builder.start("T", "p");
        builder.add_legend(&legend_event("general", Hide::Hidden));
        builder.add_field("general", "a");
        builder.add_legend(&legend_event("general", Hide::Unspecified));
        assert!(builder.current.as_ref().unwrap().legend("general").unwrap().hidden);

        builder.add_legend(&legend_event("general", Hide::Visible));
        assert!(!built(builder, "p").legend("general").unwrap().hidden);
    }

    #[test]
    fn test_empty_legends_are_dropped() {
        let mut builder = PaletteBuilder::new();
        builder.start("T", "p");
        builder.add_field("general", "a");
        builder.add_field("meta", "b");
        builder.remove_field_from("meta", "b");
        builder.finish();

        let palette = builder.get("p").unwrap();
        assert_eq!(palette.legends.len(), 1);
        assert_eq!(palette.fields().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_events_outside_palette_are_ignored() {
        let mut builder = PaletteBuilder::new();
        builder.add_legend(&legend_event("general", Hide::Visible));
        builder.add_field("general", "a");
        builder.finish();
        assert!(builder.palettes().is_empty());
    }
}
