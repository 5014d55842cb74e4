//! Consumers of the resolver's event stream
//!
//! The resolver does not build palettes itself. It walks the definitions and
//! drives an [`Interpreter`] through a fixed sequence of calls:
//!
//! 1. `start` for every top-level palette
//! 2. `inherit` for every parent, in chain order
//! 3. `add_legend` followed by that legend's field calls
//! 4. `finish` once all palettes of the table were walked
//!
//! Ancestors are only walked when the interpreter asks for them through the
//! [`AncestorResolver`] passed to `inherit`, so the interpreter decides when
//! inherited content is merged.

use serde::Serialize;

use crate::models::{FieldEvent, LegendEvent, Position};
use crate::resolver::{AncestorResolver, ResolveError};

/// Receiver of resolution events.
pub trait Interpreter {
    /// A new top-level palette begins. Not called for ancestors.
    fn start(&mut self, table: &str, palette: &str);

    /// The palette being resolved extends `parent`.
    ///
    /// Call `ancestors.resolve(self)` to have the parent's content emitted.
    /// Errors raised while resolving the parent must be returned.
    fn inherit(&mut self, parent: &str, ancestors: &mut AncestorResolver<'_>)
        -> Result<(), ResolveError>;

    /// A legend is declared; its field events follow.
    fn add_legend(&mut self, legend: &LegendEvent);

    fn remove_field_from(&mut self, legend: &str, field: &str);

    /// Append `field` to `legend`.
    fn add_field(&mut self, legend: &str, field: &str);

    /// Insert `field` into `legend` before or after `anchor`.
    fn add_field_at(&mut self, legend: &str, field: &str, position: Position, anchor: &str);

    /// All palettes of the table were resolved.
    fn finish(&mut self);
}

/// Forward a field event to the matching interpreter call.
pub fn dispatch_field(interpreter: &mut dyn Interpreter, event: &FieldEvent) {
    match event {
        FieldEvent::Remove { legend, field } => interpreter.remove_field_from(legend, field),
        FieldEvent::AddAppend { legend, field } => interpreter.add_field(legend, field),
        FieldEvent::AddPositioned { legend, field, position, anchor } => {
            interpreter.add_field_at(legend, field, *position, anchor)
        }
    }
}

/// One recorded interpreter call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Start { table: String, palette: String },
    Inherit { parent: String },
    Legend(LegendEvent),
    Field(FieldEvent),
    Finish,
}

/// Interpreter that records every call it receives.
///
/// By default ancestors are resolved as soon as they are announced, so the
/// inherited events appear right after the `Inherit` event.
#[derive(Debug, Clone)]
pub struct EventRecorder {
    events: Vec<Event>,
    follow_ancestors: bool,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self { events: Vec::new(), follow_ancestors: true }
    }

    /// Recorder that notes `Inherit` events without resolving the parent.
    pub fn without_ancestors() -> Self {
        Self { events: Vec::new(), follow_ancestors: false }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter for EventRecorder {
    fn start(&mut self, table: &str, palette: &str) {
        self.events.push(Event::Start { table: table.to_string(), palette: palette.to_string() });
    }

    fn inherit(
        &mut self,
        parent: &str,
        ancestors: &mut AncestorResolver<'_>,
    ) -> Result<(), ResolveError> {
        self.events.push(Event::Inherit { parent: parent.to_string() });
        if self.follow_ancestors {
            ancestors.resolve(self)?;
        }
        Ok(())
    }

    fn add_legend(&mut self, legend: &LegendEvent) {
        self.events.push(Event::Legend(legend.clone()));
    }

    fn remove_field_from(&mut self, legend: &str, field: &str) {
        self.events.push(Event::Field(FieldEvent::Remove {
            legend: legend.to_string(),
            field: field.to_string(),
        }));
    }

    fn add_field(&mut self, legend: &str, field: &str) {
        self.events.push(Event::Field(FieldEvent::AddAppend {
            legend: legend.to_string(),
            field: field.to_string(),
        }));
    }

    fn add_field_at(&mut self, legend: &str, field: &str, position: Position, anchor: &str) {
        self.events.push(Event::Field(FieldEvent::AddPositioned {
            legend: legend.to_string(),
            field: field.to_string(),
            position,
            anchor: anchor.to_string(),
        }));
    }

    fn finish(&mut self) {
        self.events.push(Event::Finish);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_field_maps_each_variant() {
        let mut recorder = EventRecorder::new();
        let events = vec![
            FieldEvent::Remove { legend: "g".to_string(), field: "a".to_string() },
            FieldEvent::AddAppend { legend: "g".to_string(), field: "b".to_string() },
            FieldEvent::AddPositioned {
                legend: "g".to_string(),
                field: "c".to_string(),
                position: Position::Before,
                anchor: "b".to_string(),
            },
        ];
        for event in &events {
            dispatch_field(&mut recorder, event);
        }

        let recorded: Vec<Event> = events.into_iter().map(Event::Field).collect();
        assert_eq!(recorder.events(), recorded.as_slice());
    }

    #[test]
    fn test_event_json_shape() {
        let start = serde_json::to_value(Event::Start {
            table: "tl_news".to_string(),
            palette: "default".to_string(),
        })
        .unwrap();
        assert_eq!(start["event"], "start");
        assert_eq!(start["palette"], "default");

        let field = serde_json::to_value(Event::Field(FieldEvent::Remove {
            legend: "g".to_string(),
            field: "a".to_string(),
        }))
        .unwrap();
        assert_eq!(field["event"], "field");
        assert_eq!(field["action"], "remove");

        let finish = serde_json::to_value(Event::Finish).unwrap();
        assert_eq!(finish["event"], "finish");
    }
}
