//! Data types shared by the token grammar, the resolver and its consumers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Legend token -> ordered field tokens, as written in a palette definition.
pub type LegendDefinition = IndexMap<String, Vec<String>>;

/// Palette-name-string (`"name extends parent"`) -> legend definition.
///
/// Declaration order is significant: palettes are resolved and legends are
/// emitted in the order they appear here.
pub type RawPaletteSet = IndexMap<String, LegendDefinition>;

/// Insert mode derived from the leading `+`/`-` of a legend or field token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertMode {
    /// `+` prefix
    Add,
    /// `-` prefix
    Remove,
    /// No prefix on a legend token
    Override,
}

/// Where a positioned field goes relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Before,
    After,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Before => "before",
            Position::After => "after",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is neither `before` nor `after`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown position '{0}', expected 'before' or 'after'")]
pub struct UnknownPosition(pub String);

impl FromStr for Position {
    type Err = UnknownPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(Position::Before),
            "after" => Ok(Position::After),
            other => Err(UnknownPosition(other.to_string())),
        }
    }
}

/// Visibility directive attached to a legend event.
///
/// `Unspecified` means "leave the inherited visibility alone", which is
/// distinct from explicitly showing the legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hide {
    Hidden,
    Visible,
    #[default]
    Unspecified,
}

impl Hide {
    /// `Some(true)` for hidden, `Some(false)` for visible, `None` otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Hide::Hidden => Some(true),
            Hide::Visible => Some(false),
            Hide::Unspecified => None,
        }
    }

    /// Apply the directive to a current visibility.
    pub fn apply(&self, hidden: bool) -> bool {
        self.as_bool().unwrap_or(hidden)
    }
}

impl From<bool> for Hide {
    fn from(hidden: bool) -> Self {
        if hidden {
            Hide::Hidden
        } else {
            Hide::Visible
        }
    }
}

/// A legend announcement, emitted before the legend's field events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEvent {
    pub legend: String,
    /// True for every legend of the palette being built and for ancestor
    /// legends written without a `+`/`-` marker.
    #[serde(rename = "override")]
    pub override_fields: bool,
    pub hide: Hide,
}

/// A single field directive inside a legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FieldEvent {
    Remove {
        legend: String,
        field: String,
    },
    AddAppend {
        legend: String,
        field: String,
    },
    AddPositioned {
        legend: String,
        field: String,
        position: Position,
        anchor: String,
    },
}

impl FieldEvent {
    /// Legend the event applies to.
    pub fn legend(&self) -> &str {
        match self {
            FieldEvent::Remove { legend, .. }
            | FieldEvent::AddAppend { legend, .. }
            | FieldEvent::AddPositioned { legend, .. } => legend,
        }
    }

    /// Field the event applies to.
    pub fn field(&self) -> &str {
        match self {
            FieldEvent::Remove { field, .. }
            | FieldEvent::AddAppend { field, .. }
            | FieldEvent::AddPositioned { field, .. } => field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_from_str() {
        assert_eq!("before".parse::<Position>(), Ok(Position::Before));
        assert_eq!("after".parse::<Position>(), Ok(Position::After));
        assert_eq!("Before".parse::<Position>(), Err(UnknownPosition("Before".to_string())));
    }

    #[test]
    fn test_hide_tri_state() {
        assert_eq!(Hide::from(true), Hide::Hidden);
        assert_eq!(Hide::from(false), Hide::Visible);
        assert_eq!(Hide::Hidden.as_bool(), Some(true));
        assert_eq!(Hide::Visible.as_bool(), Some(false));
        assert_eq!(Hide::Unspecified.as_bool(), None);
        assert_eq!(Hide::default(), Hide::Unspecified);
    }

    #[test]
    fn test_hide_apply() {
        assert!(Hide::Hidden.apply(false));
        assert!(!Hide::Visible.apply(true));
        assert!(Hide::Unspecified.apply(true));
        assert!(!Hide::Unspecified.apply(false));
    }

    #[test]
    fn test_field_event_serializes_with_action_tag() {
        let event = FieldEvent::AddPositioned {
            legend: "general".to_string(),
            field: "date".to_string(),
            position: Position::After,
            anchor: "title".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "add_positioned");
        assert_eq!(json["position"], "after");
        assert_eq!(event.legend(), "general");
        assert_eq!(event.field(), "date");
    }

    #[test]
    fn test_legend_event_serializes_override_key() {
        let event =
            LegendEvent { legend: "general".to_string(), override_fields: true, hide: Hide::Hidden };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["override"], true);
        assert_eq!(json["hide"], "hidden");
    }
}
