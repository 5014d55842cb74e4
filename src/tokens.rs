//! Legend and field token grammar
//!
//! Tokens are small directive strings found in palette definitions:
//! - Legend token: `[+-]? legend`
//! - Field token: `[+-]? field` or `[+-]? field (before|after) anchor`
//! - Reserved field tokens start with `:`. Only `:hide` has a meaning; it
//!   hides the legend and is never turned into a field event.
//!
//! Everything here is pure: parsing a legend produces the events to emit,
//! and the resolver forwards them to its consumer.
//!
//! # Example
//!
//! ```
//! use metapalettes::models::{FieldEvent, Hide, InsertMode, Position};
//! use metapalettes::tokens::{extract_mode, parse_legend};
//!
//! assert_eq!(extract_mode("+main", InsertMode::Override), (InsertMode::Add, "main"));
//!
//! let fields = vec!["title before alias".to_string(), ":hide".to_string()];
//! let parsed = parse_legend("general", &fields, false);
//! assert_eq!(parsed.event.hide, Hide::Hidden);
//! assert_eq!(
//!     parsed.fields,
//!     vec![FieldEvent::AddPositioned {
//!         legend: "general".to_string(),
//!         field: "title".to_string(),
//!         position: Position::Before,
//!         anchor: "alias".to_string(),
//!     }]
//! );
//! ```

use log::trace;
use regex::Regex;
use std::sync::OnceLock;

use crate::models::{FieldEvent, Hide, InsertMode, LegendEvent, Position};

/// Field token that hides its legend.
pub const HIDE_MARKER: &str = ":hide";

/// Prefix of reserved field tokens.
pub const RESERVED_PREFIX: char = ':';

fn placement_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9_]+) (before|after) ([A-Za-z0-9_]+)$").expect("placement pattern is valid")
    })
}

/// Split the insert mode marker off a token.
///
/// `+` yields [`InsertMode::Add`], `-` yields [`InsertMode::Remove`]; the
/// marker is stripped in both cases. Any other token is returned untouched
/// together with `default`.
pub fn extract_mode(token: &str, default: InsertMode) -> (InsertMode, &str) {
    if let Some(rest) = token.strip_prefix('+') {
        (InsertMode::Add, rest)
    } else if let Some(rest) = token.strip_prefix('-') {
        (InsertMode::Remove, rest)
    } else {
        (default, token)
    }
}

/// Whether a field token belongs to the reserved `:` namespace.
pub fn is_reserved(token: &str) -> bool {
    token.starts_with(RESERVED_PREFIX)
}

/// Match `field (before|after) anchor`.
///
/// Returns `None` for anything else, including tokens with extra spaces;
/// such tokens are plain field names.
pub fn parse_placement(body: &str) -> Option<(&str, Position, &str)> {
    let caps = placement_pattern().captures(body)?;
    let field = caps.get(1)?.as_str();
    let position = match caps.get(2)?.as_str() {
        "before" => Position::Before,
        _ => Position::After,
    };
    let anchor = caps.get(3)?.as_str();
    Some((field, position, anchor))
}

/// A legend token and its field tokens turned into events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLegend {
    pub event: LegendEvent,
    pub fields: Vec<FieldEvent>,
}

/// Parse one legend entry of a palette definition.
///
/// `is_ancestor` is true while the legend is being replayed as part of an
/// inherited palette. Ancestor legends carrying a `+`/`-` marker do not
/// override, and unless they are explicitly hidden they leave the
/// visibility of the legend unspecified.
pub fn parse_legend(legend_token: &str, field_tokens: &[String], is_ancestor: bool) -> ParsedLegend {
    let hidden = field_tokens.iter().any(|token| token == HIDE_MARKER);
    let (mode, legend) = extract_mode(legend_token, InsertMode::Override);

    let override_fields = !is_ancestor || mode == InsertMode::Override;
    let hide = if override_fields || hidden { Hide::from(hidden) } else { Hide::Unspecified };

    let fields = field_tokens
        .iter()
        .filter(|token| {
            let reserved = is_reserved(token);
            if reserved && token.as_str() != HIDE_MARKER {
                trace!("Dropping reserved token '{}' in legend '{}'", token, legend);
            }
            !reserved
        })
        .map(|token| parse_field(legend, token, mode))
        .collect();

    ParsedLegend {
        event: LegendEvent { legend: legend.to_string(), override_fields, hide },
        fields,
    }
}

/// Parse a single, non-reserved field token of `legend`.
///
/// Fields inherit the legend's mode unless they carry their own marker.
pub fn parse_field(legend: &str, token: &str, legend_mode: InsertMode) -> FieldEvent {
    let (mode, body) = extract_mode(token, legend_mode);

    if mode == InsertMode::Remove {
        return FieldEvent::Remove { legend: legend.to_string(), field: body.to_string() };
    }

    match parse_placement(body) {
        Some((field, position, anchor)) => FieldEvent::AddPositioned {
            legend: legend.to_string(),
            field: field.to_string(),
            position,
            anchor: anchor.to_string(),
        },
        None => FieldEvent::AddAppend { legend: legend.to_string(), field: body.to_string() },
    }
}
