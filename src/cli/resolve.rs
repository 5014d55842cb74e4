//! Resolution command implementations (resolve, events)

use std::path::Path;
use std::process::ExitCode;

use crate::builder::{PaletteBuilder, ResolvedPalette};
use crate::config::{CliOverrides, OutputFormat};
use crate::interpreter::{EventRecorder, Interpreter};
use crate::resolver::{ResolveError, Resolver};

use super::{load_definitions, load_settings, EXIT_ERROR, EXIT_SUCCESS};

/// Outcome of running the resolver for a command.
enum Outcome {
    Resolved,
    NoDefinitions,
}

fn resolve_into<I: Interpreter>(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    table: &str,
    palette: Option<&str>,
    interpreter: &mut I,
) -> Result<(Outcome, OutputFormat), ExitCode> {
    let config = load_settings(config_path, overrides)?;
    let definitions = load_definitions(&config)?;
    let mut resolver = Resolver::with_options(&definitions, config.resolver.options());

    let result: Result<Outcome, ResolveError> = match palette {
        Some(name) => resolver.resolve_palette(table, name, interpreter).map(|()| Outcome::Resolved),
        None => resolver.resolve(table, interpreter).map(|found| {
            if found {
                Outcome::Resolved
            } else {
                Outcome::NoDefinitions
            }
        }),
    };

    match result {
        Ok(outcome) => Ok((outcome, config.output.format)),
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(ExitCode::from(EXIT_ERROR))
        }
    }
}

/// Render palettes as indented text, one legend per line.
pub fn format_palettes_text<'a>(palettes: impl IntoIterator<Item = &'a ResolvedPalette>) -> String {
    let mut out = String::new();
    for palette in palettes {
        out.push_str(&palette.name);
        out.push('\n');
        for legend in &palette.legends {
            let marker = if legend.hidden { " (hidden)" } else { "" };
            out.push_str(&format!("  {}{}: {}\n", legend.name, marker, legend.fields.join(", ")));
        }
    }
    out
}

/// Execute the resolve command
pub fn run_resolve(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    table: &str,
    palette: Option<&str>,
) -> ExitCode {
    let mut builder = PaletteBuilder::new();
    let format = match resolve_into(config_path, overrides, table, palette, &mut builder) {
        Ok((Outcome::Resolved, format)) => format,
        Ok((Outcome::NoDefinitions, _)) => {
            eprintln!("No meta palettes defined for table '{}'", table);
            return ExitCode::from(EXIT_SUCCESS);
        }
        Err(code) => return code,
    };

    let palettes = builder.into_palettes();
    match format {
        OutputFormat::Text => print!("{}", format_palettes_text(palettes.values())),
        OutputFormat::Json => {
            let list: Vec<&ResolvedPalette> = palettes.values().collect();
            match serde_json::to_string_pretty(&list) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::from(EXIT_ERROR);
                }
            }
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the events command
pub fn run_events(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    table: &str,
    palette: Option<&str>,
) -> ExitCode {
    let mut recorder = EventRecorder::new();
    match resolve_into(config_path, overrides, table, palette, &mut recorder) {
        Ok((Outcome::Resolved, _)) => {}
        Ok((Outcome::NoDefinitions, _)) => {
            eprintln!("No meta palettes defined for table '{}'", table);
            return ExitCode::from(EXIT_SUCCESS);
        }
        Err(code) => return code,
    }

    match serde_json::to_string_pretty(recorder.events()) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ResolvedLegend;

    #[test]
    fn test_format_palettes_text() {
        let palette = ResolvedPalette {
            name: "extended".to_string(),
            legends: vec![
                ResolvedLegend {
                    name: "general".to_string(),
                    hidden: false,
                    fields: vec!["title".to_string(), "date".to_string()],
                },
                ResolvedLegend {
                    name: "meta".to_string(),
                    hidden: true,
                    fields: vec!["robots".to_string()],
                },
            ],
        };

        assert_eq!(
            format_palettes_text([&palette]),
            "extended\n  general: title, date\n  meta (hidden): robots\n"
        );
    }
}
