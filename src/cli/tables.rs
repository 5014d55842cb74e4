//! `mpal tables` - list tables, palettes and parent chains

use std::path::Path;
use std::process::ExitCode;

use crate::config::CliOverrides;
use crate::definitions::DefinitionProvider;
use crate::resolver::PreparedTable;

use super::{load_definitions, load_settings, EXIT_SUCCESS};

/// Execute the tables command
pub fn run_tables(config_path: Option<&Path>, overrides: &CliOverrides) -> ExitCode {
    let config = match load_settings(config_path, overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let definitions = match load_definitions(&config) {
        Ok(definitions) => definitions,
        Err(code) => return code,
    };

    for table in definitions.tables() {
        println!("{}", table);
        let Some(raw) = definitions.lookup(table) else {
            continue;
        };
        for palette in PreparedTable::from_raw(raw).palettes() {
            if palette.parents.is_empty() {
                println!("  {}", palette.name);
            } else {
                println!("  {} <- {}", palette.name, palette.parents.join(", "));
            }
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}
