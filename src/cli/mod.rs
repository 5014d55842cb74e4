//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod resolve;
mod tables;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{load_config, merge_cli_overrides, CliOverrides, MpalConfig, OutputFormat};
use crate::definitions::DefinitionSet;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Metapalettes - resolve inheriting legend/field palette definitions
#[derive(Parser)]
#[command(name = "mpal")]
#[command(about = "Metapalettes - resolve inheriting palette definitions (.json, .toml)")]
#[command(version)]
pub struct Cli {
    /// Path to mpal.toml (default: search upwards from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the palettes of a table and print the merged result
    Resolve {
        /// Definition files (.json or .toml); defaults to [definitions] paths
        files: Vec<PathBuf>,

        /// Table whose palettes are resolved
        #[arg(short, long)]
        table: String,

        /// Only resolve the palette with this name
        #[arg(short, long)]
        palette: Option<String>,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Do not detect cyclic inheritance
        #[arg(long)]
        allow_cycles: bool,
    },
    /// Print the resolver's event stream for a table as JSON
    Events {
        /// Definition files (.json or .toml); defaults to [definitions] paths
        files: Vec<PathBuf>,

        /// Table whose palettes are resolved
        #[arg(short, long)]
        table: String,

        /// Only resolve the palette with this name
        #[arg(short, long)]
        palette: Option<String>,

        /// Do not detect cyclic inheritance
        #[arg(long)]
        allow_cycles: bool,
    },
    /// List tables, palettes and their parent chains
    Tables {
        /// Definition files (.json or .toml); defaults to [definitions] paths
        files: Vec<PathBuf>,
    },
}

/// Output format accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    // A logger may already be installed when run from tests.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

/// Load mpal.toml and apply command line overrides.
pub(crate) fn load_settings(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<MpalConfig, ExitCode> {
    match load_config(config_path) {
        Ok(config) => Ok(merge_cli_overrides(config, overrides)),
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(ExitCode::from(EXIT_ERROR))
        }
    }
}

/// Load the definition files named by the settings.
pub(crate) fn load_definitions(config: &MpalConfig) -> Result<DefinitionSet, ExitCode> {
    if config.definitions.paths.is_empty() {
        eprintln!("Error: No definition files given and none configured in mpal.toml");
        return Err(ExitCode::from(EXIT_INVALID_ARGS));
    }

    DefinitionSet::load_files(&config.definitions.paths).map_err(|e| {
        eprintln!("Error: {}", e);
        ExitCode::from(EXIT_ERROR)
    })
}

/// Run the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Resolve { files, table, palette, format, allow_cycles } => {
            let overrides = CliOverrides {
                definitions: files,
                detect_cycles: allow_cycles.then_some(false),
                format: format.map(OutputFormat::from),
            };
            resolve::run_resolve(config_path, &overrides, &table, palette.as_deref())
        }
        Commands::Events { files, table, palette, allow_cycles } => {
            let overrides = CliOverrides {
                definitions: files,
                detect_cycles: allow_cycles.then_some(false),
                format: None,
            };
            resolve::run_events(config_path, &overrides, &table, palette.as_deref())
        }
        Commands::Tables { files } => {
            let overrides = CliOverrides { definitions: files, ..Default::default() };
            tables::run_tables(config_path, &overrides)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve_command() {
        let cli = Cli::try_parse_from([
            "mpal", "-v", "resolve", "news.json", "--table", "tl_news", "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Resolve { files, table, palette, format, allow_cycles } => {
                assert_eq!(files, vec![PathBuf::from("news.json")]);
                assert_eq!(table, "tl_news");
                assert_eq!(palette, None);
                assert_eq!(format, Some(FormatArg::Json));
                assert!(!allow_cycles);
            }
            _ => panic!("expected resolve command"),
        }
    }

    #[test]
    fn test_resolve_requires_table() {
        assert!(Cli::try_parse_from(["mpal", "resolve", "news.json"]).is_err());
    }

    #[test]
    fn test_load_definitions_without_paths() {
        let config = MpalConfig::default();
        assert!(load_definitions(&config).is_err());
    }
}
