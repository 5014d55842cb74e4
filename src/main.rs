//! Metapalettes - command-line tool for resolving meta palette definitions

use std::process::ExitCode;

use metapalettes::cli;

fn main() -> ExitCode {
    cli::run()
}
