//! CLI module for kvmodel
//!
//! Provides command-line access to:
//! - save: validate and persist one record
//! - get: run a generated accessor
//! - delete: remove a record's unique index entries
//! - accessors: list generated accessors
//! - demo: a self-contained walkthrough

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{accessors, delete, demo, get, run_command, save, Config, Workspace};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_response};

/// Parse arguments and run the selected command
pub async fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command).await
}
