//! CLI argument definitions using clap
//!
//! Commands:
//! - kvmodel save --config <path> --entity <name> [--data <json>]
//! - kvmodel get --config <path> --entity <name> --accessor <byX> --value <v>
//! - kvmodel delete --config <path> --entity <name> --id <id>
//! - kvmodel accessors --config <path> --entity <name>
//! - kvmodel demo [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// kvmodel - schema-driven records and indexes over an ordered key-value store
#[derive(Parser, Debug)]
#[command(name = "kvmodel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate and save one record
    Save {
        /// Path to configuration file
        #[arg(long, default_value = "./kvmodel.json")]
        config: PathBuf,

        /// Entity name
        #[arg(long)]
        entity: String,

        /// Record as a JSON object; read from stdin when omitted
        #[arg(long)]
        data: Option<String>,
    },

    /// Run a generated accessor
    Get {
        /// Path to configuration file
        #[arg(long, default_value = "./kvmodel.json")]
        config: PathBuf,

        /// Entity name
        #[arg(long)]
        entity: String,

        /// Accessor name, e.g. byName
        #[arg(long, default_value = "byId")]
        accessor: String,

        /// Lookup value; parsed as JSON when possible, else taken as a string
        #[arg(long)]
        value: String,
    },

    /// Remove the unique index entries of a saved record
    Delete {
        /// Path to configuration file
        #[arg(long, default_value = "./kvmodel.json")]
        config: PathBuf,

        /// Entity name
        #[arg(long)]
        entity: String,

        /// Record id
        #[arg(long)]
        id: String,
    },

    /// List the generated accessors of an entity
    Accessors {
        /// Path to configuration file
        #[arg(long, default_value = "./kvmodel.json")]
        config: PathBuf,

        /// Entity name
        #[arg(long)]
        entity: String,
    },

    /// Define `user`, save `julian`, and look it up by name
    Demo {
        /// Run against the configured store instead of an in-memory one
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
