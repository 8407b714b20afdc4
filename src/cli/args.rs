//! CLI argument definitions using clap
//!
//! Commands:
//! - telequel tables
//! - telequel query --config <path> --table <name> [--filter ...] [--sort ...]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// telequel - query a telemetry data API as tables
#[derive(Parser, Debug)]
#[command(name = "telequel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the available tables
    Tables,

    /// Run one table scan and print rows as JSON lines
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./telequel.json")]
        config: PathBuf,

        /// Table to scan
        #[arg(long)]
        table: String,

        /// Filter in `column<op>value` form; ops: =, >, >=, <, <=, @>
        /// (repeatable, AND semantics)
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Sort as `column` or `column:desc`
        #[arg(long)]
        sort: Option<String>,

        /// Cap on emitted rows
        #[arg(long)]
        limit: Option<u64>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
