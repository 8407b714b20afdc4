//! Command-line interface
//!
//! Commands:
//! - tables: list the table catalog
//! - query: one-shot table scan printed as JSON lines

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::run;
pub use errors::{CliError, CliResult};
