//! CLI-specific error types

use thiserror::Error;

use crate::config::ConfigError;
use crate::table::QueryError;
use crate::transport::TransportError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("bad filter '{0}': expected column<op>value with op one of =, >, >=, <, <=, @>")]
    BadFilter(String),

    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),
}
