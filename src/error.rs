//! Error types for the sheetcast binary

use std::path::PathBuf;
use thiserror::Error;

/// Errors from argument parsing and configuration loading.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),
}
