//! Error types for Sheetcast core.

use thiserror::Error;

use sheetcast_engine::engine::InvalidReference;

/// Errors that can occur in the sheet model and sync layer.
///
/// Formula problems are not errors here: they show up as the `"Error"`
/// cell value.
#[derive(Error, Debug)]
pub enum SheetcastError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Cell ({row}, {col}) is outside the {rows}x{cols} sheet")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error(transparent)]
    InvalidReference(#[from] InvalidReference),

    #[error("Malformed payload entry {entry}: {message}")]
    MalformedPayload { entry: usize, message: String },

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Sheet already exists: {0}")]
    SheetExists(String),

    #[error("Sheet name cannot be blank")]
    BlankSheetName,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Unauthorized: sender is not owner of sheet")]
    NotOwner,

    #[error("Nothing to paste")]
    NothingToPaste,

    #[error("Request rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, SheetcastError>;
