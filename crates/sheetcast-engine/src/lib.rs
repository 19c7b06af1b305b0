//! sheetcast_engine - Spreadsheet engine + Rhai integration.

pub(crate) mod builtins;
pub mod engine;
