//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`Cell`], [`CellType`], [`Grid`], [`GridSize`] - Data structures for cell storage
//! - [`CellRef`], [`column_name`], [`column_index`] - Label ↔ row/col conversion
//! - [`detect_cycle`] - Circular dependency detection
//! - [`extract_dependencies`] - Parse formula dependencies
//! - [`preprocess_formula`] - Transform formulas for Rhai evaluation
//! - [`create_engine`], [`evaluate`], [`evaluate_cell`] - Formula evaluation
//! - [`parse_number`], [`format_number`] - Canonical numeric text

mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod eval;
mod format;
mod preprocess;

pub use cell::{Cell, CellType, Grid, GridSize, new_grid};
pub use cell_ref::{CellRef, InvalidReference, column_index, column_name};
pub use cycle::detect_cycle;
pub use deps::{extract_dependencies, parse_range};
pub use eval::{create_engine, eval_formula, evaluate, evaluate_cell};
pub use format::{ERROR_VALUE, format_dynamic, format_number, parse_number, to_percent};
pub use preprocess::preprocess_formula;

pub use rhai::{Dynamic, Engine};
