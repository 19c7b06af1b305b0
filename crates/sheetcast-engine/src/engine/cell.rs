//! Cell data structures for the spreadsheet grid.
//!
//! - [`CellType`] - Classification of a cell's raw input
//! - [`Cell`] - Raw input text plus the last computed display value
//! - [`Grid`] - Thread-safe sparse storage for non-empty cells (backed by `DashMap`)
//! - [`GridSize`] - Fixed sheet dimensions used for bounds checks

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::cell_ref::CellRef;

/// How a cell's raw input is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellType {
    Empty,
    Literal,
    Formula,
}

/// A cell in the spreadsheet grid.
///
/// `raw` is exactly what the user entered; `value` is what the cell
/// displays (the literal itself, or the last evaluation of the formula).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub raw: String,
    pub value: String,
}

impl Cell {
    pub fn new_empty() -> Cell {
        Cell::default()
    }

    /// A literal cell: value is the input passed through untouched.
    pub fn new_literal(text: &str) -> Cell {
        Cell {
            raw: text.to_string(),
            value: text.to_string(),
        }
    }

    /// A formula cell awaiting evaluation. `formula` includes the leading `=`.
    pub fn new_formula(formula: &str) -> Cell {
        Cell {
            raw: formula.to_string(),
            value: String::new(),
        }
    }

    /// Classify user input without any numeric normalization.
    /// - Empty string -> Empty
    /// - Starts with '=' -> Formula
    /// - Otherwise -> Literal
    pub fn from_input(input: &str) -> Cell {
        if input.is_empty() {
            Cell::new_empty()
        } else if input.starts_with('=') {
            Cell::new_formula(input)
        } else {
            Cell::new_literal(input)
        }
    }

    pub fn kind(&self) -> CellType {
        if self.raw.is_empty() {
            CellType::Empty
        } else if self.is_formula() {
            CellType::Formula
        } else {
            CellType::Literal
        }
    }

    pub fn is_formula(&self) -> bool {
        self.raw.starts_with('=')
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Formula body without the leading `=`, if this is a formula cell.
    pub fn formula(&self) -> Option<&str> {
        self.raw.strip_prefix('=')
    }
}

/// Thread-safe sparse grid storage. Only non-empty cells are present.
pub type Grid = Arc<DashMap<CellRef, Cell>>;

/// Create an empty grid.
pub fn new_grid() -> Grid {
    Arc::new(DashMap::new())
}

/// Fixed dimensions of a sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: usize,
    pub cols: usize,
}

impl GridSize {
    pub const fn new(rows: usize, cols: usize) -> GridSize {
        GridSize { rows, cols }
    }

    pub fn contains(&self, cell: &CellRef) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }
}

impl Default for GridSize {
    fn default() -> Self {
        GridSize::new(100, 100)
    }
}
