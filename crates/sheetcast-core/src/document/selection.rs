//! Rectangular cell selections.

use sheetcast_engine::engine::{CellRef, parse_range};

const MAX_PREALLOCATED_CELLS: usize = 4096;

/// A rectangle of selected cells, or nothing selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Empty,
    Range {
        start_row: usize,
        end_row: usize,
        start_col: usize,
        end_col: usize,
    },
}

impl Selection {
    /// Build the bounding rectangle of the selected row and column indices.
    /// Either list being empty means nothing is selected.
    pub fn from_indices(rows: &[usize], cols: &[usize]) -> Selection {
        let (Some(start_row), Some(end_row)) = (rows.iter().min(), rows.iter().max()) else {
            return Selection::Empty;
        };
        let (Some(start_col), Some(end_col)) = (cols.iter().min(), cols.iter().max()) else {
            return Selection::Empty;
        };
        Selection::Range {
            start_row: *start_row,
            end_row: *end_row,
            start_col: *start_col,
            end_col: *end_col,
        }
    }

    pub fn single(row: usize, col: usize) -> Selection {
        Selection::Range {
            start_row: row,
            end_row: row,
            start_col: col,
            end_col: col,
        }
    }

    /// Parse a label range such as `A1:C3` (corners in any order).
    pub fn from_labels(range: &str) -> Option<Selection> {
        let (c1, r1, c2, r2) = parse_range(range)?;
        Some(Selection::from_indices(&[r1, r2], &[c1, c2]))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::Empty)
    }

    pub fn is_single(&self) -> bool {
        match self {
            Selection::Empty => false,
            Selection::Range {
                start_row,
                end_row,
                start_col,
                end_col,
            } => start_row == end_row && start_col == end_col,
        }
    }

    /// Top-left and bottom-right corners, or None when nothing is selected.
    pub fn corners(&self) -> Option<(CellRef, CellRef)> {
        match *self {
            Selection::Empty => None,
            Selection::Range {
                start_row,
                end_row,
                start_col,
                end_col,
            } => Some((
                CellRef::new(start_col, start_row),
                CellRef::new(end_col, end_row),
            )),
        }
    }

    /// Number of selected cells, or None if it does not fit in a `usize`.
    pub fn cell_count(&self) -> Option<usize> {
        let Some((start, end)) = self.corners() else {
            return Some(0);
        };
        let rows = (end.row - start.row).checked_add(1)?;
        let cols = (end.col - start.col).checked_add(1)?;
        rows.checked_mul(cols)
    }

    /// Selected cells in row-major order.
    ///
    /// Check [`Selection::corners`] against the sheet before calling this.
    pub fn cells(&self) -> Vec<CellRef> {
        let Selection::Range {
            start_row,
            end_row,
            start_col,
            end_col,
        } = *self
        else {
            return Vec::new();
        };
        let capacity = self.cell_count().unwrap_or(0).min(MAX_PREALLOCATED_CELLS);
        let mut cells = Vec::with_capacity(capacity);
        for row in start_row..=end_row {
            for col in start_col..=end_col {
                cells.push(CellRef::new(col, row));
            }
        }
        cells
    }
}
