use sheetcast_engine::engine::{Cell, CellRef, GridSize};
use std::collections::BTreeMap;

use crate::storage::encode_cells;

/// An immutable copy of a sheet's cells, detached from the live grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub name: String,
    pub size: GridSize,
    cells: BTreeMap<CellRef, Cell>,
}

impl Snapshot {
    pub fn new(
        name: &str,
        size: GridSize,
        cells: impl IntoIterator<Item = (CellRef, Cell)>,
    ) -> Self {
        Snapshot {
            name: name.to_string(),
            size,
            cells: cells.into_iter().collect(),
        }
    }

    /// Cell at a position; absent cells read as empty.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells
            .get(&CellRef::new(col, row))
            .cloned()
            .unwrap_or_default()
    }

    /// Non-empty cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (&CellRef, &Cell)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Transport payload for these cells.
    pub fn payload(&self) -> String {
        encode_cells(self.cells.iter())
    }
}
