use sheetcast_engine::engine::{
    CellRef, Engine, Grid, GridSize, create_engine, extract_dependencies, new_grid,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::Snapshot;

/// A named, fixed-size sheet with its own evaluator and version lists.
pub struct Sheet {
    pub name: String,
    pub size: GridSize,
    /// Non-empty cells (DashMap is internally Arc-based, clones are cheap)
    pub grid: Grid,
    /// Rhai engine bound to `grid`
    pub engine: Engine,
    /// Reverse dependency map: cell -> cells whose formulas name it
    pub dependents: HashMap<CellRef, HashSet<CellRef>>,
    /// Snapshots this side has published, oldest first
    pub published: Vec<Arc<Snapshot>>,
    /// Snapshots received from the other side, oldest first
    pub subscribed: Vec<Arc<Snapshot>>,
    /// Whether the sheet changed since it was last saved
    pub modified: bool,
}

impl Sheet {
    /// Create an empty sheet. Side-effect free.
    pub fn new(name: &str, rows: usize, cols: usize) -> Self {
        Self::with_size(name, GridSize::new(rows, cols))
    }

    pub fn with_size(name: &str, size: GridSize) -> Self {
        let grid = new_grid();
        let engine = create_engine(grid.clone(), size);
        Sheet {
            name: name.to_string(),
            size,
            grid,
            engine,
            dependents: HashMap::new(),
            published: Vec::new(),
            subscribed: Vec::new(),
            modified: false,
        }
    }

    pub fn rows(&self) -> usize {
        self.size.rows
    }

    pub fn cols(&self) -> usize {
        self.size.cols
    }

    /// Number of non-empty cells.
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Rebuild the reverse dependency map from the grid.
    /// Call this after cells are added, removed, or their formulas change.
    pub(crate) fn rebuild_dependents(&mut self) {
        self.dependents.clear();
        for entry in self.grid.iter() {
            let Some(formula) = entry.value().formula() else {
                continue;
            };
            for dep in extract_dependencies(formula) {
                self.dependents
                    .entry(dep)
                    .or_default()
                    .insert(entry.key().clone());
            }
        }
    }

    /// Move one cell's edges in the reverse dependency map from its old
    /// formula to its new one. Bulk writes use [`Sheet::rebuild_dependents`].
    pub(crate) fn update_dependents(
        &mut self,
        cell_ref: &CellRef,
        old_formula: Option<&str>,
        new_formula: Option<&str>,
    ) {
        for dep in old_formula.map(extract_dependencies).unwrap_or_default() {
            if let Some(dependents) = self.dependents.get_mut(&dep) {
                dependents.remove(cell_ref);
                if dependents.is_empty() {
                    self.dependents.remove(&dep);
                }
            }
        }
        for dep in new_formula.map(extract_dependencies).unwrap_or_default() {
            self.dependents.entry(dep).or_default().insert(cell_ref.clone());
        }
    }
}

impl std::fmt::Debug for Sheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sheet")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("cells", &self.grid.len())
            .field("published", &self.published.len())
            .field("subscribed", &self.subscribed.len())
            .field("modified", &self.modified)
            .finish()
    }
}
