use super::{Selection, Sheet};
use crate::error::{Result, SheetcastError};
use sheetcast_engine::engine::{
    Cell, CellRef, ERROR_VALUE, evaluate, evaluate_cell, extract_dependencies,
};
use std::collections::{BTreeSet, HashMap, HashSet};

impl Sheet {
    /// Validate a position against the sheet's dimensions.
    pub fn check_bounds(&self, row: usize, col: usize) -> Result<CellRef> {
        let cell_ref = CellRef::new(col, row);
        if !self.size.contains(&cell_ref) {
            return Err(SheetcastError::OutOfBounds {
                row,
                col,
                rows: self.size.rows,
                cols: self.size.cols,
            });
        }
        Ok(cell_ref)
    }

    /// Cell at a position; positions never written read as empty.
    pub fn get(&self, row: usize, col: usize) -> Result<Cell> {
        let cell_ref = self.check_bounds(row, col)?;
        Ok(self
            .grid
            .get(&cell_ref)
            .map(|c| c.clone())
            .unwrap_or_default())
    }

    pub fn get_by_label(&self, label: &str) -> Result<Cell> {
        let cell_ref = CellRef::parse(label)?;
        self.get(cell_ref.row, cell_ref.col)
    }

    /// Display value at a position.
    pub fn value(&self, row: usize, col: usize) -> Result<String> {
        Ok(self.get(row, col)?.value)
    }

    /// Replace only the raw text. Nothing is re-evaluated.
    pub fn set_raw(&mut self, row: usize, col: usize, text: &str) -> Result<()> {
        let cell_ref = self.check_bounds(row, col)?;
        let mut cell = self.grid.get(&cell_ref).map(|c| c.clone()).unwrap_or_default();
        cell.raw = text.to_string();
        self.replace_cell(cell_ref, cell);
        self.modified = true;
        Ok(())
    }

    /// Replace only the display value. Nothing is re-evaluated.
    pub fn set_value(&mut self, row: usize, col: usize, text: &str) -> Result<()> {
        let cell_ref = self.check_bounds(row, col)?;
        let mut cell = self.grid.get(&cell_ref).map(|c| c.clone()).unwrap_or_default();
        cell.value = text.to_string();
        self.store(cell_ref, cell);
        self.modified = true;
        Ok(())
    }

    /// Write user input to a cell and recalculate everything that depends on it.
    ///
    /// Formulas are evaluated against the current grid, empty input clears
    /// the cell, anything else is stored as-is.
    pub fn write(&mut self, row: usize, col: usize, input: &str) -> Result<()> {
        let cell_ref = self.check_bounds(row, col)?;
        self.replace_cell(cell_ref.clone(), Cell::from_input(input));
        self.recalculate_from(std::slice::from_ref(&cell_ref));
        self.modified = true;
        Ok(())
    }

    pub fn write_label(&mut self, label: &str, input: &str) -> Result<()> {
        let cell_ref = CellRef::parse(label)?;
        self.write(cell_ref.row, cell_ref.col, input)
    }

    pub fn clear(&mut self, row: usize, col: usize) -> Result<()> {
        self.write(row, col, "")
    }

    /// Evaluate a formula against the sheet without storing it.
    pub fn evaluate(&self, formula: &str) -> String {
        evaluate(&self.engine, formula)
    }

    /// Write the same input to every selected cell.
    pub fn fill_selection(&mut self, selection: &Selection, input: &str) -> Result<()> {
        let Some((_, end)) = selection.corners() else {
            return Ok(());
        };
        self.check_bounds(end.row, end.col)?;
        let cells = selection.cells();
        for cell_ref in &cells {
            self.replace_cell(cell_ref.clone(), Cell::from_input(input));
        }
        self.recalculate_from(&cells);
        self.modified = true;
        Ok(())
    }

    pub fn clear_selection(&mut self, selection: &Selection) -> Result<()> {
        self.fill_selection(selection, "")
    }

    /// Non-empty cells in row-major order.
    pub fn cells(&self) -> Vec<(CellRef, Cell)> {
        let mut cells: Vec<(CellRef, Cell)> = self
            .grid
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        cells.sort_by(|a, b| a.0.cmp(&b.0));
        cells
    }

    /// Insert a cell, or drop it from the sparse grid once fully blank.
    pub(crate) fn store(&self, cell_ref: CellRef, cell: Cell) {
        if cell.raw.is_empty() && cell.value.is_empty() {
            self.grid.remove(&cell_ref);
        } else {
            self.grid.insert(cell_ref, cell);
        }
    }

    /// Store one cell and patch only its dependency edges.
    fn replace_cell(&mut self, cell_ref: CellRef, cell: Cell) {
        let old_formula = self
            .grid
            .get(&cell_ref)
            .and_then(|c| c.formula().map(str::to_string));
        let new_formula = cell.formula().map(str::to_string);
        self.store(cell_ref.clone(), cell);
        self.update_dependents(&cell_ref, old_formula.as_deref(), new_formula.as_deref());
    }

    /// Re-evaluate every formula in the sheet.
    pub fn recalculate_all(&mut self) {
        let formulas: BTreeSet<CellRef> = self
            .grid
            .iter()
            .filter(|entry| entry.value().is_formula())
            .map(|entry| entry.key().clone())
            .collect();
        self.recalculate(formulas);
    }

    /// Re-evaluate the changed cells and everything that transitively depends on them.
    pub(crate) fn recalculate_from(&mut self, changed: &[CellRef]) {
        let mut affected = BTreeSet::new();
        let mut to_process: Vec<CellRef> = changed.to_vec();
        while let Some(cell_ref) = to_process.pop() {
            if !affected.insert(cell_ref.clone()) {
                continue;
            }
            if let Some(deps) = self.dependents.get(&cell_ref) {
                to_process.extend(deps.iter().cloned());
            }
        }

        let formulas = affected
            .into_iter()
            .filter(|r| self.grid.get(r).is_some_and(|c| c.is_formula()))
            .collect();
        self.recalculate(formulas);
    }

    /// Evaluate `formulas` in dependency order (Kahn's algorithm).
    /// Whatever cannot be ordered sits on or behind a cycle and becomes `Error`.
    fn recalculate(&mut self, formulas: BTreeSet<CellRef>) {
        if formulas.is_empty() {
            return;
        }

        let mut pending: HashMap<CellRef, usize> = HashMap::with_capacity(formulas.len());
        for cell_ref in &formulas {
            let raw = self
                .grid
                .get(cell_ref)
                .map(|c| c.raw.clone())
                .unwrap_or_default();
            let deps: HashSet<CellRef> = extract_dependencies(&raw).into_iter().collect();
            let blocking = deps.iter().filter(|d| formulas.contains(*d)).count();
            pending.insert(cell_ref.clone(), blocking);
        }

        let mut ready: BTreeSet<CellRef> = pending
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(r, _)| r.clone())
            .collect();
        let mut evaluated = 0usize;

        while let Some(cell_ref) = ready.pop_first() {
            pending.remove(&cell_ref);
            self.evaluate_stored(&cell_ref);
            evaluated += 1;

            let Some(dependents) = self.dependents.get(&cell_ref) else {
                continue;
            };
            for dependent in dependents {
                if let Some(n) = pending.get_mut(dependent) {
                    *n = n.saturating_sub(1);
                    if *n == 0 {
                        ready.insert(dependent.clone());
                    }
                }
            }
        }

        if !pending.is_empty() {
            tracing::debug!(
                sheet = %self.name,
                cells = pending.len(),
                "circular references left unevaluated"
            );
        }
        for cell_ref in pending.keys() {
            if let Some(mut cell) = self.grid.get_mut(cell_ref) {
                cell.value = ERROR_VALUE.to_string();
            }
        }
        tracing::debug!(sheet = %self.name, evaluated, "recalculated");
    }

    fn evaluate_stored(&self, cell_ref: &CellRef) {
        let Some(raw) = self.grid.get(cell_ref).map(|c| c.raw.clone()) else {
            return;
        };
        let value = evaluate(&self.engine, &raw);
        if let Some(mut cell) = self.grid.get_mut(cell_ref) {
            cell.value = value;
        }
    }

    /// Evaluate the formula stored at a position with an explicit cycle check.
    pub fn evaluate_at(&self, row: usize, col: usize) -> Result<String> {
        let cell = self.get(row, col)?;
        if !cell.is_formula() {
            return Ok(cell.value);
        }
        let cell_ref = CellRef::new(col, row);
        Ok(evaluate_cell(&self.engine, &self.grid, &cell_ref, &cell.raw))
    }
}
