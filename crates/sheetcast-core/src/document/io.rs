use super::{Sheet, Snapshot};
use crate::error::Result;
use crate::storage::{CellStore, CellTriple, decode_payload, encode_cells};
use sheetcast_engine::engine::Cell;
use std::sync::Arc;

impl Sheet {
    /// Payload of every non-empty cell, row-major.
    pub fn encode_payload(&self) -> String {
        let cells = self.cells();
        encode_cells(cells.iter().map(|(r, c)| (r, c)))
    }

    /// Overwrite-merge a payload: only the cells it names change.
    /// Returns the number of cells written.
    pub fn apply_payload(&mut self, payload: &str) -> Result<usize> {
        let cells = decode_payload(payload)?;
        self.apply_cells(&cells, false)
    }

    /// Replace every cell with the payload's contents.
    pub fn replace_with_payload(&mut self, payload: &str) -> Result<usize> {
        let cells = decode_payload(payload)?;
        self.apply_cells(&cells, true)
    }

    /// Bulk write. Every position is bounds-checked before anything changes.
    pub fn apply_cells(&mut self, cells: &[CellTriple], replace: bool) -> Result<usize> {
        for (cell_ref, _) in cells {
            self.check_bounds(cell_ref.row, cell_ref.col)?;
        }
        if replace {
            self.grid.clear();
        }
        for (cell_ref, raw) in cells {
            self.store(cell_ref.clone(), Cell::from_input(raw));
        }
        self.rebuild_dependents();
        self.recalculate_all();
        self.modified = true;
        tracing::debug!(sheet = %self.name, cells = cells.len(), replace, "applied cells");
        Ok(cells.len())
    }

    /// Detached copy of the current cells.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(&self.name, self.size, self.cells())
    }

    /// Build a live sheet from a snapshot. Values are recalculated.
    pub fn from_snapshot(snapshot: &Snapshot) -> Sheet {
        let mut sheet = Sheet::with_size(&snapshot.name, snapshot.size);
        for (cell_ref, cell) in snapshot.cells() {
            sheet.store(cell_ref.clone(), cell.clone());
        }
        sheet.rebuild_dependents();
        sheet.recalculate_all();
        sheet
    }

    /// Append a snapshot of the current cells to the published list.
    /// Returns its index.
    pub fn append_published_version(&mut self) -> usize {
        self.published.push(Arc::new(self.snapshot()));
        self.published.len() - 1
    }

    /// Append a received snapshot to the subscribed list. Returns its index.
    pub fn append_subscribed_version(&mut self, snapshot: Snapshot) -> usize {
        self.subscribed.push(Arc::new(snapshot));
        self.subscribed.len() - 1
    }

    pub fn save_to(&mut self, store: &mut dyn CellStore) -> Result<()> {
        store.write_cells(&self.name, &self.raw_cells())?;
        self.modified = false;
        Ok(())
    }

    /// Replace every cell with the store's contents and recalculate.
    pub fn load_from(&mut self, store: &dyn CellStore) -> Result<usize> {
        let cells = store.read_cells()?;
        let count = self.apply_cells(&cells, true)?;
        self.modified = false;
        Ok(count)
    }

    /// Raw text of non-empty cells, row-major.
    pub fn raw_cells(&self) -> Vec<CellTriple> {
        self.cells()
            .into_iter()
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(cell_ref, cell)| (cell_ref, cell.raw))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SheetcastError;
    use crate::storage::{GrdFile, MemoryStore};
    use sheetcast_engine::engine::ERROR_VALUE;

    #[test]
    fn test_apply_payload_evaluates() {
        let mut sheet = Sheet::new("s", 2, 2);
        sheet.write(1, 0, "3").unwrap();
        let written = sheet
            .apply_payload("$A1 1\\n$B1 2\\n$A2 =A1+B1\\n")
            .unwrap();
        assert_eq!(written, 3);
        assert_eq!(sheet.get(1, 0).unwrap().value, "3");
        assert_eq!(sheet.get(1, 0).unwrap().raw, "=A1+B1");
    }

    #[test]
    fn test_apply_payload_merges() {
        let mut sheet = Sheet::new("s", 3, 3);
        sheet.write_label("C3", "keep").unwrap();
        sheet.apply_payload("$A1 1\\n").unwrap();
        assert_eq!(sheet.get_by_label("C3").unwrap().value, "keep");
        assert_eq!(sheet.get_by_label("A1").unwrap().value, "1");
    }

    #[test]
    fn test_replace_with_payload_clears_others() {
        let mut sheet = Sheet::new("s", 3, 3);
        sheet.write_label("C3", "gone").unwrap();
        sheet.replace_with_payload("$A1 1\\n").unwrap();
        assert!(sheet.get_by_label("C3").unwrap().is_empty());
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn test_apply_payload_out_of_bounds_changes_nothing() {
        let mut sheet = Sheet::new("s", 2, 2);
        sheet.write_label("A1", "orig").unwrap();
        let result = sheet.apply_payload("$A1 new\\n$C1 x\\n");
        assert!(matches!(result, Err(SheetcastError::OutOfBounds { .. })));
        assert_eq!(sheet.get_by_label("A1").unwrap().value, "orig");
    }

    #[test]
    fn test_apply_malformed_payload_changes_nothing() {
        let mut sheet = Sheet::new("s", 2, 2);
        sheet.write_label("A1", "orig").unwrap();
        assert!(sheet.apply_payload("$A1 new\\n$?? x\\n").is_err());
        assert_eq!(sheet.get_by_label("A1").unwrap().value, "orig");
    }

    #[test]
    fn test_cycle_in_payload() {
        let mut sheet = Sheet::new("s", 2, 2);
        sheet.apply_payload("$A1 =B1\\n$B1 =A1\\n").unwrap();
        assert_eq!(sheet.get(0, 0).unwrap().value, ERROR_VALUE);
        assert_eq!(sheet.get(0, 1).unwrap().value, ERROR_VALUE);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut sheet = Sheet::new("s", 3, 3);
        sheet.write(0, 0, "1").unwrap();
        let id = sheet.append_published_version();
        sheet.write(0, 0, "2").unwrap();
        assert_eq!(id, 0);
        assert_eq!(sheet.published[0].get(0, 0).value, "1");
        assert_eq!(sheet.get(0, 0).unwrap().value, "2");
    }

    #[test]
    fn test_from_snapshot() {
        let mut sheet = Sheet::new("s", 3, 3);
        sheet.write_label("A1", "4").unwrap();
        sheet.write_label("B1", "=A1*A1").unwrap();
        let copy = Sheet::from_snapshot(&sheet.snapshot());
        assert_eq!(copy.name, "s");
        assert_eq!(copy.get_by_label("B1").unwrap().value, "16");
        assert_eq!(copy.encode_payload(), sheet.encode_payload());
    }

    #[test]
    fn test_save_and_load_memory() {
        let mut sheet = Sheet::new("s", 3, 3);
        sheet.write_label("A1", "2").unwrap();
        sheet.write_label("A2", "=A1+1").unwrap();
        let mut store = MemoryStore::new();
        sheet.save_to(&mut store).unwrap();
        assert!(!sheet.modified);

        let mut loaded = Sheet::new("s", 3, 3);
        loaded.write_label("C3", "stale").unwrap();
        assert_eq!(loaded.load_from(&store).unwrap(), 2);
        assert_eq!(loaded.get_by_label("A2").unwrap().value, "3");
        assert!(loaded.get_by_label("C3").unwrap().is_empty());
        assert!(!loaded.modified);
    }

    #[test]
    fn test_save_and_load_grd_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = GrdFile::new(dir.path().join("s.grd"));
        let mut sheet = Sheet::new("s", 3, 3);
        sheet.write_label("B2", "=SUM(A1:A2)").unwrap();
        sheet.write_label("A1", "5").unwrap();
        sheet.save_to(&mut file).unwrap();

        let mut loaded = Sheet::new("s", 3, 3);
        loaded.load_from(&file).unwrap();
        assert_eq!(loaded.get_by_label("B2").unwrap().value, "5");
        assert_eq!(loaded.raw_cells(), sheet.raw_cells());
    }
}
