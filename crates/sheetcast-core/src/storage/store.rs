//! Injectable persistence for sheet cells.

use super::{CellTriple, parse_grd, write_grd};
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Reads and writes a sheet as `(position, raw)` pairs.
pub trait CellStore {
    fn read_cells(&self) -> Result<Vec<CellTriple>>;
    fn write_cells(&mut self, name: &str, cells: &[CellTriple]) -> Result<()>;
}

/// Keeps the last written cells in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    pub name: Option<String>,
    pub cells: Vec<CellTriple>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cells(cells: Vec<CellTriple>) -> Self {
        MemoryStore { name: None, cells }
    }
}

impl CellStore for MemoryStore {
    fn read_cells(&self) -> Result<Vec<CellTriple>> {
        Ok(self.cells.clone())
    }

    fn write_cells(&mut self, name: &str, cells: &[CellTriple]) -> Result<()> {
        self.name = Some(name.to_string());
        self.cells = cells.to_vec();
        Ok(())
    }
}

/// A `.grd` file on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrdFile {
    path: PathBuf,
}

impl GrdFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        GrdFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CellStore for GrdFile {
    fn read_cells(&self) -> Result<Vec<CellTriple>> {
        parse_grd(&self.path)
    }

    fn write_cells(&mut self, name: &str, cells: &[CellTriple]) -> Result<()> {
        write_grd(&self.path, name, cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SheetcastError;
    use sheetcast_engine::engine::CellRef;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        let cells = vec![(CellRef::new(0, 0), "1".to_string())];
        store.write_cells("s", &cells).unwrap();
        assert_eq!(store.name.as_deref(), Some("s"));
        assert_eq!(store.read_cells().unwrap(), cells);
    }

    #[test]
    fn test_grd_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = GrdFile::new(dir.path().join("sheet.grd"));
        let cells = vec![
            (CellRef::new(0, 0), "1".to_string()),
            (CellRef::new(2, 4), "=A1*3".to_string()),
        ];
        store.write_cells("s", &cells).unwrap();
        assert_eq!(store.read_cells().unwrap(), cells);
    }

    #[test]
    fn test_grd_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = GrdFile::new(dir.path().join("missing.grd"));
        assert!(matches!(store.read_cells(), Err(SheetcastError::Io(_))));
    }
}
