use super::Sheet;
use crate::error::{Result, SheetcastError};

/// Holds one cell's raw text between copy/cut and paste.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Clipboard {
    content: Option<String>,
    cut: bool,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy(&mut self, sheet: &Sheet, row: usize, col: usize) -> Result<()> {
        let cell = sheet.get(row, col)?;
        self.content = Some(cell.raw);
        self.cut = false;
        Ok(())
    }

    /// Copy, then clear the source cell.
    pub fn cut(&mut self, sheet: &mut Sheet, row: usize, col: usize) -> Result<()> {
        let cell = sheet.get(row, col)?;
        sheet.clear(row, col)?;
        self.content = Some(cell.raw);
        self.cut = true;
        Ok(())
    }

    /// Write the held text. A cut is consumed by its first paste.
    pub fn paste(&mut self, sheet: &mut Sheet, row: usize, col: usize) -> Result<()> {
        let content = self.content.clone().ok_or(SheetcastError::NothingToPaste)?;
        sheet.write(row, col, &content)?;
        if self.cut {
            self.content = None;
            self.cut = false;
        }
        Ok(())
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn is_cut(&self) -> bool {
        self.cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_paste_keeps_source() {
        let mut sheet = Sheet::new("s", 3, 3);
        sheet.write(0, 0, "=1+1").unwrap();
        let mut clipboard = Clipboard::new();
        clipboard.copy(&sheet, 0, 0).unwrap();
        clipboard.paste(&mut sheet, 1, 1).unwrap();
        clipboard.paste(&mut sheet, 2, 2).unwrap();
        assert_eq!(sheet.get(0, 0).unwrap().value, "2");
        assert_eq!(sheet.get(1, 1).unwrap().raw, "=1+1");
        assert_eq!(sheet.get(2, 2).unwrap().value, "2");
    }

    #[test]
    fn test_cut_is_consumed() {
        let mut sheet = Sheet::new("s", 3, 3);
        sheet.write(0, 0, "hello").unwrap();
        let mut clipboard = Clipboard::new();
        clipboard.cut(&mut sheet, 0, 0).unwrap();
        assert!(clipboard.is_cut());
        assert!(sheet.get(0, 0).unwrap().is_empty());

        clipboard.paste(&mut sheet, 1, 0).unwrap();
        assert_eq!(sheet.get(1, 0).unwrap().value, "hello");
        assert!(matches!(
            clipboard.paste(&mut sheet, 2, 0),
            Err(SheetcastError::NothingToPaste)
        ));
    }

    #[test]
    fn test_paste_empty_clipboard() {
        let mut sheet = Sheet::new("s", 3, 3);
        let mut clipboard = Clipboard::new();
        assert!(matches!(
            clipboard.paste(&mut sheet, 0, 0),
            Err(SheetcastError::NothingToPaste)
        ));
    }
}
