//! Writer for the .grd file format

use super::CellTriple;
use crate::error::Result;
use std::fs;
use std::path::Path;

/// Write cells to a .grd file.
pub fn write_grd(path: &Path, name: &str, cells: &[CellTriple]) -> Result<()> {
    fs::write(path, write_grd_content(name, cells))?;
    Ok(())
}

/// Render cells as .grd text, row-major, skipping empty raw text.
pub fn write_grd_content(name: &str, cells: &[CellTriple]) -> String {
    let mut lines = vec![format!("# Sheetcast sheet: {}", name)];

    let mut sorted: Vec<&CellTriple> = cells.iter().filter(|(_, raw)| !raw.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    for (cell_ref, raw) in sorted {
        lines.push(format!("{}: {}", cell_ref, escape_grd_text(raw)));
    }

    lines.join("\n") + "\n"
}

fn escape_grd_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}
