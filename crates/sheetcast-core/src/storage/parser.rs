//! Parser for the .grd file format

use super::CellTriple;
use crate::error::{Result, SheetcastError};
use sheetcast_engine::engine::CellRef;
use std::fs;
use std::path::Path;

/// Parse a .grd file into `(position, raw)` pairs.
pub fn parse_grd(path: &Path) -> Result<Vec<CellTriple>> {
    let content = fs::read_to_string(path)?;
    parse_grd_content(&content)
}

/// Parse .grd content from a string.
///
/// Each line is `CELLREF: RAW`; blank lines and `#` comments are skipped.
/// Exactly one space after the colon belongs to the separator, the rest of
/// the line is the raw text.
pub fn parse_grd_content(content: &str) -> Result<Vec<CellTriple>> {
    let mut cells = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some((cell_ref_str, raw)) = line.split_once(':') else {
            return Err(SheetcastError::Parse {
                line: line_num + 1,
                message: "Expected 'CELLREF: RAW' format".to_string(),
            });
        };

        let cell_ref_str = cell_ref_str.trim();
        let cell_ref = CellRef::from_str(cell_ref_str).ok_or_else(|| SheetcastError::Parse {
            line: line_num + 1,
            message: format!("Invalid cell reference: {}", cell_ref_str),
        })?;

        let raw = raw.strip_prefix(' ').unwrap_or(raw);
        cells.push((cell_ref, unescape_grd_text(raw)));
    }

    Ok(cells)
}

fn unescape_grd_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}
