//! Transport payload codec.
//!
//! A payload is one string holding every non-empty cell in row-major order:
//!
//! ```text
//! $A1 1\n$B1 2\n$A2 =A1+B1\n
//! ```
//!
//! `\n` above is the two-character entry separator, not a line break.
//! Inside content `\` is written `\\` and `"` is written `\"`, so the
//! separator can never appear in escaped content.

use crate::error::{Result, SheetcastError};
use sheetcast_engine::engine::{Cell, CellRef};

/// Two-character marker ending each entry.
pub const ENTRY_SEPARATOR: &str = "\\n";

/// A decoded `(position, raw text)` pair.
pub type CellTriple = (CellRef, String);

/// Encode non-empty cells. Input order does not matter; output is row-major.
pub fn encode_cells<'a>(cells: impl IntoIterator<Item = (&'a CellRef, &'a Cell)>) -> String {
    let mut cells: Vec<(&CellRef, &Cell)> = cells
        .into_iter()
        .filter(|(_, cell)| !cell.is_empty())
        .collect();
    cells.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = String::new();
    for (cell_ref, cell) in cells {
        out.push('$');
        out.push_str(&cell_ref.to_string());
        out.push(' ');
        escape_into(&cell.raw, &mut out);
        out.push_str(ENTRY_SEPARATOR);
    }
    out
}

/// Encode `(position, raw)` pairs, skipping empty raw text.
pub fn encode_triples(cells: &[CellTriple]) -> String {
    let cells: Vec<(CellRef, Cell)> = cells
        .iter()
        .map(|(cell_ref, raw)| (cell_ref.clone(), Cell::new_literal(raw)))
        .collect();
    encode_cells(cells.iter().map(|(r, c)| (r, c)))
}

fn escape_into(raw: &str, out: &mut String) {
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
}

/// Decode a payload into `(position, raw)` pairs in payload order.
///
/// An empty (or all-whitespace) payload decodes to nothing. Any malformed
/// entry fails the whole decode; nothing is partially returned.
pub fn decode_payload(payload: &str) -> Result<Vec<CellTriple>> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut chars = payload.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            current.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => {
                entries.push(parse_entry(&current, entries.len() + 1)?);
                current.clear();
            }
            Some('\\') => current.push('\\'),
            Some('"') => current.push('"'),
            Some(other) => {
                return Err(malformed(
                    entries.len() + 1,
                    format!("unknown escape '\\{}'", other),
                ));
            }
            None => {
                return Err(malformed(entries.len() + 1, "dangling escape at end"));
            }
        }
    }

    if !current.trim().is_empty() {
        entries.push(parse_entry(&current, entries.len() + 1)?);
    }

    tracing::debug!(entries = entries.len(), "decoded payload");
    Ok(entries)
}

fn parse_entry(entry: &str, index: usize) -> Result<CellTriple> {
    let Some(rest) = entry.strip_prefix('$') else {
        return Err(malformed(index, "expected '$' before cell reference"));
    };
    let Some((label, content)) = rest.split_once(' ') else {
        return Err(malformed(index, "expected a space after the cell reference"));
    };
    let cell_ref = CellRef::parse(label).map_err(|err| malformed(index, err.to_string()))?;
    Ok((cell_ref, content.to_string()))
}

fn malformed(entry: usize, message: impl Into<String>) -> SheetcastError {
    SheetcastError::MalformedPayload {
        entry,
        message: message.into(),
    }
}
