//! Dependency extraction from formula strings.
//!
//! Parses formula text to find all cell references (e.g., `A1`, `B2:C5`)
//! that the formula depends on. This is used to build the dependency graph
//! for recalculation ordering and cycle detection.
//!
//! Handles:
//! - Simple cell references: `A1`, `B2`
//! - Range references anywhere in the formula: `SUM(A1:B5, C1)`, `A1:A3`

use regex::Regex;
use std::sync::OnceLock;

use super::cell_ref::CellRef;

const MAX_DEPENDENCY_RANGE_CELLS: usize = 1_000_000;

/// Extract all cell references from a formula as dependencies.
/// A leading `=` is accepted and ignored.
pub fn extract_dependencies(formula: &str) -> Vec<CellRef> {
    let formula = formula.strip_prefix('=').unwrap_or(formula);
    let mut deps = Vec::new();

    let range_re = range_re();

    // Remove ranges first so their endpoints are not counted twice.
    let without_ranges = range_re.replace_all(formula, " ").to_string();

    for caps in range_re.captures_iter(formula) {
        let (Some(start), Some(end)) = (CellRef::from_str(&caps[1]), CellRef::from_str(&caps[2]))
        else {
            continue;
        };
        let min_row = start.row.min(end.row);
        let max_row = start.row.max(end.row);
        let min_col = start.col.min(end.col);
        let max_col = start.col.max(end.col);

        let row_count = max_row - min_row + 1;
        let col_count = max_col - min_col + 1;
        let Some(cell_count) = row_count.checked_mul(col_count) else {
            continue;
        };
        if cell_count > MAX_DEPENDENCY_RANGE_CELLS {
            continue;
        }

        for row in min_row..=max_row {
            for col in min_col..=max_col {
                deps.push(CellRef::new(col, row));
            }
        }
    }

    for caps in cell_ref_re().captures_iter(&without_ranges) {
        let cell_ref = format!("{}{}", &caps[1], &caps[2]);
        if let Some(cr) = CellRef::from_str(&cell_ref) {
            deps.push(cr);
        }
    }

    deps
}

/// Regex matching a single cell reference token such as `B12`.
pub(crate) fn cell_ref_re() -> &'static Regex {
    static CELL_RE: OnceLock<Regex> = OnceLock::new();
    CELL_RE.get_or_init(|| {
        Regex::new(r"\b([A-Za-z]+)([0-9]+)\b")
            .expect("dependency cell reference regex must compile")
    })
}

/// Regex matching a range token such as `A1:B5`.
///
/// Captures:
/// - group 1: start cell ref
/// - group 2: end cell ref
pub(crate) fn range_re() -> &'static Regex {
    static RANGE_RE: OnceLock<Regex> = OnceLock::new();
    RANGE_RE.get_or_init(|| {
        Regex::new(r"\b([A-Za-z]+[0-9]+)\s*:\s*([A-Za-z]+[0-9]+)\b")
            .expect("range reference regex must compile")
    })
}

/// Parse a cell range like "A1:B5" and return (start_col, start_row, end_col, end_row).
pub fn parse_range(range: &str) -> Option<(usize, usize, usize, usize)> {
    let parts: Vec<&str> = range.split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let start = CellRef::from_str(parts[0].trim())?;
    let end = CellRef::from_str(parts[1].trim())?;
    Some((start.col, start.row, end.col, end.row))
}
