//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style labels
//! (e.g., "A1", "B2", "AA100") and zero-indexed row/column coordinates.
//!
//! # Examples
//!
//! ```ignore
//! let cell = CellRef::from_str("B3").unwrap();
//! assert_eq!(cell.col, 1);  // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// A label that does not match `[A-Za-z]+[0-9]+` (or overflows).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid cell reference: {0}")]
pub struct InvalidReference(pub String);

/// A reference to a cell by row and column indices (0-indexed).
///
/// Ordering is row-major, so sorted collections of references iterate the
/// grid the same way the payload codec does.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$")
            .expect("cell label regex must compile")
    })
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "b2", "AA10").
    /// Returns None if the input is invalid.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        Self::parse_a1(name)
    }

    /// Parse a label, reporting failures as [`InvalidReference`].
    pub fn parse(label: &str) -> Result<CellRef, InvalidReference> {
        Self::parse_a1(label).ok_or_else(|| InvalidReference(label.to_string()))
    }

    fn parse_a1(name: &str) -> Option<CellRef> {
        let caps = label_re().captures(name)?;
        let col = column_index(&caps["letters"])?.checked_sub(1)?;
        let row = caps["numbers"].parse::<usize>().ok()?.checked_sub(1)?;
        Some(CellRef::new(col, row))
    }

    /// Convert a 0-based column index to letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        column_name(col as u128 + 1)
    }
}

/// Bijective base-26 column name for a 1-based column number.
///
/// `1 -> "A"`, `26 -> "Z"`, `27 -> "AA"`; `0` is "no column" and maps to
/// the empty string.
pub fn column_name(n: u128) -> String {
    let mut result = String::new();
    let mut n = n;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

/// Inverse of [`column_name`]: the 1-based column number for a run of
/// letters (case-insensitive). Returns None on non-letters, empty input
/// or overflow.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut acc = 0usize;
    for c in letters.bytes() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() - b'A') as usize + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    Some(acc)
}

impl std::str::FromStr for CellRef {
    type Err = InvalidReference;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellRef::parse(s)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_a1_overflow_returns_none() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(CellRef::from_str(&huge).is_none());
    }

    #[test]
    fn test_col_to_letters_handles_max_usize() {
        let letters = CellRef::col_to_letters(usize::MAX);
        assert!(!letters.is_empty());
        assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_column_name_boundaries() {
        assert_eq!(column_name(0), "");
        assert_eq!(column_name(1), "A");
        assert_eq!(column_name(26), "Z");
        assert_eq!(column_name(27), "AA");
        assert_eq!(column_name(52), "AZ");
        assert_eq!(column_name(53), "BA");
        assert_eq!(column_name(702), "ZZ");
        assert_eq!(column_name(703), "AAA");
    }

    #[test]
    fn test_parse_reports_invalid_reference() {
        let err = CellRef::parse("1A").unwrap_err();
        assert_eq!(err, InvalidReference("1A".to_string()));
        assert_eq!(err.to_string(), "Invalid cell reference: 1A");
        assert!("A0".parse::<CellRef>().is_err());
    }

    #[test]
    fn test_bijection_covers_two_letter_range() {
        for n in 1..=(26 * 27) {
            let name = column_name(n as u128);
            assert_eq!(column_index(&name), Some(n), "column {}", name);
        }
        assert_eq!(column_name(1000), "ALL");
        assert_eq!(column_index("ALL"), Some(1000));
    }

    proptest! {
        #[test]
        fn prop_column_name_round_trips(n in 1usize..=1000) {
            prop_assert_eq!(column_index(&column_name(n as u128)), Some(n));
        }

        #[test]
        fn prop_label_round_trips(col in 0usize..2000, row in 0usize..100_000) {
            let cell = CellRef::new(col, row);
            prop_assert_eq!(CellRef::from_str(&cell.to_string()), Some(cell));
        }
    }
}
