//! Canonical number parsing and display formatting.
//!
//! Cell values are stored as text. Every place that needs the number inside
//! a value goes through [`parse_number`], and every computed number is
//! rendered by [`format_number`], so the evaluator and numeric transforms
//! agree on what counts as a number.

use super::Dynamic;

/// Display value of a formula that could not be evaluated.
pub const ERROR_VALUE: &str = "Error";

/// Parse a stored value as a finite number. Surrounding whitespace is ignored.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Format a number for display: shortest round-trip form, no trailing `.0`.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        ERROR_VALUE.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

/// Format an evaluation result for display.
pub fn format_dynamic(value: &Dynamic) -> String {
    if let Ok(n) = value.as_float() {
        format_number(n)
    } else if let Ok(n) = value.as_int() {
        n.to_string()
    } else if let Ok(b) = value.as_bool() {
        if b { "TRUE" } else { "FALSE" }.to_string()
    } else {
        ERROR_VALUE.to_string()
    }
}

/// Presentation helper: `"0.75"` → `"75%"`. Returns None for non-numbers.
pub fn to_percent(text: &str) -> Option<String> {
    let n = parse_number(text)?;
    let pct = format_number(n * 100.0);
    if pct == ERROR_VALUE {
        return None;
    }
    Some(format!("{}%", pct))
}
