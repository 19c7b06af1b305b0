//! Formula preprocessing.
//!
//! Before formulas can be evaluated by Rhai, spreadsheet syntax must be
//! rewritten into a Rhai expression. Passes run in this order:
//!
//! - **Literals**: `7` → `7.0`, so arithmetic stays in floating point
//! - **Aggregates**: `SUM(a, b)` → `SUM([a, b])` for every built-in aggregate
//! - **Ranges**: `A1:B5` → `RANGE(0, 0, 1, 4)` (col/row order)
//! - **References**: `B3` → `CELL(1, 2)` (col/row order)

use super::cell_ref::CellRef;
use super::deps::{cell_ref_re, range_re};

/// Rewrite a formula (with or without its leading `=`) into a Rhai expression.
pub fn preprocess_formula(formula: &str) -> String {
    let body = formula.strip_prefix('=').unwrap_or(formula);
    let floated = float_literals(body);
    let wrapped = wrap_aggregate_args(&floated);
    let with_ranges = range_re()
        .replace_all(&wrapped, |caps: &regex::Captures| {
            match (CellRef::from_str(&caps[1]), CellRef::from_str(&caps[2])) {
                (Some(start), Some(end)) => format!(
                    "RANGE({}, {}, {}, {})",
                    start.col, start.row, end.col, end.row
                ),
                _ => caps[0].to_string(),
            }
        })
        .to_string();

    cell_ref_re()
        .replace_all(&with_ranges, |caps: &regex::Captures| {
            let cell_ref = format!("{}{}", &caps[1], &caps[2]);
            match CellRef::from_str(&cell_ref) {
                Some(cr) => format!("CELL({}, {})", cr.col, cr.row),
                None => caps[0].to_string(),
            }
        })
        .to_string()
}

/// Append `.0` to bare integer literals. Digits that are part of an
/// identifier or cell reference (`A12`, `LOG10`) are left alone.
fn float_literals(script: &str) -> String {
    let chars: Vec<char> = script.chars().collect();
    let mut out = String::with_capacity(script.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let attached = i > 0 && {
            let prev = chars[i - 1];
            prev.is_ascii_alphanumeric() || prev == '_' || prev == '.'
        };
        // `.5` is a literal with the leading zero left off.
        if ch == '.' && !attached && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
            out.push_str("0.");
            i += 1;
            while i < chars.len() && chars[i].is_ascii_digit() {
                out.push(chars[i]);
                i += 1;
            }
            continue;
        }
        if !ch.is_ascii_digit() || attached {
            out.push(ch);
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        let mut has_fraction = false;
        if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
            has_fraction = true;
            i += 1;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
        }
        out.extend(&chars[start..i]);
        if !has_fraction {
            out.push_str(".0");
        }
    }

    out
}

/// Turn `NAME(args)` into `NAME([args])` for aggregate built-ins, matching
/// parentheses so nested calls and expressions keep their structure.
/// Aggregate names are matched case-insensitively and emitted in upper case.
fn wrap_aggregate_args(script: &str) -> String {
    let chars: Vec<char> = script.chars().collect();
    let mut out = String::with_capacity(script.len() + 8);
    // One entry per open paren: true when it opened an aggregate call.
    let mut stack: Vec<bool> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch.is_ascii_alphabetic() || ch == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let ident: String = chars[start..i].iter().collect();

            let mut j = i;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            let upper = ident.to_ascii_uppercase();
            if j < chars.len()
                && chars[j] == '('
                && crate::builtins::is_aggregate(&upper)
            {
                out.push_str(crate::builtins::canonical_aggregate(&upper));
                out.push_str("([");
                stack.push(true);
                i = j + 1;
            } else {
                out.push_str(&ident);
            }
            continue;
        }

        match ch {
            '(' => {
                stack.push(false);
                out.push(ch);
            }
            ')' => {
                if stack.pop() == Some(true) {
                    out.push_str("])");
                } else {
                    out.push(ch);
                }
            }
            _ => out.push(ch),
        }
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_literals() {
        assert_eq!(float_literals("7/2"), "7.0/2.0");
        assert_eq!(float_literals("1.5 + 10"), "1.5 + 10.0");
        assert_eq!(float_literals("A12 + 3"), "A12 + 3.0");
        assert_eq!(float_literals("-4"), "-4.0");
        assert_eq!(float_literals(".5+1"), "0.5+1.0");
        assert_eq!(float_literals("2*(.25)"), "2.0*(0.25)");
    }

    #[test]
    fn test_wrap_aggregate_args_nested() {
        assert_eq!(
            wrap_aggregate_args("sum(A1, max(B1:B2), (C1+1))"),
            "SUM([A1, MAX([B1:B2]), (C1+1)])"
        );
        assert_eq!(wrap_aggregate_args("(A1+B1)*2"), "(A1+B1)*2");
    }

    #[test]
    fn test_wrap_aggregate_alias() {
        assert_eq!(wrap_aggregate_args("AVERAGE(A1:A3)"), "AVG([A1:A3])");
    }

    #[test]
    fn test_preprocess_formula_full() {
        assert_eq!(
            preprocess_formula("=SUM(A1:A3) * 2 + B1"),
            "SUM([RANGE(0, 0, 0, 2)]) * 2.0 + CELL(1, 0)"
        );
        assert_eq!(preprocess_formula("=A1+B1"), "CELL(0, 0)+CELL(1, 0)");
        assert_eq!(preprocess_formula("10"), "10.0");
    }
}
