//! Built-in spreadsheet functions (Rust) and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing built-in names are ALL CAPS (e.g. `SUM`, `AVG`).
//! - Aggregates receive their arguments as one Rhai array (see
//!   `preprocess_formula`), so ranges and scalars can be mixed freely.
//! - If you add a new aggregate, add it to `AGGREGATE_BUILTINS` and
//!   register its implementation in `register_builtins`.

use crate::engine::{CellRef, Grid, GridSize, parse_number};
use rhai::{Dynamic, Engine, EvalAltResult, Position};

pub struct AggregateBuiltin {
    pub sheet_name: &'static str,
    /// Name the call is rewritten to (aliases share an implementation).
    pub canonical: &'static str,
    #[allow(dead_code)]
    pub description: &'static str,
}

pub const AGGREGATE_BUILTINS: &[AggregateBuiltin] = &[
    AggregateBuiltin {
        sheet_name: "SUM",
        canonical: "SUM",
        description: "Sum of the numeric arguments",
    },
    AggregateBuiltin {
        sheet_name: "AVG",
        canonical: "AVG",
        description: "Average of the numeric arguments",
    },
    AggregateBuiltin {
        sheet_name: "AVERAGE",
        canonical: "AVG",
        description: "Alias of AVG",
    },
    AggregateBuiltin {
        sheet_name: "MIN",
        canonical: "MIN",
        description: "Minimum of the numeric arguments",
    },
    AggregateBuiltin {
        sheet_name: "MAX",
        canonical: "MAX",
        description: "Maximum of the numeric arguments",
    },
    AggregateBuiltin {
        sheet_name: "COUNT",
        canonical: "COUNT",
        description: "Count of numeric arguments (empty range cells excluded)",
    },
];

pub fn is_aggregate(upper_name: &str) -> bool {
    AGGREGATE_BUILTINS.iter().any(|b| b.sheet_name == upper_name)
}

pub fn canonical_aggregate(upper_name: &str) -> &'static str {
    AGGREGATE_BUILTINS
        .iter()
        .find(|b| b.sheet_name == upper_name)
        .map(|b| b.canonical)
        .unwrap_or("SUM")
}

fn invalid_arg(message: &str) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(message.into(), Position::NONE).into()
}

fn to_usize(value: i64, label: &str) -> Result<usize, Box<EvalAltResult>> {
    usize::try_from(value).map_err(|_| invalid_arg(&format!("{} must be >= 0", label)))
}

fn to_cell_ref(col: i64, row: i64, size: GridSize) -> Result<CellRef, Box<EvalAltResult>> {
    let cell_ref = CellRef::new(to_usize(col, "col")?, to_usize(row, "row")?);
    if !size.contains(&cell_ref) {
        return Err(invalid_arg(&format!("{} is outside the sheet", cell_ref)));
    }
    Ok(cell_ref)
}

/// Numeric value stored at a cell: None when empty, Err when not a number.
fn stored_number(grid: &Grid, cell_ref: &CellRef) -> Result<Option<f64>, Box<EvalAltResult>> {
    let Some(cell) = grid.get(cell_ref) else {
        return Ok(None);
    };
    if cell.is_empty() {
        return Ok(None);
    }
    match parse_number(&cell.value) {
        Some(n) => Ok(Some(n)),
        None => Err(invalid_arg(&format!("{} is not a number", cell_ref))),
    }
}

/// Flatten (possibly nested) arrays of numbers.
fn collect_numbers(values: rhai::Array, out: &mut Vec<f64>) -> Result<(), Box<EvalAltResult>> {
    for value in values {
        if value.is_array() {
            let inner = value.into_array().map_err(invalid_arg)?;
            collect_numbers(inner, out)?;
        } else if let Ok(n) = value.as_float() {
            out.push(n);
        } else if let Ok(n) = value.as_int() {
            out.push(n as f64);
        } else {
            return Err(invalid_arg(&format!(
                "expected a number, got {}",
                value.type_name()
            )));
        }
    }
    Ok(())
}

fn numbers(values: rhai::Array) -> Result<Vec<f64>, Box<EvalAltResult>> {
    let mut out = Vec::with_capacity(values.len());
    collect_numbers(values, &mut out)?;
    Ok(out)
}

/// Register all built-in functions into the Rhai engine.
pub fn register_builtins(engine: &mut Engine, grid: Grid, size: GridSize) {
    // CELL(col, row): numeric value at cell (empty -> 0, non-number -> error)
    let grid_cell = grid.clone();
    engine.register_fn(
        "CELL",
        move |col: i64, row: i64| -> Result<f64, Box<EvalAltResult>> {
            let cell_ref = to_cell_ref(col, row, size)?;
            Ok(stored_number(&grid_cell, &cell_ref)?.unwrap_or(0.0))
        },
    );

    // RANGE(c1, r1, c2, r2): numbers of the non-empty cells, row-major
    let grid_range = grid;
    engine.register_fn(
        "RANGE",
        move |c1: i64, r1: i64, c2: i64, r2: i64| -> Result<rhai::Array, Box<EvalAltResult>> {
            let start = to_cell_ref(c1, r1, size)?;
            let end = to_cell_ref(c2, r2, size)?;
            let min_row = start.row.min(end.row);
            let max_row = start.row.max(end.row);
            let min_col = start.col.min(end.col);
            let max_col = start.col.max(end.col);

            let mut result = rhai::Array::new();
            for row in min_row..=max_row {
                for col in min_col..=max_col {
                    if let Some(n) = stored_number(&grid_range, &CellRef::new(col, row))? {
                        result.push(Dynamic::from(n));
                    }
                }
            }
            Ok(result)
        },
    );

    engine.register_fn(
        "SUM",
        |values: rhai::Array| -> Result<f64, Box<EvalAltResult>> {
            Ok(numbers(values)?.iter().sum())
        },
    );

    engine.register_fn(
        "AVG",
        |values: rhai::Array| -> Result<f64, Box<EvalAltResult>> {
            let values = numbers(values)?;
            if values.is_empty() {
                return Err(invalid_arg("AVG of no values"));
            }
            Ok(values.iter().sum::<f64>() / values.len() as f64)
        },
    );

    engine.register_fn(
        "MIN",
        |values: rhai::Array| -> Result<f64, Box<EvalAltResult>> {
            let min = numbers(values)?.into_iter().fold(f64::INFINITY, f64::min);
            Ok(if min == f64::INFINITY { 0.0 } else { min })
        },
    );

    engine.register_fn(
        "MAX",
        |values: rhai::Array| -> Result<f64, Box<EvalAltResult>> {
            let max = numbers(values)?
                .into_iter()
                .fold(f64::NEG_INFINITY, f64::max);
            Ok(if max == f64::NEG_INFINITY { 0.0 } else { max })
        },
    );

    engine.register_fn(
        "COUNT",
        |values: rhai::Array| -> Result<f64, Box<EvalAltResult>> {
            Ok(numbers(values)?.len() as f64)
        },
    );

    // Scalar helpers
    engine.register_fn("POW", |base: f64, exp: f64| -> f64 { base.powf(exp) });
    engine.register_fn("SQRT", |x: f64| -> f64 { x.sqrt() });
    engine.register_fn("ABS", |x: f64| -> f64 { x.abs() });
}
