//! Rhai engine creation and formula evaluation.
//!
//! Creates the Rhai scripting engine with all spreadsheet built-in functions
//! registered (CELL, RANGE, SUM, AVG, ...) bound to one grid. Formulas are
//! preprocessed and evaluated as single Rhai expressions; every failure is
//! reported as the display value [`ERROR_VALUE`].

use rhai::{Engine, EvalAltResult};

use super::{
    CellRef, Dynamic, ERROR_VALUE, Grid, GridSize, detect_cycle, format_dynamic,
    preprocess_formula,
};

/// Upper bound on Rhai operations for a single formula.
const MAX_OPERATIONS: u64 = 1_000_000;

/// Create a Rhai engine with built-ins registered against `grid`.
pub fn create_engine(grid: Grid, size: GridSize) -> Engine {
    let mut engine = Engine::new();
    engine.set_max_operations(MAX_OPERATIONS);
    engine.set_max_expr_depths(64, 32);
    crate::builtins::register_builtins(&mut engine, grid, size);
    engine
}

/// Evaluate a formula (leading `=` optional) and return the raw Rhai result.
pub fn eval_formula(engine: &Engine, formula: &str) -> Result<Dynamic, Box<EvalAltResult>> {
    let processed = preprocess_formula(formula);
    engine.eval_expression::<Dynamic>(&processed)
}

/// Evaluate a formula against the engine's grid and format the result.
///
/// References read the stored values of the cells they name. Errors,
/// non-finite numbers and non-numeric results become [`ERROR_VALUE`].
pub fn evaluate(engine: &Engine, formula: &str) -> String {
    match eval_formula(engine, formula) {
        Ok(value) if value.is_array() || value.is_string() || value.is_unit() => {
            ERROR_VALUE.to_string()
        }
        Ok(value) => format_dynamic(&value),
        Err(err) => {
            tracing::trace!(formula, error = %err, "formula evaluation failed");
            ERROR_VALUE.to_string()
        }
    }
}

/// Evaluate the formula stored (or about to be stored) at `at`.
///
/// A reference chain from `at` that revisits a cell already on the chain
/// makes the result [`ERROR_VALUE`] without evaluating anything.
pub fn evaluate_cell(engine: &Engine, grid: &Grid, at: &CellRef, formula: &str) -> String {
    if let Some(path) = detect_cycle(at, grid) {
        tracing::debug!(cell = %at, cycle_len = path.len(), "circular reference");
        return ERROR_VALUE.to_string();
    }
    evaluate(engine, formula)
}
