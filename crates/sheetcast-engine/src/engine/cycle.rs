//! Circular dependency detection for formula cells.
//!
//! A formula that reaches itself through a chain of references (e.g. A1
//! references B1, B1 references C1, C1 references A1) can never settle.
//! This module uses depth-first search over formula dependencies to find
//! such chains so the cell can show the error value instead.

use std::collections::HashSet;

use super::deps::extract_dependencies;
use super::{CellRef, Grid};

/// Detect circular dependencies starting from a cell.
/// Returns Some(cycle_path) if a cycle is found, None otherwise.
pub fn detect_cycle(start: &CellRef, grid: &Grid) -> Option<Vec<CellRef>> {
    let mut visiting = HashSet::new();
    let mut done = HashSet::new();
    let mut path = Vec::new();

    if detect_cycle_dfs(start, grid, &mut visiting, &mut done, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn detect_cycle_dfs(
    current: &CellRef,
    grid: &Grid,
    visiting: &mut HashSet<CellRef>,
    done: &mut HashSet<CellRef>,
    path: &mut Vec<CellRef>,
) -> bool {
    if visiting.contains(current) {
        path.push(current.clone());
        return true;
    }
    if done.contains(current) {
        return false;
    }

    let deps = match grid.get(current) {
        Some(entry) if entry.is_formula() => extract_dependencies(&entry.raw),
        _ => return false,
    };

    visiting.insert(current.clone());
    path.push(current.clone());

    for dep in &deps {
        if detect_cycle_dfs(dep, grid, visiting, done, path) {
            return true;
        }
    }

    path.pop();
    visiting.remove(current);
    done.insert(current.clone());
    false
}
