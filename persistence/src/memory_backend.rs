//! FILENAME: persistence/src/memory_backend.rs
//! PURPOSE: `InMemoryBackend` — the simplest `SpreadsheetBackend` (spec
//! §6.3): every sheet's cells live in an `engine::Grid`, nothing is ever
//! evicted, and the persist/pin hooks are bookkeeping only.
//! CONTEXT: Grounded on `engine::grid::Grid`'s sparse `HashMap` storage,
//! reused directly rather than reimplemented.

use std::collections::HashMap;

use engine::{Cell, Grid};

use crate::backend::SpreadsheetBackend;

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    sheets: HashMap<String, Grid>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn grid_mut(&mut self, sheet: &str) -> &mut Grid {
        self.sheets.entry(sheet.to_string()).or_default()
    }
}

impl SpreadsheetBackend for InMemoryBackend {
    fn max_column(&self, sheet: &str) -> u32 {
        self.sheets.get(sheet).map(|g| g.max_col + 1).unwrap_or(0)
    }

    fn max_row(&self, sheet: &str) -> u32 {
        self.sheets.get(sheet).map(|g| g.max_row + 1).unwrap_or(0)
    }

    fn max_row_for_column(&self, sheet: &str, col: u32) -> u32 {
        self.sheets.get(sheet).map(|g| g.max_row_for_column(col)).unwrap_or(0)
    }

    fn get_cell_at(&mut self, sheet: &str, col: u32, row: u32) -> Option<&mut Cell> {
        self.sheets.get_mut(sheet)?.get_cell_mut(row, col)
    }

    fn init_cell_at(&mut self, sheet: &str, col: u32, row: u32) {
        let grid = self.grid_mut(sheet);
        if grid.get_cell(row, col).is_none() {
            grid.set_cell(row, col, Cell::empty());
        }
    }

    fn clear_cell_at(&mut self, sheet: &str, col: u32, row: u32) {
        if let Some(grid) = self.sheets.get_mut(sheet) {
            grid.clear_cell(row, col);
        }
    }

    fn clear_column(&mut self, sheet: &str, col: u32) {
        if let Some(grid) = self.sheets.get_mut(sheet) {
            let rows: Vec<u32> = grid.cells.keys().filter(|&&(_, c)| c == col).map(|&(r, _)| r).collect();
            for row in rows {
                grid.clear_cell(row, col);
            }
        }
    }

    fn clear_row(&mut self, sheet: &str, row: u32) {
        if let Some(grid) = self.sheets.get_mut(sheet) {
            let cols: Vec<u32> = grid.cells.keys().filter(|&&(r, _)| r == row).map(|&(_, c)| c).collect();
            for col in cols {
                grid.clear_cell(row, col);
            }
        }
    }

    fn return_cell(&mut self, _sheet: &str, _col: u32, _row: u32) {
        // Nothing to release: cells live in `self.sheets` for as long as
        // the backend does.
    }

    fn is_cell_present(&self, sheet: &str, col: u32, row: u32) -> bool {
        self.sheets.get(sheet).map(|g| g.get_cell(row, col).is_some()).unwrap_or(false)
    }

    fn make_evergreen(&mut self, sheet: &str, col: u32, row: u32) {
        if let Some(cell) = self.get_cell_at(sheet, col, row) {
            cell.evergreen = true;
        }
    }

    fn commit_cell(&mut self, sheet: &str, col: u32, row: u32) {
        if let Some(cell) = self.get_cell_at(sheet, col, row) {
            cell.evergreen = false;
        }
    }

    fn dispose(&mut self, sheet: &str, col: u32, row: u32) {
        if let Some(cell) = self.get_cell_at(sheet, col, row) {
            cell.evergreen = false;
        }
    }

    fn stash_result(&mut self, sheet: &str, col: u32, row: u32, generation: u64) {
        if let Some(cell) = self.get_cell_at(sheet, col, row) {
            cell.value_generation = generation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::Value;

    #[test]
    fn init_cell_is_idempotent() {
        let mut backend = InMemoryBackend::new();
        backend.init_cell_at("Sheet1", 0, 0);
        backend.get_cell_at("Sheet1", 0, 0).unwrap().value = Value::string("x");
        backend.init_cell_at("Sheet1", 0, 0);
        assert_eq!(backend.get_cell_at("Sheet1", 0, 0).unwrap().value, Value::string("x"));
    }

    #[test]
    fn clear_column_removes_only_that_column() {
        let mut backend = InMemoryBackend::new();
        backend.init_cell_at("Sheet1", 0, 0);
        backend.init_cell_at("Sheet1", 1, 0);
        backend.clear_column("Sheet1", 0);
        assert!(!backend.is_cell_present("Sheet1", 0, 0));
        assert!(backend.is_cell_present("Sheet1", 1, 0));
    }

    #[test]
    fn make_evergreen_pins_and_commit_unpins() {
        let mut backend = InMemoryBackend::new();
        backend.init_cell_at("Sheet1", 0, 0);
        assert!(!backend.get_cell_at("Sheet1", 0, 0).unwrap().evergreen);

        backend.make_evergreen("Sheet1", 0, 0);
        assert!(backend.get_cell_at("Sheet1", 0, 0).unwrap().evergreen);

        backend.commit_cell("Sheet1", 0, 0);
        assert!(!backend.get_cell_at("Sheet1", 0, 0).unwrap().evergreen);
    }

    #[test]
    fn stash_result_records_generation() {
        let mut backend = InMemoryBackend::new();
        backend.init_cell_at("Sheet1", 0, 0);
        backend.stash_result("Sheet1", 0, 0, 7);
        assert_eq!(backend.get_cell_at("Sheet1", 0, 0).unwrap().value_generation, 7);
    }

    #[test]
    fn max_row_and_column_track_populated_bounds() {
        let mut backend = InMemoryBackend::new();
        backend.init_cell_at("Sheet1", 2, 3);
        assert_eq!(backend.max_column("Sheet1"), 3);
        assert_eq!(backend.max_row("Sheet1"), 4);
        assert_eq!(backend.max_row_for_column("Sheet1", 2), 4);
        assert_eq!(backend.max_row_for_column("Sheet1", 5), 0);
    }
}
