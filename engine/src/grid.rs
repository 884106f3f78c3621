//! FILENAME: engine/src/grid.rs
//! PURPOSE: Manages the collection of cells for a single sheet.
//! CONTEXT: Sparse storage (HashMap) so a spreadsheet with millions of
//! addressable cells costs memory proportional to how many are non-empty.

use std::collections::HashMap;

use crate::cell::Cell;

/// A cell coordinate as (row, col) with 0-based indices, matching
/// `parser::CellAddress`.
pub type CellCoord = (u32, u32);

#[derive(Debug, Clone, Default)]
pub struct Grid {
    pub cells: HashMap<CellCoord, Cell>,
    pub max_row: u32,
    pub max_col: u32,
}

impl Grid {
    pub fn new() -> Self {
        Grid::default()
    }

    pub fn set_cell(&mut self, row: u32, col: u32, cell: Cell) {
        if row > self.max_row {
            self.max_row = row;
        }
        if col > self.max_col {
            self.max_col = col;
        }
        self.cells.insert((row, col), cell);
    }

    pub fn get_cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn get_cell_mut(&mut self, row: u32, col: u32) -> Option<&mut Cell> {
        self.cells.get_mut(&(row, col))
    }

    pub fn clear_cell(&mut self, row: u32, col: u32) {
        let was_at_boundary = row == self.max_row || col == self.max_col;
        self.cells.remove(&(row, col));
        if was_at_boundary {
            self.recalculate_bounds();
        }
    }

    /// One past the highest populated row in a single column (spec §6.3
    /// `max_row_for_column`), or 0 if the column is empty.
    pub fn max_row_for_column(&self, col: u32) -> u32 {
        self.cells
            .keys()
            .filter(|&&(_, c)| c == col)
            .map(|&(row, _)| row + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn recalculate_bounds(&mut self) {
        let mut new_max_row = 0u32;
        let mut new_max_col = 0u32;
        for &(row, col) in self.cells.keys() {
            new_max_row = new_max_row.max(row);
            new_max_col = new_max_col.max(col);
        }
        self.max_row = new_max_row;
        self.max_col = new_max_col;
    }

    /// Coordinates of every cell carrying a formula, unsorted.
    pub fn formula_coords(&self) -> Vec<CellCoord> {
        self.cells
            .iter()
            .filter(|(_, cell)| cell.is_formula())
            .map(|(&coord, _)| coord)
            .collect()
    }

    /// Search for cells containing the query string, returned in reading
    /// order (row then column).
    pub fn find_all(
        &self,
        query: &str,
        case_sensitive: bool,
        match_entire_cell: bool,
        search_formulas: bool,
    ) -> Vec<CellCoord> {
        if query.is_empty() {
            return Vec::new();
        }

        let query_normalized = if case_sensitive { query.to_string() } else { query.to_lowercase() };

        let mut matches: Vec<CellCoord> = self
            .cells
            .iter()
            .filter(|(_, cell)| self.cell_matches(cell, &query_normalized, case_sensitive, match_entire_cell, search_formulas))
            .map(|(&pos, _)| pos)
            .collect();

        matches.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        matches
    }

    fn cell_matches(
        &self,
        cell: &Cell,
        query: &str,
        case_sensitive: bool,
        match_entire_cell: bool,
        search_formulas: bool,
    ) -> bool {
        let display_value = cell.display_value();
        let display_normalized = if case_sensitive { display_value.clone() } else { display_value.to_lowercase() };

        let display_matches = if match_entire_cell {
            display_normalized == *query
        } else {
            display_normalized.contains(query)
        };
        if display_matches {
            return true;
        }

        if search_formulas {
            if let Some(ref formula) = cell.formula {
                let formula_normalized = if case_sensitive { formula.clone() } else { formula.to_lowercase() };
                return if match_entire_cell { formula_normalized == *query } else { formula_normalized.contains(query) };
            }
        }
        false
    }

    pub fn count_matches(&self, query: &str, case_sensitive: bool, match_entire_cell: bool, search_formulas: bool) -> usize {
        self.find_all(query, case_sensitive, match_entire_cell, search_formulas).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::Value;

    #[test]
    fn test_find_all_basic() {
        let mut grid = Grid::new();
        grid.set_cell(0, 0, Cell::literal(Value::string("hello")));
        grid.set_cell(1, 0, Cell::literal(Value::string("world")));
        grid.set_cell(2, 0, Cell::literal(Value::string("hello world")));

        let results = grid.find_all("hello", false, false, false);
        assert_eq!(results, vec![(0, 0), (2, 0)]);
    }

    #[test]
    fn test_find_all_match_entire_cell() {
        let mut grid = Grid::new();
        grid.set_cell(0, 0, Cell::literal(Value::string("hello")));
        grid.set_cell(1, 0, Cell::literal(Value::string("hello world")));

        let results = grid.find_all("hello", false, true, false);
        assert_eq!(results, vec![(0, 0)]);
    }

    #[test]
    fn test_clear_cell_recomputes_bounds() {
        let mut grid = Grid::new();
        grid.set_cell(5, 5, Cell::literal(Value::string("x")));
        assert_eq!((grid.max_row, grid.max_col), (5, 5));
        grid.clear_cell(5, 5);
        assert_eq!((grid.max_row, grid.max_col), (0, 0));
    }

    #[test]
    fn test_max_row_for_column() {
        let mut grid = Grid::new();
        grid.set_cell(1, 0, Cell::literal(Value::string("a")));
        grid.set_cell(4, 0, Cell::literal(Value::string("b")));
        grid.set_cell(9, 1, Cell::literal(Value::string("c")));
        assert_eq!(grid.max_row_for_column(0), 5);
        assert_eq!(grid.max_row_for_column(2), 0);
    }

    #[test]
    fn test_formula_coords() {
        let mut grid = Grid::new();
        grid.set_cell(0, 0, Cell::literal(Value::string("x")));
        grid.set_cell(1, 0, Cell::formula("A1"));
        assert_eq!(grid.formula_coords(), vec![(1, 0)]);
    }
}
