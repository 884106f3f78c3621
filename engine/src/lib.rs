//! FILENAME: engine/src/lib.rs
//! PURPOSE: Main library entry point for the spreadsheet engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.
//! Owns the multi-sheet cell store, its cycle-tolerant recalculation
//! (spec §4.10-4.12), and the static dependency analysis that feeds it;
//! the Forward/Backward language itself lives in `parser`/`script-engine`.

pub mod cell;
pub mod coord;
pub mod dependency_extractor;
pub mod dependency_graph;
pub mod grid;
pub mod recalc;
pub mod spreadsheet;

pub use cell::{Cell, CellError};
pub use coord::{a1_to_coord, col_to_index, coord_to_a1, index_to_col};
pub use dependency_extractor::extract_dependencies;
pub use dependency_graph::{sheet_coord, DependencyGraph, SheetCoord};
pub use grid::{CellCoord, Grid};
pub use recalc::RecalcOrder;
pub use spreadsheet::Spreadsheet;

#[cfg(test)]
mod tests {
    use super::*;
    use numeric::Number;
    use parser::Value;

    #[test]
    fn it_creates_cells() {
        let cell = Cell::literal(Value::Number(Number::from_i64(42, 0)));
        assert_eq!(cell.value, Value::Number(Number::from_i64(42, 0)));
    }

    #[test]
    fn it_manages_grid() {
        let mut grid = Grid::new();
        let cell = Cell::literal(Value::string("Hello"));
        grid.set_cell(0, 0, cell);

        let retrieved = grid.get_cell(0, 0);
        assert!(retrieved.is_some());
        if let Some(c) = retrieved {
            assert_eq!(c.value, Value::string("Hello"));
        }
    }

    #[test]
    fn integration_test_dependency_workflow() {
        let mut graph = DependencyGraph::new();
        let a1 = sheet_coord("Sheet1", a1_to_coord("A", 1));
        let b1 = sheet_coord("Sheet1", a1_to_coord("B", 1));
        let c1 = sheet_coord("Sheet1", a1_to_coord("C", 1));

        let mut deps = std::collections::HashSet::new();
        deps.insert(a1.clone());
        deps.insert(b1);
        graph.set_dependencies(c1.clone(), deps);

        let affected = graph.transitive_dependents(&a1);
        assert!(affected.contains(&c1));
    }

    #[test]
    fn integration_test_cycle_is_allowed() {
        let mut graph = DependencyGraph::new();
        let a1 = sheet_coord("Sheet1", a1_to_coord("A", 1));
        let b1 = sheet_coord("Sheet1", a1_to_coord("B", 1));

        graph.set_dependencies(a1.clone(), std::collections::HashSet::from([b1.clone()]));
        graph.set_dependencies(b1.clone(), std::collections::HashSet::from([a1.clone()]));

        assert!(graph.get_precedents(&a1).unwrap().contains(&b1));
        assert!(graph.get_precedents(&b1).unwrap().contains(&a1));
    }

    #[test]
    fn integration_test_full_evaluation_workflow() {
        let sheet = Spreadsheet::new("Sheet1");
        let a1 = a1_to_coord("A", 1);
        let b1 = a1_to_coord("B", 1);
        let c1 = a1_to_coord("C", 1);

        sheet.set_literal("Sheet1", a1.0, a1.1, Value::Number(Number::from_i64(10, 0)));
        sheet.set_literal("Sheet1", b1.0, b1.1, Value::Number(Number::from_i64(20, 0)));
        sheet.set_formula("Sheet1", c1.0, c1.1, &format!("{}+{}", coord_to_a1(a1), coord_to_a1(b1)));

        assert_eq!(sheet.display_value("Sheet1", c1.0, c1.1), "30");
    }

    #[test]
    fn integration_test_comparison_evaluation() {
        // Forward has no conditional expression; comparisons evaluate to
        // Number(1)/Number(0), so branching is expressed arithmetically.
        let sheet = Spreadsheet::new("Sheet1");
        sheet.set_literal("Sheet1", 0, 0, Value::Number(Number::from_i64(100, 0)));
        sheet.set_formula("Sheet1", 0, 1, "(A0 > 50) * (A0 * 2) + (A0 <= 50) * (A0 / 2)");
        assert_eq!(sheet.display_value("Sheet1", 0, 1), "200");
    }
}
