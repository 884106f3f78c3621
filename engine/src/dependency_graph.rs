//! FILENAME: engine/src/dependency_graph.rs
//! PURPOSE: Tracks which cells reference which other cells.
//! CONTEXT: Precedents are a formula cell's inputs; dependents are the
//! reverse lookup (who references this cell). Unlike a conventional
//! spreadsheet engine, this graph does not reject cycles — spec §4.10-4.12
//! require recalculation to tolerate them, settling via generation counters
//! and a `recursed` flag in `recalc.rs` instead. This module only keeps the
//! adjacency bookkeeping; no topological sort, no cycle detection.

use std::collections::{HashMap, HashSet};

use crate::grid::CellCoord;

/// A cell coordinate qualified by sheet name, used as the graph's key so
/// dependencies can cross sheets.
pub type SheetCoord = (String, u32, u32);

pub fn sheet_coord(sheet: &str, coord: CellCoord) -> SheetCoord {
    (sheet.to_string(), coord.0, coord.1)
}

#[derive(Debug, Default)]
pub struct DependencyGraph {
    precedents: HashMap<SheetCoord, HashSet<SheetCoord>>,
    dependents: HashMap<SheetCoord, HashSet<SheetCoord>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        DependencyGraph::default()
    }

    /// Replaces a cell's precedents, updating both directions. Does not
    /// check for or reject cycles — see module docs.
    pub fn set_dependencies(&mut self, cell: SheetCoord, new_precedents: HashSet<SheetCoord>) {
        self.clear_dependencies(cell.clone());
        if !new_precedents.is_empty() {
            for prec in &new_precedents {
                self.dependents.entry(prec.clone()).or_default().insert(cell.clone());
            }
            self.precedents.insert(cell, new_precedents);
        }
    }

    pub fn clear_dependencies(&mut self, cell: SheetCoord) {
        if let Some(old_precs) = self.precedents.remove(&cell) {
            for prec in old_precs {
                if let Some(deps) = self.dependents.get_mut(&prec) {
                    deps.remove(&cell);
                    if deps.is_empty() {
                        self.dependents.remove(&prec);
                    }
                }
            }
        }
    }

    pub fn get_precedents(&self, cell: &SheetCoord) -> Option<&HashSet<SheetCoord>> {
        self.precedents.get(cell)
    }

    pub fn get_dependents(&self, cell: &SheetCoord) -> Option<&HashSet<SheetCoord>> {
        self.dependents.get(cell)
    }

    /// All cells transitively reachable by following dependents from
    /// `cell` — used to decide what a change needs to invalidate, not to
    /// order recalculation (that's `recalc`'s job, by sheep-walking every
    /// formula cell each pass).
    pub fn transitive_dependents(&self, cell: &SheetCoord) -> HashSet<SheetCoord> {
        let mut result = HashSet::new();
        let mut stack = vec![cell.clone()];
        while let Some(current) = stack.pop() {
            if let Some(deps) = self.dependents.get(&current) {
                for dep in deps {
                    if result.insert(dep.clone()) {
                        stack.push(dep.clone());
                    }
                }
            }
        }
        result
    }

    pub fn formula_cell_count(&self) -> usize {
        self.precedents.len()
    }

    pub fn dependency_count(&self) -> usize {
        self.precedents.values().map(|v| v.len()).sum()
    }

    pub fn clear(&mut self) {
        self.precedents.clear();
        self.dependents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(sheet: &str, row: u32, col: u32) -> SheetCoord {
        sheet_coord(sheet, (row, col))
    }

    fn set_of(coords: &[SheetCoord]) -> HashSet<SheetCoord> {
        coords.iter().cloned().collect()
    }

    #[test]
    fn set_and_get_dependencies() {
        let mut graph = DependencyGraph::new();
        let (a1, a2, a3) = (c("S", 0, 0), c("S", 1, 0), c("S", 2, 0));
        graph.set_dependencies(a3.clone(), set_of(&[a1.clone(), a2.clone()]));

        let precs = graph.get_precedents(&a3).unwrap();
        assert!(precs.contains(&a1) && precs.contains(&a2));
        assert!(graph.get_dependents(&a1).unwrap().contains(&a3));
    }

    #[test]
    fn clear_dependencies_removes_both_directions() {
        let mut graph = DependencyGraph::new();
        let (a1, a3) = (c("S", 0, 0), c("S", 2, 0));
        graph.set_dependencies(a3.clone(), set_of(&[a1.clone()]));
        graph.clear_dependencies(a3.clone());
        assert!(graph.get_precedents(&a3).is_none());
        assert!(graph.get_dependents(&a1).is_none());
    }

    #[test]
    fn allows_a_direct_cycle() {
        // A1 = A2, A2 = A1: neither set_dependencies call rejects this.
        let mut graph = DependencyGraph::new();
        let (a1, a2) = (c("S", 0, 0), c("S", 1, 0));
        graph.set_dependencies(a1.clone(), set_of(&[a2.clone()]));
        graph.set_dependencies(a2.clone(), set_of(&[a1.clone()]));
        assert!(graph.get_precedents(&a1).unwrap().contains(&a2));
        assert!(graph.get_precedents(&a2).unwrap().contains(&a1));
    }

    #[test]
    fn transitive_dependents_follows_chain() {
        let mut graph = DependencyGraph::new();
        let (a1, a2, a3) = (c("S", 0, 0), c("S", 1, 0), c("S", 2, 0));
        graph.set_dependencies(a2.clone(), set_of(&[a1.clone()]));
        graph.set_dependencies(a3.clone(), set_of(&[a2.clone()]));

        let affected = graph.transitive_dependents(&a1);
        assert_eq!(affected, set_of(&[a2, a3]));
    }

    #[test]
    fn counts() {
        let mut graph = DependencyGraph::new();
        let (a1, a2, a3) = (c("S", 0, 0), c("S", 1, 0), c("S", 2, 0));
        graph.set_dependencies(a2.clone(), set_of(&[a1.clone()]));
        graph.set_dependencies(a3, set_of(&[a1, a2]));
        assert_eq!(graph.formula_cell_count(), 2);
        assert_eq!(graph.dependency_count(), 3);
    }
}
