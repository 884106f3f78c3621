//! FILENAME: engine/src/dependency_extractor.rs
//! PURPOSE: Walks a parsed Forward `Expression` tree to find every cell it
//! statically references, so `recalc` can build the dependency graph.
//! CONTEXT: A `CellRef`/`CellRange` node anywhere in the tree — including
//! inside `EvalCell`/`ExpandRange` stdlib-call arguments — counts as a
//! dependency. References built dynamically (e.g. a string concatenated at
//! runtime and passed to `EvalCell`) cannot be seen here; those cells are
//! still evaluated correctly on demand, they're just invisible to the
//! precomputed dependency graph until the formula is re-extracted after a
//! change touches them indirectly.

use std::collections::HashSet;

use parser::Expression;

use crate::grid::CellCoord;

pub fn extract_dependencies(expr: &Expression) -> HashSet<CellCoord> {
    let mut deps = HashSet::new();
    walk(expr, &mut deps);
    deps
}

fn walk(expr: &Expression, deps: &mut HashSet<CellCoord>) {
    match expr {
        Expression::Literal(_) | Expression::Identifier(_) => {}
        Expression::CellRef(addr) => {
            deps.insert((addr.row, addr.col));
        }
        Expression::CellRange(range) => {
            let (min_row, max_row) = (range.start.row.min(range.end.row), range.start.row.max(range.end.row));
            let (min_col, max_col) = (range.start.col.min(range.end.col), range.start.col.max(range.end.col));
            for r in min_row..=max_row {
                for c in min_col..=max_col {
                    deps.insert((r, c));
                }
            }
        }
        Expression::Binary { left, right, .. } => {
            walk(left, deps);
            walk(right, deps);
        }
        Expression::Unary { operand, .. } => walk(operand, deps),
        Expression::StdlibCall { args, .. } | Expression::ArrayLiteral(args) => {
            for arg in args {
                walk(arg, deps);
            }
        }
        Expression::Call { callee, args, .. } => {
            walk(callee, deps);
            for arg in args {
                walk(arg, deps);
            }
        }
        Expression::DictionaryLiteral(pairs) => {
            for (k, v) in pairs {
                walk(k, deps);
                walk(v, deps);
            }
        }
        Expression::Index { target, index } => {
            walk(target, deps);
            walk(index, deps);
        }
        // A function literal's body is not evaluated at definition time
        // (only its capture expressions are) — capture expressions are the
        // only part that can reference cells eagerly.
        Expression::FunctionLiteral(def) => {
            for (_, cap_expr) in &def.captures {
                walk(cap_expr, deps);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::parse_forward;

    fn deps_of(src: &str) -> HashSet<CellCoord> {
        extract_dependencies(&parse_forward(src).unwrap())
    }

    #[test]
    fn single_cell() {
        assert_eq!(deps_of("A1"), HashSet::from([(1, 0)]));
    }

    #[test]
    fn binary_expression() {
        assert_eq!(deps_of("A1 + B2"), HashSet::from([(1, 0), (2, 1)]));
    }

    #[test]
    fn range_expands() {
        assert_eq!(deps_of("A1:A3"), HashSet::from([(1, 0), (2, 0), (3, 0)]));
    }

    #[test]
    fn reversed_range_normalizes() {
        assert_eq!(deps_of("B2:A1"), HashSet::from([(1, 0), (1, 1), (2, 0), (2, 1)]));
    }

    #[test]
    fn literal_only_has_no_dependencies() {
        assert!(deps_of("5 + 3").is_empty());
    }

    #[test]
    fn duplicate_references_collapse() {
        assert_eq!(deps_of("A1 + A1").len(), 1);
    }
}
