//! FILENAME: engine/src/recalc.rs
//! PURPOSE: The sweep order `Spreadsheet::recalc` walks formula cells in
//! (spec §4.12).
//! CONTEXT: A conventional spreadsheet engine topologically sorts the
//! dependency graph and rejects any formula change that would introduce a
//! cycle. This one does the opposite: a cycle is allowed to exist, and the
//! actual cycle-breaking happens per reference in `Spreadsheet::eval_cell`
//! (spec §4.10) — a `CellRef` that resolves to a cell already mid-
//! evaluation reads that cell's last-computed value instead of recursing.
//! A single sweep per recalc is enough to reach a fixpoint; which fixpoint
//! a cyclic group settles on depends on this sweep order, which is why the
//! order itself is configurable rather than fixed.

use crate::grid::CellCoord;

/// The order `recalc` walks a sheet's formula cells in. Three independent
/// flags rather than a single enum, since each axis (row/column priority,
/// sweep direction, left/right bias) is orthogonal — the original exposed
/// them as separate toggles rather than a fixed set of named presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecalcOrder {
    /// Column-major (iterate all rows of a column before moving to the
    /// next column) instead of the default row-major.
    pub column_major: bool,
    /// Top-to-bottom / left-to-right (ascending) instead of the reverse.
    pub top_down: bool,
    pub left_to_right: bool,
}

impl Default for RecalcOrder {
    fn default() -> Self {
        RecalcOrder {
            column_major: false,
            top_down: true,
            left_to_right: true,
        }
    }
}

impl RecalcOrder {
    /// Sorts `coords` in place according to the configured order. Used by
    /// `recalc`'s full-sheet sweep; cell-range expansion (`ExpandRange`)
    /// always iterates row-major regardless of this setting — that's a
    /// property of the range, not of a recalculation pass.
    pub fn sort(&self, coords: &mut [CellCoord]) {
        coords.sort_by(|a, b| {
            let (a_row, a_col) = *a;
            let (b_row, b_col) = *b;
            let (primary_a, primary_b, secondary_a, secondary_b) = if self.column_major {
                (a_col, b_col, a_row, b_row)
            } else {
                (a_row, b_row, a_col, b_col)
            };
            let primary_ord = if self.top_down {
                primary_a.cmp(&primary_b)
            } else {
                primary_b.cmp(&primary_a)
            };
            primary_ord.then_with(|| {
                if self.left_to_right {
                    secondary_a.cmp(&secondary_b)
                } else {
                    secondary_b.cmp(&secondary_a)
                }
            })
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_top_down_left_to_right_is_reading_order() {
        let order = RecalcOrder::default();
        let mut coords = vec![(1, 0), (0, 1), (0, 0)];
        order.sort(&mut coords);
        assert_eq!(coords, vec![(0, 0), (0, 1), (1, 0)]);
    }

    #[test]
    fn column_major_groups_by_column_first() {
        let order = RecalcOrder { column_major: true, top_down: true, left_to_right: true };
        let mut coords = vec![(0, 1), (1, 0), (0, 0)];
        order.sort(&mut coords);
        assert_eq!(coords, vec![(0, 0), (1, 0), (0, 1)]);
    }

    #[test]
    fn bottom_up_reverses_primary_axis() {
        let order = RecalcOrder { column_major: false, top_down: false, left_to_right: true };
        let mut coords = vec![(0, 0), (1, 0)];
        order.sort(&mut coords);
        assert_eq!(coords, vec![(1, 0), (0, 0)]);
    }
}
