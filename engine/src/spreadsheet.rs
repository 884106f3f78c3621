//! FILENAME: engine/src/spreadsheet.rs
//! PURPOSE: `Spreadsheet` — the multi-sheet cell store, and the generation-
//! based recomputation that backs Forward formulas (spec §4.10-4.12).
//! CONTEXT: `script_engine::CellAccess` methods take `&self`, so every
//! piece of mutable state evaluation touches (per-sheet grids, the
//! dependency graph, the generation counter, the in-flight evaluation
//! stack) lives behind a `RefCell`. `Spreadsheet` hands a `Weak` reference
//! to itself into the `CallingContext` it builds for each top-level
//! evaluation, so a formula that itself calls `EvalCell`/`ExpandRange`
//! recurses back into `compute_cell` rather than into some separate copy.
//!
//! Cycle tolerance does not come from multiple settling passes: a single
//! sweep per `recalc` is enough, because the cycle-breaker lives in
//! `eval_cell` (spec §4.10) rather than in `compute_cell` itself. A
//! `CellRef` that resolves to a cell already `in_evaluation` reads that
//! cell's last-computed value (from the *previous* generation, since this
//! one hasn't finished yet) instead of recursing — which is exactly what
//! produces the order-dependent fixpoints spec §8's concrete examples pin
//! down.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use parser::{parse_forward, CellAddress, CellRangeValue, FatalException, Value};
use script_engine::{eval_expression, CallingContext, CellAccess, Logger, NullLogger};

use crate::cell::{Cell, CellError};
use crate::dependency_extractor::extract_dependencies;
use crate::dependency_graph::{sheet_coord, DependencyGraph, SheetCoord};
use crate::grid::Grid;
use crate::recalc::RecalcOrder;

pub struct Spreadsheet {
    sheets: RefCell<HashMap<String, Grid>>,
    sheet_order: RefCell<Vec<String>>,
    default_sheet: String,
    dependencies: RefCell<DependencyGraph>,
    /// Bumped by `recalc` (twice — see spec §4.12) and by
    /// `recompute_cell`. Starts at 1 so a never-computed cell, whose
    /// `value_generation` defaults to 0, always computes on first touch.
    generation: RefCell<u64>,
    /// Cells currently mid-evaluation, innermost last. Used by `eval_cell`
    /// to find "the cell asking" when deciding whether a reference is a
    /// cycle (target already `in_evaluation`) or crosses into a foreign
    /// sheet — both of which read a cached value instead of recursing.
    eval_stack: RefCell<Vec<SheetCoord>>,
    recalc_order: RefCell<RecalcOrder>,
    logger: Rc<dyn Logger>,
    self_handle: RefCell<Option<Weak<Spreadsheet>>>,
}

impl Spreadsheet {
    pub fn new(default_sheet: impl Into<String>) -> Rc<Self> {
        Self::with_logger(default_sheet, Rc::new(NullLogger))
    }

    pub fn with_logger(default_sheet: impl Into<String>, logger: Rc<dyn Logger>) -> Rc<Self> {
        let default_sheet = default_sheet.into();
        let mut sheets = HashMap::new();
        sheets.insert(default_sheet.clone(), Grid::new());

        let spreadsheet = Rc::new(Spreadsheet {
            sheets: RefCell::new(sheets),
            sheet_order: RefCell::new(vec![default_sheet.clone()]),
            default_sheet,
            dependencies: RefCell::new(DependencyGraph::new()),
            generation: RefCell::new(1),
            eval_stack: RefCell::new(Vec::new()),
            recalc_order: RefCell::new(RecalcOrder::default()),
            logger,
            self_handle: RefCell::new(None),
        });
        *spreadsheet.self_handle.borrow_mut() = Some(Rc::downgrade(&spreadsheet));
        spreadsheet
    }

    pub fn set_recalc_order(&self, order: RecalcOrder) {
        *self.recalc_order.borrow_mut() = order;
    }

    pub fn ensure_sheet(&self, name: &str) {
        let mut sheets = self.sheets.borrow_mut();
        if !sheets.contains_key(name) {
            sheets.insert(name.to_string(), Grid::new());
            self.sheet_order.borrow_mut().push(name.to_string());
        }
    }

    fn resolve_sheet(&self, sheet: &Option<String>) -> String {
        sheet.clone().unwrap_or_else(|| self.default_sheet.clone())
    }

    /// Stores a literal value directly, clearing any formula and
    /// precedents this cell previously had.
    pub fn set_literal(&self, sheet: &str, row: u32, col: u32, value: Value) {
        self.ensure_sheet(sheet);
        self.dependencies.borrow_mut().clear_dependencies(sheet_coord(sheet, (row, col)));
        self.sheets.borrow_mut().get_mut(sheet).unwrap().set_cell(row, col, Cell::literal(value));
    }

    /// Stores a Forward formula (source text without the leading `=`),
    /// re-extracting its static dependencies into the graph immediately.
    /// The cell's own value is left stale until the next `eval_cell`/
    /// `recalc` touches it.
    pub fn set_formula(&self, sheet: &str, row: u32, col: u32, source: impl Into<String>) {
        self.ensure_sheet(sheet);
        let source = source.into();
        let coord = sheet_coord(sheet, (row, col));

        match parse_forward(&source) {
            Ok(expr) => {
                let deps: std::collections::HashSet<SheetCoord> = extract_dependencies(&expr)
                    .into_iter()
                    .map(|c| sheet_coord(sheet, c))
                    .collect();
                self.dependencies.borrow_mut().set_dependencies(coord, deps);
            }
            Err(_) => {
                self.dependencies.borrow_mut().clear_dependencies(coord);
            }
        }

        self.sheets.borrow_mut().get_mut(sheet).unwrap().set_cell(row, col, Cell::formula(source));
    }

    /// Clears a cell entirely (removes it from the grid and the graph).
    pub fn clear_cell(&self, sheet: &str, row: u32, col: u32) {
        self.dependencies.borrow_mut().clear_dependencies(sheet_coord(sheet, (row, col)));
        if let Some(grid) = self.sheets.borrow_mut().get_mut(sheet) {
            grid.clear_cell(row, col);
        }
    }

    /// Sheet names in creation order, for callers (e.g. a persistence
    /// layer) that need to enumerate every sheet.
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheet_order.borrow().clone()
    }

    /// Every populated cell on a sheet, unordered, for bulk export. Values
    /// are computed against the current generation before being returned.
    pub fn cells(&self, sheet: &str) -> Vec<(u32, u32, Cell)> {
        let coords: Vec<(u32, u32)> = {
            let sheets = self.sheets.borrow();
            match sheets.get(sheet) {
                Some(grid) => grid.cells.keys().copied().collect(),
                None => return Vec::new(),
            }
        };
        for &(row, col) in &coords {
            self.compute_cell(sheet, row, col);
        }
        let sheets = self.sheets.borrow();
        let grid = match sheets.get(sheet) {
            Some(grid) => grid,
            None => return Vec::new(),
        };
        coords
            .into_iter()
            .filter_map(|(row, col)| grid.get_cell(row, col).map(|c| (row, col, c.clone())))
            .collect()
    }

    /// Current display string for a cell ("" if empty).
    pub fn display_value(&self, sheet: &str, row: u32, col: u32) -> String {
        self.compute_cell(sheet, row, col);
        self.sheets
            .borrow()
            .get(sheet)
            .and_then(|g| g.get_cell(row, col))
            .map(|c| c.display_value())
            .unwrap_or_default()
    }

    /// Current value for a cell (`Value::Nil` if empty).
    pub fn value_at(&self, sheet: &str, row: u32, col: u32) -> Value {
        self.compute_cell(sheet, row, col);
        self.sheets
            .borrow()
            .get(sheet)
            .and_then(|g| g.get_cell(row, col))
            .map(|c| c.value.clone())
            .unwrap_or(Value::Nil)
    }

    /// A user-driven recompute of exactly one cell — like `recalc`, this
    /// advances the generation (spec invariant 3) so the refreshed value
    /// isn't mistaken for stale by whatever runs next.
    pub fn recompute_cell(&self, sheet: &str, row: u32, col: u32) {
        *self.generation.borrow_mut() += 1;
        self.compute_cell(sheet, row, col);
    }

    fn make_context(&self) -> CallingContext {
        let cells: Option<Rc<dyn CellAccess>> = self
            .self_handle
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|rc| rc as Rc<dyn CellAccess>);
        match cells {
            Some(cells) => CallingContext::with_cell_access(self.logger.clone(), cells),
            None => CallingContext::new(self.logger.clone()),
        }
    }

    fn cell_value_or_nil(&self, sheet: &str, row: u32, col: u32) -> Value {
        self.sheets
            .borrow()
            .get(sheet)
            .and_then(|g| g.get_cell(row, col))
            .map(|c| c.value.clone())
            .unwrap_or(Value::Nil)
    }

    /// Computes a single cell's value (spec §4.11). A non-formula cell, or
    /// one already computed for the current generation, is a no-op — the
    /// only memoization is the generation match, there is no separate
    /// "settled" flag. Otherwise this cell is pushed onto `eval_stack`,
    /// `in_evaluation` is set so `eval_cell` can recognize re-entrance
    /// through it, the formula is parsed and evaluated, and the result
    /// (or the parse/evaluation error) is stored.
    fn compute_cell(&self, sheet: &str, row: u32, col: u32) {
        let coord = sheet_coord(sheet, (row, col));
        let current_generation = *self.generation.borrow();

        let source = {
            let sheets = self.sheets.borrow();
            let Some(cell) = sheets.get(sheet).and_then(|g| g.get_cell(row, col)) else {
                return;
            };
            if cell.value_generation == current_generation {
                return;
            }
            match &cell.formula {
                Some(source) => source.clone(),
                None => return,
            }
        };

        self.eval_stack.borrow_mut().push(coord);
        {
            let mut sheets = self.sheets.borrow_mut();
            if let Some(cell) = sheets.get_mut(sheet).and_then(|g| g.get_cell_mut(row, col)) {
                cell.in_evaluation = true;
                cell.recursed = false;
            }
        }

        let outcome = match parse_forward(&source) {
            Ok(expr) => {
                let ctx = self.make_context();
                let globals = ctx.globals.clone();
                eval_expression(&expr, &globals, &ctx).map_err(|e| CellError::Evaluation(e.to_string()))
            }
            Err(e) => Err(CellError::Parse(e.to_string())),
        };

        {
            let mut sheets = self.sheets.borrow_mut();
            if let Some(cell) = sheets.get_mut(sheet).and_then(|g| g.get_cell_mut(row, col)) {
                match outcome {
                    Ok(value) => {
                        cell.value = value;
                        cell.error = None;
                    }
                    Err(err) => {
                        cell.error = Some(err);
                    }
                }
                cell.in_evaluation = false;
                cell.value_generation = current_generation;
            }
        }
        self.eval_stack.borrow_mut().pop();
    }

    /// Recomputes every formula cell on every sheet, once (spec §4.12):
    /// bumps the generation, sweeps all formula cells in `recalc_order`,
    /// then bumps the generation again so the next action starts fresh.
    /// Which value a cyclic group of cells settles on depends on the
    /// sweep order — see spec §8 examples 3 and 4.
    pub fn recalc(&self) {
        *self.generation.borrow_mut() += 1;

        let sheet_names: Vec<String> = self.sheet_order.borrow().clone();
        let order = *self.recalc_order.borrow();
        for name in &sheet_names {
            let mut coords = {
                let sheets = self.sheets.borrow();
                sheets.get(name).map(|g| g.formula_coords()).unwrap_or_default()
            };
            order.sort(&mut coords);
            for (row, col) in coords {
                self.compute_cell(name, row, col);
            }
        }

        *self.generation.borrow_mut() += 1;
    }
}

impl CellAccess for Spreadsheet {
    /// Spec §4.10: resolving a `CellRef` constant from whatever cell is
    /// currently being evaluated (the top of `eval_stack`, if any).
    fn eval_cell(&self, address: &CellAddress) -> Result<Value, FatalException> {
        let target_sheet = self.resolve_sheet(&address.sheet);
        let current = self.eval_stack.borrow().last().cloned();

        let target_in_evaluation = self
            .sheets
            .borrow()
            .get(&target_sheet)
            .and_then(|g| g.get_cell(address.row, address.col))
            .map(|c| c.in_evaluation)
            .unwrap_or(false);

        let is_foreign_sheet = match (&address.sheet, &current) {
            (Some(explicit), Some((current_sheet, _, _))) => explicit != current_sheet,
            _ => false,
        };

        if target_in_evaluation {
            // Re-entrance: this is a cycle. Mark whichever cell is asking
            // (not the target) and break the recursion by reading the
            // target's value as it stood before this generation's sweep
            // touched it.
            if let Some((current_sheet, current_row, current_col)) = &current {
                let mut sheets = self.sheets.borrow_mut();
                if let Some(cell) = sheets.get_mut(current_sheet).and_then(|g| g.get_cell_mut(*current_row, *current_col)) {
                    cell.recursed = true;
                }
            }
            return Ok(self.cell_value_or_nil(&target_sheet, address.row, address.col));
        }

        if is_foreign_sheet {
            // Cross-sheet references never recurse into the target's own
            // computation; they read whatever value it last settled on.
            return Ok(self.cell_value_or_nil(&target_sheet, address.row, address.col));
        }

        self.compute_cell(&target_sheet, address.row, address.col);
        Ok(self.cell_value_or_nil(&target_sheet, address.row, address.col))
    }

    fn expand_range(&self, range: &CellRangeValue) -> Result<Vec<Value>, FatalException> {
        let sheet = self.resolve_sheet(&range.start.sheet);
        let (min_row, max_row) = (range.start.row.min(range.end.row), range.start.row.max(range.end.row));
        let (min_col, max_col) = (range.start.col.min(range.end.col), range.start.col.max(range.end.col));

        // Column-by-column regardless of `recalc_order` (spec §4.13): a
        // single column degenerates to top-to-bottom, a single row to
        // left-to-right, and a full 2-D block to column-major — a range is
        // a fixed shape on the page, not a recalculation schedule.
        let mut values = Vec::new();
        for col in min_col..=max_col {
            for row in min_row..=max_row {
                let addr = CellAddress { sheet: range.start.sheet.clone(), row, col };
                values.push(self.eval_cell(&addr)?);
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use numeric::Number;

    fn addr(row: u32, col: u32) -> CellAddress {
        CellAddress { sheet: None, row, col }
    }

    fn n(v: i64) -> Value {
        Value::Number(Number::from_i64(v, 0))
    }

    #[test]
    fn literal_cell_round_trips() {
        let sheet = Spreadsheet::new("Sheet1");
        sheet.set_literal("Sheet1", 0, 0, n(42));
        assert_eq!(sheet.display_value("Sheet1", 0, 0), "42");
    }

    #[test]
    fn simple_arithmetic_formula() {
        let sheet = Spreadsheet::new("Sheet1");
        sheet.set_literal("Sheet1", 0, 0, n(2));
        sheet.set_formula("Sheet1", 0, 1, "A0 + 3");
        assert_eq!(sheet.display_value("Sheet1", 0, 1), "5");
    }

    #[test]
    fn range_expands_column_major() {
        let sheet = Spreadsheet::new("Sheet1");
        sheet.set_literal("Sheet1", 0, 0, n(1));
        sheet.set_literal("Sheet1", 1, 0, n(2));
        sheet.set_literal("Sheet1", 2, 0, n(3));

        let range = CellRangeValue { start: addr(0, 0), end: addr(2, 0) };
        let values = sheet.expand_range(&range).unwrap();
        assert_eq!(values, vec![n(1), n(2), n(3)]);
    }

    #[test]
    fn formula_sums_several_cell_references() {
        let sheet = Spreadsheet::new("Sheet1");
        sheet.set_literal("Sheet1", 0, 0, n(1));
        sheet.set_literal("Sheet1", 1, 0, n(2));
        sheet.set_literal("Sheet1", 2, 0, n(3));
        sheet.set_formula("Sheet1", 3, 0, "A0 + A1 + A2");
        assert_eq!(sheet.display_value("Sheet1", 3, 0), "6");
    }

    /// Spec §8 example 3: A0 = "B1", B1 = "A0", previously Float(2) and
    /// Float(3), column-major/top-down/left-to-right. A0 is visited
    /// first; resolving "B1" isn't yet in_evaluation so it recurses and
    /// computes fresh (reading A0's now-in-evaluation previous value 2
    /// for its own "A0" reference); both settle on 2.
    #[test]
    fn mutual_cycle_column_major_settles_on_first_cells_previous_value() {
        let sheet = Spreadsheet::new("Sheet1");
        sheet.set_formula("Sheet1", 0, 0, "B1"); // A0, 0-indexed (row 0, col 0)
        sheet.set_formula("Sheet1", 1, 1, "A0"); // B1 (row 1, col 1)
        sheet.sheets.borrow_mut().get_mut("Sheet1").unwrap().get_cell_mut(0, 0).unwrap().value = n(2);
        sheet.sheets.borrow_mut().get_mut("Sheet1").unwrap().get_cell_mut(1, 1).unwrap().value = n(3);

        sheet.set_recalc_order(RecalcOrder { column_major: true, top_down: true, left_to_right: true });
        sheet.recalc();

        assert_eq!(sheet.display_value("Sheet1", 0, 0), "2");
        assert_eq!(sheet.display_value("Sheet1", 1, 1), "2");
    }

    /// Spec §8 example 4: same cycle, row-major/bottom-up/right-to-left —
    /// B1 is visited first this time, so both settle on 3 instead.
    #[test]
    fn mutual_cycle_reverse_order_settles_on_second_cells_previous_value() {
        let sheet = Spreadsheet::new("Sheet1");
        sheet.set_formula("Sheet1", 0, 0, "B1");
        sheet.set_formula("Sheet1", 1, 1, "A0");
        sheet.sheets.borrow_mut().get_mut("Sheet1").unwrap().get_cell_mut(0, 0).unwrap().value = n(2);
        sheet.sheets.borrow_mut().get_mut("Sheet1").unwrap().get_cell_mut(1, 1).unwrap().value = n(3);

        sheet.set_recalc_order(RecalcOrder { column_major: false, top_down: false, left_to_right: false });
        sheet.recalc();

        assert_eq!(sheet.display_value("Sheet1", 0, 0), "3");
        assert_eq!(sheet.display_value("Sheet1", 1, 1), "3");
    }

    #[test]
    fn cycle_marks_the_referencing_cell_recursed() {
        let sheet = Spreadsheet::new("Sheet1");
        sheet.set_formula("Sheet1", 0, 0, "B1");
        sheet.set_formula("Sheet1", 1, 1, "A0");
        sheet.set_recalc_order(RecalcOrder { column_major: true, top_down: true, left_to_right: true });
        sheet.recalc();

        let b1_recursed = sheet.sheets.borrow().get("Sheet1").unwrap().get_cell(1, 1).unwrap().recursed;
        assert!(b1_recursed);
    }

    #[test]
    fn parse_error_is_reported_as_cell_error() {
        let sheet = Spreadsheet::new("Sheet1");
        sheet.set_formula("Sheet1", 0, 0, "1 +");
        let _ = sheet.display_value("Sheet1", 0, 0);
        let cell = sheet.sheets.borrow().get("Sheet1").unwrap().get_cell(0, 0).unwrap().clone();
        assert!(matches!(cell.error, Some(CellError::Parse(_))));
    }

    #[test]
    fn eval_cell_trait_resolves_default_sheet() {
        let sheet = Spreadsheet::new("Sheet1");
        sheet.set_literal("Sheet1", 0, 0, Value::string("hi"));
        let v = sheet.eval_cell(&addr(0, 0)).unwrap();
        assert_eq!(v, Value::string("hi"));
    }

    #[test]
    fn foreign_sheet_reference_reads_cached_value_without_recursing() {
        let sheet = Spreadsheet::new("Sheet1");
        sheet.ensure_sheet("Sheet2");
        sheet.set_literal("Sheet2", 0, 0, n(9));
        sheet.set_formula("Sheet1", 0, 0, "Sheet2!A0");
        // Sheet2!A0 is a literal, never in_evaluation, so this still
        // resolves normally even though it crosses sheets.
        assert_eq!(sheet.display_value("Sheet1", 0, 0), "9");
    }
}
