//! FILENAME: persistence/src/backend.rs
//! PURPOSE: `SpreadsheetBackend` — the pluggable storage contract a
//! controller delegates to (spec §6.3). `engine::Spreadsheet` keeps its
//! own cells in memory directly; this trait exists for layers that sit
//! underneath or alongside it and want a swappable fault-in/evict/persist
//! boundary (a file-backed store, a cache in front of a database, …).
//! CONTEXT: spec §6.3 frames several of these (`return_cell`,
//! `make_evergreen`, `commit_cell`, `dispose`, `stash_result`) as taking
//! the borrowed cell pointer handed out by `get_cell_at`. That shape
//! doesn't translate to Rust: holding a `&mut Cell` loaned from a backend
//! while calling a further `&mut self` method on that same backend is
//! exactly the aliasing `&mut` forbids. Every hook here is keyed by
//! `(sheet, col, row)` instead of by a loaned pointer — same contract,
//! addressed rather than borrowed.

use engine::Cell;

/// A pluggable backend for cell storage (spec §6.3). All coordinates are
/// 0-indexed, matching `engine::grid::CellCoord`.
pub trait SpreadsheetBackend {
    /// One past the highest populated column on `sheet`.
    fn max_column(&self, sheet: &str) -> u32;
    /// One past the highest populated row on `sheet`, across all columns.
    fn max_row(&self, sheet: &str) -> u32;
    /// One past the highest populated row in a single column.
    fn max_row_for_column(&self, sheet: &str, col: u32) -> u32;

    /// Non-owning mutable borrow of a cell; `None` if absent. A backend
    /// may fault the cell in from persistent storage here.
    fn get_cell_at(&mut self, sheet: &str, col: u32, row: u32) -> Option<&mut Cell>;
    /// Idempotently creates an empty cell at `(col, row)`.
    fn init_cell_at(&mut self, sheet: &str, col: u32, row: u32);

    fn clear_cell_at(&mut self, sheet: &str, col: u32, row: u32);
    fn clear_column(&mut self, sheet: &str, col: u32);
    fn clear_row(&mut self, sheet: &str, row: u32);

    /// Releases whatever a prior `get_cell_at` loaned out for this cell.
    /// A no-op for an in-memory backend; a fault-in backend would evict
    /// the cell here unless it has been pinned `evergreen`.
    fn return_cell(&mut self, sheet: &str, col: u32, row: u32);

    fn is_cell_present(&self, sheet: &str, col: u32, row: u32) -> bool;

    /// Pins a cell in the backend's cache; it survives a `return_cell`
    /// that would otherwise evict it.
    fn make_evergreen(&mut self, sheet: &str, col: u32, row: u32);
    /// Persists the cell's current edits and un-pins it.
    fn commit_cell(&mut self, sheet: &str, col: u32, row: u32);
    /// Discards the cell's edits and un-pins it.
    fn dispose(&mut self, sheet: &str, col: u32, row: u32);
    /// Persists the last-computed value alongside the generation it was
    /// computed for, so a cold restart can skip recomputation until the
    /// next `recalc`.
    fn stash_result(&mut self, sheet: &str, col: u32, row: u32, generation: u64);
}
