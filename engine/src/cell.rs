//! FILENAME: engine/src/cell.rs
//! PURPOSE: The fundamental data structures for a single spreadsheet cell.
//! CONTEXT: Separates the author's input (a Forward formula source string)
//! from the computed result. A cell also carries the generational
//! bookkeeping (spec §4.10-4.12) that lets recalculation tolerate circular
//! references instead of rejecting them: the generation at which its cached
//! value was last produced (memoization, not a settling flag), whether it
//! is mid-evaluation this pass, and whether a cycle reached back through it
//! this generation.

use parser::Value;

/// What went wrong computing a cell, kept separate from `Value` so a
/// display layer can distinguish "this cell is Nil" from "this cell's
/// formula failed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    /// The formula text didn't parse as a Forward expression.
    Parse(String),
    /// The formula parsed but evaluation raised a typed/fatal exception.
    Evaluation(String),
}

impl std::fmt::Display for CellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellError::Parse(msg) => write!(f, "#PARSE: {msg}"),
            CellError::Evaluation(msg) => write!(f, "#ERROR: {msg}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    /// `None` for a cell holding a literal value entered directly (no `=`
    /// prefix); `Some(source)` for a Forward formula, source text with any
    /// leading `=` already stripped by the caller.
    pub formula: Option<String>,
    pub value: Value,
    pub error: Option<CellError>,

    /// The generation (spreadsheet-wide counter, bumped by `recalc` and by
    /// any explicit single-cell recompute) at which `value` was last
    /// computed. `compute_cell` treats a match against the current
    /// generation as "already done" and returns the cached value rather
    /// than recomputing — this is the only memoization, there is no
    /// separate "settled" flag.
    pub value_generation: u64,
    /// True while this cell's formula is being evaluated. A `CellRef` that
    /// resolves to a cell with this flag set has found a cycle: it reads
    /// that cell's last-computed value instead of recursing into it.
    pub in_evaluation: bool,
    /// Set on a cell when something it referenced (directly or
    /// transitively) bounced the evaluation back here mid-cycle. Purely
    /// informational bookkeeping — callers can use it to flag circular
    /// cells in the UI; it does not change what `compute_cell` does.
    pub recursed: bool,
    /// Backend cache pin (spec §6.3 `make_evergreen`): a cell pinned
    /// evergreen survives whatever release/eviction policy a storage
    /// backend applies to ordinary cells.
    pub evergreen: bool,
}

impl Cell {
    pub fn empty() -> Self {
        Cell {
            formula: None,
            value: Value::Nil,
            error: None,
            value_generation: 0,
            in_evaluation: false,
            recursed: false,
            evergreen: false,
        }
    }

    pub fn literal(value: Value) -> Self {
        Cell {
            value,
            ..Self::empty()
        }
    }

    /// `text` is the raw Forward source, without a leading `=`.
    pub fn formula(text: impl Into<String>) -> Self {
        Cell {
            formula: Some(text.into()),
            ..Self::empty()
        }
    }

    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }

    pub fn display_value(&self) -> String {
        match &self.error {
            Some(e) => e.to_string(),
            None => self.value.to_string(),
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_cell_has_no_formula() {
        let c = Cell::literal(Value::string("hi"));
        assert!(!c.is_formula());
        assert_eq!(c.display_value(), "hi");
    }

    #[test]
    fn formula_cell_display_falls_back_to_error() {
        let mut c = Cell::formula("A1 + 1");
        c.error = Some(CellError::Evaluation("Error adding Float to String".into()));
        assert_eq!(c.display_value(), "#ERROR: Error adding Float to String");
    }

    #[test]
    fn default_cell_is_nil() {
        let c = Cell::default();
        assert_eq!(c.value, Value::Nil);
        assert_eq!(c.value_generation, 0);
        assert!(!c.evergreen);
    }
}
