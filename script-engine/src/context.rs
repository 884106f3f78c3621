//! FILENAME: script-engine/src/context.rs
//! PURPOSE: `CallingContext` — everything a single evaluation needs that
//! isn't part of the AST: the numeric environment, the interactive
//! logger, the call stack (for backtraces), and an optional hook back
//! into whatever spreadsheet is hosting this evaluation.
//! CONTEXT: `engine` cannot be a dependency here (it depends on this
//! crate to evaluate cells), so `EvalCell`/`ExpandRange` are expressed as
//! a trait object the host implements — spec §6.3's "pluggable backend"
//! idea, applied one layer down from persistence.

use std::cell::RefCell;
use std::rc::Rc;

use numeric::NumericEnvironment;
use parser::{CellAddress, CellRangeValue, FatalException, Value};

use crate::frame::StackFrame;
use crate::logger::{Logger, NullLogger};
use crate::scope::Scope;

/// Hook a host spreadsheet implements so `EvalCell`/`ExpandRange` can
/// reach into live cell state without this crate depending on `engine`.
pub trait CellAccess {
    fn eval_cell(&self, address: &CellAddress) -> Result<Value, FatalException>;
    fn expand_range(&self, range: &CellRangeValue) -> Result<Vec<Value>, FatalException>;
}

pub struct CallingContext {
    pub numeric_env: RefCell<NumericEnvironment>,
    pub logger: Rc<dyn Logger>,
    pub cells: Option<Rc<dyn CellAccess>>,
    pub globals: Rc<Scope>,
    pub call_stack: RefCell<Vec<Rc<StackFrame>>>,
}

impl CallingContext {
    pub fn new(logger: Rc<dyn Logger>) -> Self {
        Self {
            numeric_env: RefCell::new(NumericEnvironment::default()),
            logger,
            cells: None,
            globals: Scope::root(),
            call_stack: RefCell::new(Vec::new()),
        }
    }

    pub fn with_cell_access(logger: Rc<dyn Logger>, cells: Rc<dyn CellAccess>) -> Self {
        Self {
            cells: Some(cells),
            ..Self::new(logger)
        }
    }

    pub fn for_tests() -> Self {
        Self::new(Rc::new(NullLogger))
    }

    /// Outermost call first, matching the original debugger's backtrace
    /// ordering; frame numbers count up from the outermost call (#1).
    pub fn backtrace(&self) -> String {
        let stack = self.call_stack.borrow();
        stack
            .iter()
            .enumerate()
            .map(|(i, frame)| frame.backtrace_line(i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
