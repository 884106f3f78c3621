//! FILENAME: script-engine/src/frame.rs
//! PURPOSE: Stack frame bookkeeping for calls, backtraces, and the
//! debugger (spec §4.7, §4.8). Grounded on
//! `examples/original_source/Backwards/Tests/DebuggerTest.cpp`'s
//! `FunctionContext`/`StackFrame` pair — a function's static shape
//! (name, declared arg/local/capture names) versus one call's live values.

use std::cell::RefCell;
use std::rc::Rc;

use parser::Value;

use crate::scope::Scope;

/// One active call. `scope` is this call's root lexical scope (args plus
/// any top-level `var` declarations); `current_scope` is the innermost
/// block scope live right now within this call — the interpreter swaps it
/// in and out as nested `if`/`while`/`for` blocks are entered and exited,
/// so the debugger can report "the current scope" for whichever frame is
/// selected.
pub struct StackFrame {
    pub function_name: Option<String>,
    pub args: Vec<(String, Value)>,
    pub captures: Vec<(String, Value)>,
    pub scope: Rc<Scope>,
    pub current_scope: RefCell<Rc<Scope>>,
    /// The line, in the caller, where this call was made.
    pub call_site_line: usize,
    pub file: String,
}

impl StackFrame {
    pub fn header(&self, frame_number: usize) -> String {
        format!(
            "In function #{}: >{}< from line {} in {}",
            frame_number,
            self.function_name.as_deref().unwrap_or("<anonymous>"),
            self.call_site_line,
            self.file
        )
    }

    pub fn backtrace_line(&self, frame_number: usize) -> String {
        format!(
            "#{}: >{}< from line {} in {}",
            frame_number,
            self.function_name.as_deref().unwrap_or("<anonymous>"),
            self.call_site_line,
            self.file
        )
    }

    /// Every declared name visible on this frame right now: its currently
    /// active block scope plus every ancestor scope up to (and including)
    /// the frame's root — which is where args and captures actually live,
    /// since `call_function` declares both directly into it. This is the
    /// bucket the debugger's `show` labels "the current stack frame".
    pub fn frame_names(&self) -> Vec<String> {
        self.current_scope.borrow().chain_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_matches_pinned_format() {
        let root = Scope::root();
        let frame = StackFrame {
            function_name: Some("DoStuff".to_string()),
            args: Vec::new(),
            captures: Vec::new(),
            scope: Rc::clone(&root),
            current_scope: RefCell::new(root),
            call_site_line: 12,
            file: "script.bw".to_string(),
        };
        assert_eq!(frame.header(1), "In function #1: >DoStuff< from line 12 in script.bw");
        assert_eq!(frame.backtrace_line(1), "#1: >DoStuff< from line 12 in script.bw");
    }
}
