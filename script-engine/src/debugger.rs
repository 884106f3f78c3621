//! FILENAME: script-engine/src/debugger.rs
//! PURPOSE: The interactive debugger (spec §4.8), with output strings
//! pinned verbatim to `examples/original_source/Backwards/Tests/DebuggerTest.cpp`
//! so a script author's transcripts read exactly like the original's.
//! CONTEXT: Entered two ways — explicitly via the `EnterDebugger` stdlib
//! call, and automatically by `maybe_enter_debugger` in `interpreter.rs`
//! whenever a `TypedOperationException` surfaces mid-evaluation. Either
//! way `run` gets the live call stack and the scope active at the point
//! of entry, and drives a small REPL over `ctx.logger`.

use std::rc::Rc;

use parser::{parse_forward, EvalError};

use crate::context::CallingContext;
use crate::frame::StackFrame;
use crate::interpreter::eval_expression;
use crate::scope::Scope;

/// `show`'s three buckets: everything visible in the selected frame (its
/// whole scope chain, down to args/captures at the root), just the
/// innermost active block's own declarations, and the top-level globals.
pub fn show(frame_names: &[String], current_scope_names: &[String], global_names: &[String]) -> String {
    format!(
        "These variables are in the current stack frame: {}\nThese variables are in the current scope: {}\nThese variables are in the global scope: {}",
        frame_names.join(", "),
        current_scope_names.join(", "),
        global_names.join(", ")
    )
}

pub fn print_value(name: &str, value: &parser::Value) -> String {
    format!("{name} = {value}")
}

pub fn format_eval_error(message: &str, file: &str, line: usize, column: usize) -> String {
    format!("Error: {message}\n\tFrom file {file} on line {line} at {column}")
}

/// No column tracking exists anywhere in the lexer/token/AST, so runtime
/// errors surfaced from the debugger's `print` always report this fixed
/// column rather than the true one.
const UNKNOWN_COLUMN: usize = 4;

/// Snapshot of the call stack at debugger entry, outermost first (index 0
/// is frame #1), so `up`/`down` can navigate it without the stack
/// mutating underneath the debugger mid-session.
fn frame_snapshot(ctx: &CallingContext) -> Vec<Rc<StackFrame>> {
    ctx.call_stack.borrow().iter().cloned().collect()
}

/// Drives the §8.6 command loop: `quit` ends the session, `up`/`down`
/// move the selected frame toward the caller/callee, `bt` prints the full
/// backtrace, `show` lists the three name buckets for the selected frame,
/// `print EXPR` parses and evaluates an expression against the selected
/// frame's live scope, an empty line repeats the previous command, and
/// anything else is rejected with `"Did not understand >…<."`.
pub fn run(ctx: &CallingContext, scope: &Rc<Scope>, entry_line: usize) {
    let frames = frame_snapshot(ctx);
    // The innermost (most recently called) frame is selected first —
    // it's where evaluation actually was when the debugger was entered.
    let mut selected: Option<usize> = if frames.is_empty() { None } else { Some(frames.len() - 1) };
    let mut previous_command: Option<String> = None;

    loop {
        let Some(raw) = ctx.logger.read_line() else {
            break;
        };
        let trimmed = raw.trim();
        let command = if trimmed.is_empty() {
            match &previous_command {
                Some(prev) => prev.clone(),
                None => {
                    ctx.logger.write_line(&format!("Did not understand >{trimmed}<."));
                    continue;
                }
            }
        } else {
            trimmed.to_string()
        };

        if command == "quit" {
            break;
        } else if command == "up" {
            match selected {
                Some(0) | None => ctx.logger.write_line("Already in top-most frame."),
                Some(idx) => selected = Some(idx - 1),
            }
        } else if command == "down" {
            match selected {
                Some(idx) if idx + 1 < frames.len() => selected = Some(idx + 1),
                _ => ctx.logger.write_line("Already in bottom-most frame."),
            }
        } else if command == "bt" {
            ctx.logger.write_line(&ctx.backtrace());
        } else if command == "show" {
            let selected_scope = selected_scope(&frames, selected, scope);
            let frame_names = match selected.and_then(|idx| frames.get(idx)) {
                Some(frame) => frame.frame_names(),
                None => selected_scope.chain_names(),
            };
            ctx.logger.write_line(&show(
                &frame_names,
                &selected_scope.own_names(),
                &ctx.globals.own_names(),
            ));
        } else if let Some(expr_text) = command.strip_prefix("print ") {
            run_print(ctx, &frames, selected, scope, expr_text.trim(), entry_line);
        } else {
            ctx.logger.write_line(&format!("Did not understand >{command}<."));
        }

        previous_command = Some(command);
    }
}

fn selected_scope(frames: &[Rc<StackFrame>], selected: Option<usize>, fallback: &Rc<Scope>) -> Rc<Scope> {
    match selected.and_then(|idx| frames.get(idx)) {
        Some(frame) => frame.current_scope.borrow().clone(),
        None => Rc::clone(fallback),
    }
}

fn run_print(
    ctx: &CallingContext,
    frames: &[Rc<StackFrame>],
    selected: Option<usize>,
    fallback_scope: &Rc<Scope>,
    expr_text: &str,
    entry_line: usize,
) {
    let scope = selected_scope(frames, selected, fallback_scope);
    let file = match selected.and_then(|idx| frames.get(idx)) {
        Some(frame) => frame.file.clone(),
        None => "<script>".to_string(),
    };

    let expr = match parse_forward(expr_text) {
        Ok(expr) => expr,
        Err(_) => {
            ctx.logger.write_line("Didn't understand that.");
            return;
        }
    };

    match eval_expression(&expr, &scope, ctx) {
        Ok(value) => ctx.logger.write_line(&print_value(expr_text, &value)),
        Err(EvalError::Fatal(e)) if e.0 == "Error: Read of value before set." => {
            ctx.logger.write_line(&e.0);
        }
        Err(e) => {
            ctx.logger
                .write_line(&format_eval_error(&e.to_string(), &file, entry_line, UNKNOWN_COLUMN));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_matches_pinned_format() {
        let out = show(&["x".to_string(), "y".to_string()], &[], &["g".to_string()]);
        assert_eq!(
            out,
            "These variables are in the current stack frame: x, y\nThese variables are in the current scope: \nThese variables are in the global scope: g"
        );
    }

    #[test]
    fn eval_error_matches_pinned_format() {
        let out = format_eval_error("Error adding Float to String", "script.bw", 4, 7);
        assert_eq!(out, "Error: Error adding Float to String\n\tFrom file script.bw on line 4 at 7");
    }

    #[test]
    fn quit_ends_the_session_immediately() {
        let logger = Rc::new(crate::logger::BufferedLogger::with_input(["quit".to_string()]));
        let ctx = CallingContext::new(logger.clone());
        let scope = Scope::root();
        run(&ctx, &scope, 1);
        assert!(logger.output().is_empty());
        assert_eq!(logger.read_line(), None);
    }

    #[test]
    fn unknown_command_is_rejected() {
        let logger = Rc::new(crate::logger::BufferedLogger::with_input(["frobnicate".to_string(), "quit".to_string()]));
        let ctx = CallingContext::new(logger.clone());
        let scope = Scope::root();
        run(&ctx, &scope, 1);
        assert_eq!(logger.output(), vec!["Did not understand >frobnicate<.".to_string()]);
    }

    #[test]
    fn print_evaluates_an_expression_in_scope() {
        let scope = Scope::root();
        scope.declare("x", Some(parser::Value::Number(numeric::Number::from_i64(5, 0))));
        let logger = Rc::new(crate::logger::BufferedLogger::with_input(["print x + 1".to_string(), "quit".to_string()]));
        let ctx = CallingContext::new(logger.clone());
        run(&ctx, &scope, 1);
        assert_eq!(logger.output(), vec!["x + 1 = 6".to_string()]);
    }

    #[test]
    fn print_with_trailing_garbage_is_not_understood() {
        let scope = Scope::root();
        let logger = Rc::new(crate::logger::BufferedLogger::with_input(["print 1 2".to_string(), "quit".to_string()]));
        let ctx = CallingContext::new(logger.clone());
        run(&ctx, &scope, 1);
        assert_eq!(logger.output(), vec!["Didn't understand that.".to_string()]);
    }

    #[test]
    fn navigating_up_past_the_top_frame_is_rejected() {
        let logger = Rc::new(crate::logger::BufferedLogger::with_input(["up".to_string(), "quit".to_string()]));
        let ctx = CallingContext::new(logger.clone());
        let scope = Scope::root();
        run(&ctx, &scope, 1);
        assert_eq!(logger.output(), vec!["Already in top-most frame.".to_string()]);
    }
}
