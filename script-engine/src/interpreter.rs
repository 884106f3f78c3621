//! FILENAME: script-engine/src/interpreter.rs
//! PURPOSE: The tree-walker itself (spec §4.4 statement execution, §4.6-4.9).
//! CONTEXT: Evaluates the `Expression`/`Statement` trees `parser` produces
//! against a `CallingContext`, threading a "current scope" (innermost
//! active block) through every call. Function calls push a `StackFrame`
//! whose root scope pre-declares args and captures, so ordinary scope
//! lookup covers all three without a special case at every read.

use std::cmp::Ordering;
use std::rc::Rc;

use parser::ast::{BinaryOperator, CaseGuard, Expression, Statement, UnaryOperator};
use parser::{EvalError, FatalException, FunctionValue, TypedOperationException, Value};

use crate::context::CallingContext;
use crate::control::Flow;
use crate::frame::StackFrame;
use crate::scope::{LookupResult, Scope};
use crate::stdlib;

fn bool_value(b: bool) -> Value {
    Value::Number(numeric::Number::from_i64(if b { 1 } else { 0 }, 0))
}

fn lookup(name: &str, scope: &Rc<Scope>, ctx: &CallingContext) -> Result<Value, EvalError> {
    if let Some(result) = scope.get(name) {
        return match result {
            LookupResult::Value(v) => Ok(v),
            LookupResult::Uninitialized => Err(FatalException::new("Error: Read of value before set.").into()),
        };
    }
    if let Some(result) = ctx.globals.get(name) {
        return match result {
            LookupResult::Value(v) => Ok(v),
            LookupResult::Uninitialized => Err(FatalException::new("Error: Read of value before set.").into()),
        };
    }
    Err(FatalException::new(format!("undefined variable '{name}'")).into())
}

/// Spec §4.8(b): the interpreter's evaluation loop invokes the debugger on
/// any `TypedOperationException` before re-raising it. The placeholder
/// `line` of `0` is used at call sites where the originating expression
/// doesn't carry its own line number (`Expression::Binary`/`Unary` have
/// none) — only relevant if the call stack is empty, an edge case of the
/// synthetic top-level header.
fn maybe_enter_debugger<T>(
    result: Result<T, TypedOperationException>,
    scope: &Rc<Scope>,
    ctx: &CallingContext,
    line: usize,
) -> Result<T, EvalError> {
    match result {
        Ok(v) => Ok(v),
        Err(e) => {
            ctx.logger.write_line(&format!("Entered debugger with message: {e}"));
            crate::debugger::run(ctx, scope, line);
            Err(e.into())
        }
    }
}

pub fn eval_expression(expr: &Expression, scope: &Rc<Scope>, ctx: &CallingContext) -> Result<Value, EvalError> {
    match expr {
        Expression::Literal(v) => Ok(v.clone()),
        Expression::Identifier(name) => lookup(name, scope, ctx),
        Expression::CellRef(addr) => match &ctx.cells {
            Some(cells) => cells.eval_cell(addr).map_err(EvalError::from),
            None => Err(FatalException::new("no cell access configured for this evaluation").into()),
        },
        Expression::CellRange(range) => Ok(Value::CellRange(range.clone())),
        Expression::Binary { op, left, right } => eval_binary(*op, left, right, scope, ctx),
        Expression::Unary { op, operand } => {
            let value = eval_expression(operand, scope, ctx)?;
            match op {
                UnaryOperator::Negate => maybe_enter_debugger(value.neg(), scope, ctx, 0),
                UnaryOperator::Not => Ok(bool_value(!value.is_truthy())),
            }
        }
        Expression::StdlibCall { func, args, line } => {
            let values = args
                .iter()
                .map(|a| eval_expression(a, scope, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            stdlib::call(*func, values, ctx, *line, scope)
        }
        Expression::Call { callee, args, line } => {
            let callee_value = eval_expression(callee, scope, ctx)?;
            let values = args
                .iter()
                .map(|a| eval_expression(a, scope, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            match callee_value {
                Value::Function(func) => call_function(&func, values, ctx, *line),
                other => Err(FatalException::new(format!("{} is not callable", other.type_name())).into()),
            }
        }
        Expression::FunctionLiteral(def) => {
            let captures = def
                .captures
                .iter()
                .map(|(name, expr)| Ok((name.clone(), eval_expression(expr, scope, ctx)?)))
                .collect::<Result<Vec<_>, EvalError>>()?;
            Ok(Value::Function(FunctionValue {
                definition: Rc::clone(def),
                captures: Rc::new(captures),
            }))
        }
        Expression::ArrayLiteral(items) => {
            let values = items
                .iter()
                .map(|i| eval_expression(i, scope, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::array(values))
        }
        Expression::DictionaryLiteral(pairs) => {
            let values = pairs
                .iter()
                .map(|(k, v)| Ok((eval_expression(k, scope, ctx)?, eval_expression(v, scope, ctx)?)))
                .collect::<Result<Vec<_>, EvalError>>()?;
            Ok(Value::dictionary(values))
        }
        Expression::Index { target, index } => {
            let target_value = eval_expression(target, scope, ctx)?;
            let index_value = eval_expression(index, scope, ctx)?;
            stdlib::get_index(&target_value, &index_value)
        }
    }
}

fn eval_binary(
    op: BinaryOperator,
    left: &Expression,
    right: &Expression,
    scope: &Rc<Scope>,
    ctx: &CallingContext,
) -> Result<Value, EvalError> {
    if op == BinaryOperator::And {
        let left_value = eval_expression(left, scope, ctx)?;
        if !left_value.is_truthy() {
            return Ok(left_value);
        }
        return eval_expression(right, scope, ctx);
    }
    if op == BinaryOperator::Or {
        let left_value = eval_expression(left, scope, ctx)?;
        if left_value.is_truthy() {
            return Ok(left_value);
        }
        return eval_expression(right, scope, ctx);
    }

    let left_value = eval_expression(left, scope, ctx)?;
    let right_value = eval_expression(right, scope, ctx)?;
    let env = *ctx.numeric_env.borrow();
    match op {
        BinaryOperator::Add => maybe_enter_debugger(left_value.add(&right_value, &env), scope, ctx, 0),
        BinaryOperator::Subtract => maybe_enter_debugger(left_value.sub(&right_value, &env), scope, ctx, 0),
        BinaryOperator::Multiply => maybe_enter_debugger(left_value.mul(&right_value, &env), scope, ctx, 0),
        BinaryOperator::Divide => maybe_enter_debugger(left_value.div(&right_value, &env), scope, ctx, 0),
        BinaryOperator::Concat => Ok(Value::string(format!("{left_value}{right_value}"))),
        // Cross-type comparisons raise TypedOperationException (spec §4.2,
        // §7) instead of silently falling back to the internal sort order
        // that `Ord`/`PartialEq` use for dictionary keys and `Sort`.
        BinaryOperator::Equal => {
            maybe_enter_debugger(left_value.values_equal(&right_value).map(bool_value), scope, ctx, 0)
        }
        BinaryOperator::NotEqual => maybe_enter_debugger(
            left_value.values_equal(&right_value).map(|b| bool_value(!b)),
            scope,
            ctx,
            0,
        ),
        BinaryOperator::LessThan => maybe_enter_debugger(
            left_value.compare(&right_value).map(|o| bool_value(o == Ordering::Less)),
            scope,
            ctx,
            0,
        ),
        BinaryOperator::GreaterThan => maybe_enter_debugger(
            left_value.compare(&right_value).map(|o| bool_value(o == Ordering::Greater)),
            scope,
            ctx,
            0,
        ),
        BinaryOperator::LessEqual => maybe_enter_debugger(
            left_value.compare(&right_value).map(|o| bool_value(o != Ordering::Greater)),
            scope,
            ctx,
            0,
        ),
        BinaryOperator::GreaterEqual => maybe_enter_debugger(
            left_value.compare(&right_value).map(|o| bool_value(o != Ordering::Less)),
            scope,
            ctx,
            0,
        ),
        BinaryOperator::And | BinaryOperator::Or => unreachable!("handled above"),
    }
}

/// Runs `stmts` in a fresh child scope, tracking that scope as the
/// innermost call frame's "current scope" for the duration (restored on
/// every exit path — normal completion, an early flow signal, or an
/// error) so the debugger's `show` command reports live block locals
/// rather than only the frame's root-level args/captures.
pub fn exec_block(stmts: &[Statement], parent_scope: &Rc<Scope>, ctx: &CallingContext) -> Result<Flow, EvalError> {
    let scope = Scope::child(parent_scope);
    let previous = ctx.call_stack.borrow().last().map(|frame| {
        let previous = frame.current_scope.borrow().clone();
        *frame.current_scope.borrow_mut() = Rc::clone(&scope);
        previous
    });

    let result = (|| {
        for stmt in stmts {
            match exec_statement(stmt, &scope, ctx)? {
                Flow::Normal => continue,
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    })();

    if let Some(previous) = previous {
        if let Some(frame) = ctx.call_stack.borrow().last() {
            *frame.current_scope.borrow_mut() = previous;
        }
    }
    result
}

/// What a loop does with the `Flow` its body produced (spec §4.9): consume
/// a `break`/`continue` whose depth has reached 1, or decrement and keep
/// propagating outward otherwise. `return` always propagates untouched.
enum LoopAction {
    KeepGoing,
    StopLoop,
    Propagate(Flow),
}

fn consume_loop_flow(flow: Flow) -> LoopAction {
    match flow {
        Flow::Normal => LoopAction::KeepGoing,
        Flow::Continue(n) if n <= 1 => LoopAction::KeepGoing,
        Flow::Continue(n) => LoopAction::Propagate(Flow::Continue(n - 1)),
        Flow::Break(n) if n <= 1 => LoopAction::StopLoop,
        Flow::Break(n) => LoopAction::Propagate(Flow::Break(n - 1)),
        Flow::Return(v) => LoopAction::Propagate(Flow::Return(v)),
    }
}

pub fn exec_statement(stmt: &Statement, scope: &Rc<Scope>, ctx: &CallingContext) -> Result<Flow, EvalError> {
    match stmt {
        Statement::Expr(expr) => {
            eval_expression(expr, scope, ctx)?;
            Ok(Flow::Normal)
        }
        Statement::VarDecl { name, value } => {
            let v = match value {
                Some(expr) => Some(eval_expression(expr, scope, ctx)?),
                None => None,
            };
            scope.declare(name.clone(), v);
            Ok(Flow::Normal)
        }
        Statement::Assign { target, value } => {
            let v = eval_expression(value, scope, ctx)?;
            assign(target, v, scope, ctx)?;
            Ok(Flow::Normal)
        }
        Statement::If {
            condition,
            then_branch,
            else_branch,
        } => {
            if eval_expression(condition, scope, ctx)?.is_truthy() {
                exec_block(then_branch, scope, ctx)
            } else if let Some(else_branch) = else_branch {
                exec_block(else_branch, scope, ctx)
            } else {
                Ok(Flow::Normal)
            }
        }
        Statement::While { condition, body } => {
            while eval_expression(condition, scope, ctx)?.is_truthy() {
                match consume_loop_flow(exec_block(body, scope, ctx)?) {
                    LoopAction::KeepGoing => continue,
                    LoopAction::StopLoop => break,
                    LoopAction::Propagate(flow) => return Ok(flow),
                }
            }
            Ok(Flow::Normal)
        }
        Statement::ForEach { var, iterable, body } => {
            let items = match eval_expression(iterable, scope, ctx)? {
                Value::Array(items) => items.as_ref().clone(),
                Value::Dictionary(pairs) => pairs.iter().map(|(k, _)| k.clone()).collect(),
                other => return Err(FatalException::new(format!("cannot iterate over {}", other.type_name())).into()),
            };
            for item in items {
                let iter_scope = Scope::child(scope);
                iter_scope.declare(var.clone(), Some(item));
                match consume_loop_flow(exec_block(body, &iter_scope, ctx)?) {
                    LoopAction::KeepGoing => continue,
                    LoopAction::StopLoop => break,
                    LoopAction::Propagate(flow) => return Ok(flow),
                }
            }
            Ok(Flow::Normal)
        }
        Statement::ForRange {
            var,
            from,
            to,
            step,
            downto,
            body,
        } => {
            let to_value = eval_expression(to, scope, ctx)?;
            let step_value = match step {
                Some(expr) => eval_expression(expr, scope, ctx)?,
                None => Value::Number(numeric::Number::from_i64(1, 0)),
            };
            let env = *ctx.numeric_env.borrow();
            let mut current = eval_expression(from, scope, ctx)?;
            loop {
                let within_bounds = if *downto {
                    current.compare(&to_value)? != Ordering::Less
                } else {
                    current.compare(&to_value)? != Ordering::Greater
                };
                if !within_bounds {
                    break;
                }
                let iter_scope = Scope::child(scope);
                iter_scope.declare(var.clone(), Some(current.clone()));
                match consume_loop_flow(exec_block(body, &iter_scope, ctx)?) {
                    LoopAction::KeepGoing => {}
                    LoopAction::StopLoop => break,
                    LoopAction::Propagate(flow) => return Ok(flow),
                }
                current = if *downto {
                    current.sub(&step_value, &env)?
                } else {
                    current.add(&step_value, &env)?
                };
            }
            Ok(Flow::Normal)
        }
        Statement::SelectBlock { selector, arms } => {
            let selector_value = eval_expression(selector, scope, ctx)?;
            for arm in arms {
                let mut matched = false;
                for guard in &arm.guards {
                    matched = match guard {
                        CaseGuard::Is(expr) => {
                            let v = eval_expression(expr, scope, ctx)?;
                            selector_value.values_equal(&v)?
                        }
                        CaseGuard::Above(expr) => {
                            let v = eval_expression(expr, scope, ctx)?;
                            selector_value.compare(&v)? == Ordering::Greater
                        }
                        CaseGuard::Below(expr) => {
                            let v = eval_expression(expr, scope, ctx)?;
                            selector_value.compare(&v)? == Ordering::Less
                        }
                    };
                    if matched {
                        break;
                    }
                }
                if matched {
                    // SELECT is transparent to break/continue/return (spec
                    // §4.9) — whatever the matching arm's body produces
                    // passes straight through to our own caller.
                    return exec_block(&arm.body, scope, ctx);
                }
            }
            Ok(Flow::Normal)
        }
        Statement::Return(expr) => {
            let value = match expr {
                Some(expr) => eval_expression(expr, scope, ctx)?,
                None => Value::Nil,
            };
            Ok(Flow::Return(value))
        }
        Statement::Break(depth) => Ok(Flow::Break(*depth)),
        Statement::Continue(depth) => Ok(Flow::Continue(*depth)),
    }
}

fn assign(target: &Expression, value: Value, scope: &Rc<Scope>, ctx: &CallingContext) -> Result<(), EvalError> {
    match target {
        // Spec §4.5 point 4: writing a name that resolves nowhere
        // allocates a new slot rather than erroring — only *reads* of an
        // unresolved name are fatal. `set NAME to EXPR` relies on this to
        // both declare first-use globals and update already-declared
        // locals through the same statement form.
        Expression::Identifier(name) => {
            if scope.assign(name, value.clone()) || ctx.globals.assign(name, value.clone()) {
                Ok(())
            } else {
                scope.declare(name.clone(), Some(value));
                Ok(())
            }
        }
        Expression::Index { target, index } => {
            let name = match target.as_ref() {
                Expression::Identifier(name) => name,
                _ => {
                    return Err(
                        parser::ProgrammingException::new("assignment target must be a name or indexed name").into(),
                    )
                }
            };
            let current = lookup(name, scope, ctx)?;
            let index_value = eval_expression(index, scope, ctx)?;
            let updated = stdlib::set_index(&current, &index_value, value)?;
            if scope.assign(name, updated.clone()) || ctx.globals.assign(name, updated.clone()) {
                Ok(())
            } else {
                scope.declare(name.clone(), Some(updated));
                Ok(())
            }
        }
        _ => Err(parser::ProgrammingException::new("invalid assignment target").into()),
    }
}

/// Calls a script-defined function, pushing a stack frame (for backtraces
/// and the debugger) whose root scope pre-declares both the call's
/// arguments and the function value's captures — so ordinary lexical
/// lookup resolves all three uniformly.
pub fn call_function(
    func: &FunctionValue,
    args: Vec<Value>,
    ctx: &CallingContext,
    call_site_line: usize,
) -> Result<Value, EvalError> {
    let def = &func.definition;
    if args.len() != def.params.len() {
        return Err(FatalException::new(format!(
            "{} expects {} argument(s), got {}",
            def.name.as_deref().unwrap_or("<anonymous>"),
            def.params.len(),
            args.len()
        ))
        .into());
    }

    let frame_scope = Scope::root();
    let named_args: Vec<(String, Value)> = def.params.iter().cloned().zip(args).collect();
    for (name, value) in &named_args {
        frame_scope.declare(name.clone(), Some(value.clone()));
    }
    for (name, value) in func.captures.iter() {
        frame_scope.declare(name.clone(), Some(value.clone()));
    }

    let frame = Rc::new(StackFrame {
        function_name: def.name.clone(),
        args: named_args,
        captures: func.captures.as_ref().clone(),
        scope: Rc::clone(&frame_scope),
        current_scope: std::cell::RefCell::new(Rc::clone(&frame_scope)),
        call_site_line,
        file: "<script>".to_string(),
    });

    ctx.call_stack.borrow_mut().push(frame);
    let result = run_function_body(&def.body, &frame_scope, ctx);
    ctx.call_stack.borrow_mut().pop();

    match result? {
        Flow::Return(v) => Ok(v),
        // Spec §4.4 Return contract: falling off the end without a RETURN
        // is fatal, not an implicit Nil.
        Flow::Normal => Err(FatalException::new("Function failed to return a value").into()),
        // Spec §4.4/§4.9: break/continue that escapes every enclosing loop
        // and reaches the function boundary is also fatal.
        Flow::Break(_) | Flow::Continue(_) => {
            Err(FatalException::new("break/continue escaped the enclosing function").into())
        }
    }
}

fn run_function_body(body: &[Statement], frame_scope: &Rc<Scope>, ctx: &CallingContext) -> Result<Flow, EvalError> {
    for stmt in body {
        match exec_statement(stmt, frame_scope, ctx)? {
            Flow::Normal => continue,
            other => return Ok(other),
        }
    }
    Ok(Flow::Normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::parse_backward;

    fn run(source: &str) -> Value {
        let program = parse_backward(source).unwrap();
        let ctx = CallingContext::for_tests();
        let scope = Scope::root();
        let mut result = Value::Nil;
        for stmt in &program {
            if let Flow::Return(v) = exec_statement(stmt, &scope, &ctx).unwrap() {
                result = v;
            }
        }
        result
    }

    #[test]
    fn evaluates_arithmetic() {
        let program = parse_backward("return 1 + 2 * 3").unwrap();
        let ctx = CallingContext::for_tests();
        let scope = Scope::root();
        let flow = exec_statement(&program[0], &scope, &ctx).unwrap();
        match flow {
            Flow::Return(Value::Number(n)) => assert_eq!(n.to_string(), "7"),
            other => panic!("unexpected flow: {other:?}"),
        }
    }

    #[test]
    fn while_loop_accumulates() {
        let source = "set i to 0 set total to 0 while i < 5 do set total to total + i set i to i + 1 end return total";
        match run(source) {
            Value::Number(n) => assert_eq!(n.to_string(), "10"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn closures_capture_by_value_at_definition() {
        let source = "set x to 10 set f to function(y)[x] is return x + y end set x to 999 return f(5)";
        match run(source) {
            Value::Number(n) => assert_eq!(n.to_string(), "15"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn reading_an_unset_local_is_a_fatal_error() {
        let program = parse_backward("return y").unwrap();
        let ctx = CallingContext::for_tests();
        let scope = Scope::root();
        scope.declare("y", None);
        let err = exec_statement(&program[0], &scope, &ctx);
        assert!(matches!(err, Err(EvalError::Fatal(_))));
    }

    #[test]
    fn function_falling_off_the_end_is_fatal() {
        let program = parse_backward("function f() is set x to 1 end").unwrap();
        let ctx = CallingContext::for_tests();
        let scope = Scope::root();
        exec_statement(&program[0], &scope, &ctx).unwrap();
        let func = match scope.get("f") {
            Some(LookupResult::Value(Value::Function(f))) => f,
            _ => panic!("expected f to be declared"),
        };
        let err = call_function(&func, vec![], &ctx, 1);
        assert!(matches!(err, Err(EvalError::Fatal(_))));
    }

    #[test]
    fn break_with_depth_exits_both_nested_loops() {
        // `break 2` from inside the inner loop unwinds past the outer loop
        // too, so the outer loop never reaches its second iteration.
        let source = "set i to 0 set hits to 0 while i < 3 do set i to i + 1 while 1 do set hits to hits + 1 break 2 end end return hits";
        match run(source) {
            Value::Number(n) => assert_eq!(n.to_string(), "1"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn select_block_runs_the_matching_arm() {
        let source = "select 5 from case above 10 is return 1 case above 0 is return 2 case is 5 is return 3 end";
        match run(source) {
            Value::Number(n) => assert_eq!(n.to_string(), "2"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
