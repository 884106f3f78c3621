//! FILENAME: script-engine/src/stdlib.rs
//! PURPOSE: The standard library surface both dialects share (spec §2,
//! supplemented from `examples/original_source/Backwards/Tests/StdLibTest.cpp`).
//! CONTEXT: Builtins are resolved to `StdlibFn` at parse time (see
//! `parser::ast::StdlibFn::from_name`); this module is the single place
//! that executes them against live `Value`s.

use std::rc::Rc;

use numeric::{Number, RoundingMode};
use parser::ast::StdlibFn;
use parser::{CellRangeValue, EvalError, FatalException, Value};

use crate::context::CallingContext;
use crate::scope::Scope;

pub fn call(
    func: StdlibFn,
    args: Vec<Value>,
    ctx: &CallingContext,
    line: usize,
    scope: &Rc<Scope>,
) -> Result<Value, EvalError> {
    use StdlibFn::*;
    match func {
        NewArray => Ok(Value::array(args)),
        NewDictionary => {
            let pairs = args
                .chunks(2)
                .map(|pair| (pair[0].clone(), pair.get(1).cloned().unwrap_or(Value::Nil)))
                .collect();
            Ok(Value::dictionary(pairs))
        }
        NewArrayDefault => {
            let count = expect_usize(&args, 0, "NewArrayDefault")?;
            let fill = args.get(1).cloned().unwrap_or(Value::Nil);
            Ok(Value::array(vec![fill; count]))
        }
        PushBack => {
            let mut items = expect_array(&args, 0, "PushBack")?;
            items.push(args.get(1).cloned().unwrap_or(Value::Nil));
            Ok(Value::array(items))
        }
        PushFront => {
            let mut items = expect_array(&args, 0, "PushFront")?;
            items.insert(0, args.get(1).cloned().unwrap_or(Value::Nil));
            Ok(Value::array(items))
        }
        PopBack => {
            let mut items = expect_array(&args, 0, "PopBack")?;
            items.pop();
            Ok(Value::array(items))
        }
        PopFront => {
            let mut items = expect_array(&args, 0, "PopFront")?;
            if !items.is_empty() {
                items.remove(0);
            }
            Ok(Value::array(items))
        }
        GetIndex => get_index(
            args.first().ok_or_else(|| fatal("GetIndex requires a target"))?,
            args.get(1).ok_or_else(|| fatal("GetIndex requires an index"))?,
        ),
        SetIndex => {
            let target = args.first().ok_or_else(|| fatal("SetIndex requires a target"))?;
            let index = args.get(1).ok_or_else(|| fatal("SetIndex requires an index"))?;
            let value = args.get(2).cloned().unwrap_or(Value::Nil);
            set_index(target, index, value)
        }
        Insert => {
            let mut pairs = expect_dictionary(&args, 0, "Insert")?;
            let key = args.get(1).cloned().unwrap_or(Value::Nil);
            let value = args.get(2).cloned().unwrap_or(Value::Nil);
            pairs.retain(|(k, _)| k != &key);
            pairs.push((key, value));
            Ok(Value::dictionary(pairs))
        }
        GetValue => {
            let pairs = expect_dictionary(&args, 0, "GetValue")?;
            let key = args.get(1).cloned().unwrap_or(Value::Nil);
            pairs
                .into_iter()
                .find(|(k, _)| k == &key)
                .map(|(_, v)| v)
                .ok_or_else(|| fatal("key not found"))
        }
        ContainsKey => {
            let pairs = expect_dictionary(&args, 0, "ContainsKey")?;
            let key = args.get(1).cloned().unwrap_or(Value::Nil);
            Ok(bool_value(pairs.iter().any(|(k, _)| k == &key)))
        }
        RemoveKey => {
            let mut pairs = expect_dictionary(&args, 0, "RemoveKey")?;
            let key = args.get(1).cloned().unwrap_or(Value::Nil);
            pairs.retain(|(k, _)| k != &key);
            Ok(Value::dictionary(pairs))
        }
        GetKeys => {
            let pairs = expect_dictionary(&args, 0, "GetKeys")?;
            Ok(Value::array(pairs.into_iter().map(|(k, _)| k).collect()))
        }
        Size | Length => match args.first() {
            Some(Value::Array(a)) => Ok(number(a.len() as i64)),
            Some(Value::Dictionary(d)) => Ok(number(d.len() as i64)),
            Some(Value::String(s)) => Ok(number(s.chars().count() as i64)),
            _ => Err(fatal("Size/Length expects an Array, Dictionary, or String")),
        },
        SubString => {
            let s = expect_string(&args, 0, "SubString")?;
            let start = expect_usize(&args, 1, "SubString")?;
            let len = expect_usize(&args, 2, "SubString")?;
            let chars: Vec<char> = s.chars().collect();
            if start > chars.len() || start + len > chars.len() {
                return Err(fatal("SubString bounds out of range"));
            }
            Ok(Value::string(chars[start..start + len].iter().collect::<String>()))
        }
        ToString => Ok(Value::string(
            args.first().map(|v| v.to_string()).unwrap_or_default(),
        )),
        ValueOf => {
            let s = expect_string(&args, 0, "ValueOf")?;
            let n = Number::from_string(&s, 0).map_err(|e| fatal(e.to_string()))?;
            Ok(Value::Number(n))
        }
        FromCharacter => {
            let n = expect_number(&args, 0, "FromCharacter")?;
            let code = n.as_f64() as u32;
            let c = char::from_u32(code).ok_or_else(|| fatal("invalid character code"))?;
            Ok(Value::string(c.to_string()))
        }
        ToCharacter => {
            let s = expect_string(&args, 0, "ToCharacter")?;
            let c = s.chars().next().ok_or_else(|| fatal("ToCharacter requires a non-empty string"))?;
            Ok(number(c as i64))
        }
        Min => reduce_numbers(&args, |a, b| if a <= b { *a } else { *b }),
        Max => reduce_numbers(&args, |a, b| if a >= b { *a } else { *b }),
        NaN => Ok(Value::Number(Number::nan(0))),
        Abs => Ok(Value::Number(expect_number(&args, 0, "Abs")?.abs())),
        Round => {
            let env = *ctx.numeric_env.borrow();
            Ok(Value::Number(expect_number(&args, 0, "Round")?.round(&env)))
        }
        Floor => Ok(Value::Number(expect_number(&args, 0, "Floor")?.floor())),
        Ceil => Ok(Value::Number(expect_number(&args, 0, "Ceil")?.ceil())),
        Sqr => {
            let n = expect_number(&args, 0, "Sqr")?;
            let env = *ctx.numeric_env.borrow();
            Ok(Value::Number(n.mul(&n, &env)))
        }
        IsInfinity => Ok(bool_value(expect_number(&args, 0, "IsInfinity")?.is_infinite())),
        IsNaN => Ok(bool_value(expect_number(&args, 0, "IsNaN")?.is_nan())),
        IsFloat => Ok(bool_value(matches!(args.first(), Some(Value::Number(_))))),
        IsString => Ok(bool_value(matches!(args.first(), Some(Value::String(_))))),
        IsArray => Ok(bool_value(matches!(args.first(), Some(Value::Array(_))))),
        IsDictionary => Ok(bool_value(matches!(args.first(), Some(Value::Dictionary(_))))),
        IsFunction => Ok(bool_value(matches!(args.first(), Some(Value::Function(_))))),
        IsNil => Ok(bool_value(matches!(args.first(), Some(Value::Nil) | None))),
        IsCellRef => Ok(bool_value(matches!(args.first(), Some(Value::CellRef(_))))),
        IsCellRange => Ok(bool_value(matches!(args.first(), Some(Value::CellRange(_))))),
        SetRoundMode => {
            let n = expect_number(&args, 0, "SetRoundMode")?;
            let mode = RoundingMode::from_i64(n.as_f64() as i64).ok_or_else(|| fatal("invalid round mode"))?;
            ctx.numeric_env.borrow_mut().set_rounding_mode(mode);
            Ok(Value::Nil)
        }
        GetRoundMode => Ok(number(ctx.numeric_env.borrow().rounding_mode().as_i64())),
        SetDefaultPrecision => {
            let n = expect_number(&args, 0, "SetDefaultPrecision")?;
            ctx.numeric_env.borrow_mut().set_default_precision(n.as_f64() as u32);
            Ok(Value::Nil)
        }
        GetDefaultPrecision => Ok(number(ctx.numeric_env.borrow().default_precision() as i64)),
        GetPrecision => Ok(number(expect_number(&args, 0, "GetPrecision")?.precision() as i64)),
        SetPrecision => {
            let n = expect_number(&args, 0, "SetPrecision")?;
            let precision = expect_number(&args, 1, "SetPrecision")?.as_f64() as u32;
            Ok(Value::Number(n.change_precision(precision)))
        }
        EnterDebugger => {
            crate::debugger::run(ctx, scope, line);
            Ok(Value::Nil)
        }
        EvalCell => {
            let addr = match args.first() {
                Some(Value::CellRef(addr)) => addr.clone(),
                _ => return Err(fatal("EvalCell requires a CellRef")),
            };
            match &ctx.cells {
                Some(cells) => cells.eval_cell(&addr).map_err(EvalError::from),
                None => Err(fatal("no cell access configured for this evaluation")),
            }
        }
        ExpandRange => {
            let range: CellRangeValue = match args.first() {
                Some(Value::CellRange(range)) => range.clone(),
                _ => return Err(fatal("ExpandRange requires a CellRange")),
            };
            match &ctx.cells {
                Some(cells) => cells.expand_range(&range).map(Value::array).map_err(EvalError::from),
                None => Err(fatal("no cell access configured for this evaluation")),
            }
        }
    }
}

pub fn get_index(target: &Value, index: &Value) -> Result<Value, EvalError> {
    match target {
        Value::Array(items) => {
            let i = as_index(index)?;
            items.get(i).cloned().ok_or_else(|| fatal("array index out of range"))
        }
        Value::Dictionary(pairs) => pairs
            .iter()
            .find(|(k, _)| k == index)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| fatal("key not found")),
        other => Err(fatal(format!("cannot index into {}", other.type_name()))),
    }
}

pub fn set_index(target: &Value, index: &Value, value: Value) -> Result<Value, EvalError> {
    match target {
        Value::Array(items) => {
            let i = as_index(index)?;
            if i >= items.len() {
                return Err(fatal("array index out of range"));
            }
            let mut items = items.as_ref().clone();
            items[i] = value;
            Ok(Value::array(items))
        }
        Value::Dictionary(pairs) => {
            let mut pairs = pairs.as_ref().clone();
            if let Some(slot) = pairs.iter_mut().find(|(k, _)| k == index) {
                slot.1 = value;
            } else {
                pairs.push((index.clone(), value));
            }
            Ok(Value::dictionary(pairs))
        }
        other => Err(fatal(format!("cannot index into {}", other.type_name()))),
    }
}

fn as_index(value: &Value) -> Result<usize, EvalError> {
    match value {
        Value::Number(n) => Ok(n.as_f64() as usize),
        other => Err(fatal(format!("expected a numeric index, found {}", other.type_name()))),
    }
}

fn number(n: i64) -> Value {
    Value::Number(Number::from_i64(n, 0))
}

fn bool_value(b: bool) -> Value {
    number(if b { 1 } else { 0 })
}

fn fatal(message: impl Into<String>) -> EvalError {
    FatalException::new(message).into()
}

fn expect_array(args: &[Value], idx: usize, func: &str) -> Result<Vec<Value>, EvalError> {
    match args.get(idx) {
        Some(Value::Array(items)) => Ok(items.as_ref().clone()),
        _ => Err(fatal(format!("{func} expects an Array argument"))),
    }
}

fn expect_dictionary(args: &[Value], idx: usize, func: &str) -> Result<Vec<(Value, Value)>, EvalError> {
    match args.get(idx) {
        Some(Value::Dictionary(pairs)) => Ok(pairs.as_ref().clone()),
        _ => Err(fatal(format!("{func} expects a Dictionary argument"))),
    }
}

fn expect_string(args: &[Value], idx: usize, func: &str) -> Result<Rc<String>, EvalError> {
    match args.get(idx) {
        Some(Value::String(s)) => Ok(Rc::clone(s)),
        _ => Err(fatal(format!("{func} expects a String argument"))),
    }
}

fn expect_number(args: &[Value], idx: usize, func: &str) -> Result<Number, EvalError> {
    match args.get(idx) {
        Some(Value::Number(n)) => Ok(*n),
        _ => Err(fatal(format!("{func} expects a Float argument"))),
    }
}

fn expect_usize(args: &[Value], idx: usize, func: &str) -> Result<usize, EvalError> {
    Ok(expect_number(args, idx, func)?.as_f64() as usize)
}

/// `Min`/`Max` fold left-to-right over every argument, preserving object
/// identity the way the original does (returns one of the input values,
/// not a freshly constructed number).
fn reduce_numbers(args: &[Value], pick: impl Fn(&Number, &Number) -> Number) -> Result<Value, EvalError> {
    let mut numbers = Vec::with_capacity(args.len());
    for i in 0..args.len() {
        numbers.push(expect_number(args, i, "Min/Max")?);
    }
    let first = *numbers
        .first()
        .ok_or_else(|| fatal("Min/Max requires at least one argument"))?;
    let result = numbers.into_iter().skip(1).fold(first, |acc, n| pick(&acc, &n));
    Ok(Value::Number(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CallingContext;

    #[test]
    fn size_of_array() {
        let ctx = CallingContext::for_tests();
        let scope = Scope::root();
        let result = call(
            StdlibFn::Size,
            vec![Value::array(vec![Value::Nil, Value::Nil])],
            &ctx,
            0,
            &scope,
        )
        .unwrap();
        assert_eq!(result, number(2));
    }

    #[test]
    fn get_index_out_of_range_is_fatal() {
        let result = get_index(&Value::array(vec![]), &number(0));
        assert!(result.is_err());
    }

    #[test]
    fn set_index_is_structural_sharing_not_mutation() {
        let original = Value::array(vec![number(1), number(2)]);
        let updated = set_index(&original, &number(0), number(99)).unwrap();
        assert_eq!(original, Value::array(vec![number(1), number(2)]));
        assert_eq!(updated, Value::array(vec![number(99), number(2)]));
    }

    #[test]
    fn round_mode_round_trips() {
        let ctx = CallingContext::for_tests();
        let scope = Scope::root();
        call(StdlibFn::SetRoundMode, vec![number(4)], &ctx, 0, &scope).unwrap();
        let mode = call(StdlibFn::GetRoundMode, vec![], &ctx, 0, &scope).unwrap();
        assert_eq!(mode, number(4));
    }
}
