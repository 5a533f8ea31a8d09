//! The built-in procedures. Each one receives the interpreter instance
//! and its already-evaluated argument list; arity has been checked by
//! the caller for every non-variadic primitive.

use std::io::Write;

use crate::arith;
use crate::error::{SchemeError, SchemeResult};
use crate::eval::Interp;
use crate::value::{self, Value};

/// (car pair)
pub fn prim_car(interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    match value::car(args)? {
        Value::Cell(cell) => Ok(cell.car.clone()),
        other => Err(SchemeError::TypeMismatch(format!(
            "car: not a pair: {}",
            interp.stringify(&other, true)
        ))),
    }
}

/// (cdr pair)
pub fn prim_cdr(interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    match value::car(args)? {
        Value::Cell(cell) => Ok(cell.cdr.clone()),
        other => Err(SchemeError::TypeMismatch(format!(
            "cdr: not a pair: {}",
            interp.stringify(&other, true)
        ))),
    }
}

/// (cons a d)
pub fn prim_cons(_interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    let a = value::car(args)?;
    let d = value::car(&value::cdr(args)?)?;
    Ok(value::cons(a, d))
}

/// (eq? a b) — identity comparison.
pub fn prim_eq(_interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    let a = value::car(args)?;
    let b = value::car(&value::cdr(args)?)?;
    Ok(Value::Bool(value::identical(&a, &b)))
}

/// (pair? x)
pub fn prim_pair_p(_interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    Ok(Value::Bool(value::car(args)?.is_pair()))
}

/// (null? x)
pub fn prim_null_p(_interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    Ok(Value::Bool(value::car(args)?.is_null()))
}

/// (not x) — true only for #f.
pub fn prim_not(_interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    Ok(Value::Bool(value::car(args)?.is_false()))
}

/// (list x ...) — the evaluated argument list is already the answer.
pub fn prim_list(_interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    Ok(args.clone())
}

/// (display x) — print without string quotes; yields no value.
pub fn prim_display(interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    let v = value::car(args)?;
    let text = interp.stringify(&v, false);
    write!(interp.out, "{}", text).map_err(|e| SchemeError::Io(e.to_string()))?;
    Ok(Value::None)
}

/// (newline)
pub fn prim_newline(interp: &mut Interp, _args: &Value) -> SchemeResult<Value> {
    writeln!(interp.out).map_err(|e| SchemeError::Io(e.to_string()))?;
    Ok(Value::None)
}

/// (read) — one expression from the host, or the eof object.
pub fn prim_read(interp: &mut Interp, _args: &Value) -> SchemeResult<Value> {
    interp.read_expression("", "")
}

/// (eof-object? x)
pub fn prim_eof_p(_interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    Ok(Value::Bool(matches!(value::car(args)?, Value::Eof)))
}

/// (symbol? x)
pub fn prim_symbol_p(_interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    Ok(Value::Bool(matches!(value::car(args)?, Value::Sym(_))))
}

pub fn prim_add(_interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    let (a, b) = two_args(args)?;
    arith::add(&a, &b)
}

pub fn prim_subtract(_interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    let (a, b) = two_args(args)?;
    arith::subtract(&a, &b)
}

pub fn prim_multiply(_interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    let (a, b) = two_args(args)?;
    arith::multiply(&a, &b)
}

pub fn prim_less(_interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    let (a, b) = two_args(args)?;
    Ok(Value::Bool(
        arith::compare(&a, &b)? == std::cmp::Ordering::Less,
    ))
}

pub fn prim_num_eq(_interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    let (a, b) = two_args(args)?;
    Ok(Value::Bool(
        arith::compare(&a, &b)? == std::cmp::Ordering::Equal,
    ))
}

/// (number? x)
pub fn prim_number_p(_interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    Ok(Value::Bool(value::car(args)?.is_number()))
}

/// (error reason arg) — raise with the reason in display form and the
/// argument in quoted form; the message propagates verbatim.
pub fn prim_error(interp: &mut Interp, args: &Value) -> SchemeResult<Value> {
    let reason = value::car(args)?;
    let arg = value::car(&value::cdr(args)?)?;
    Err(SchemeError::User(format!(
        "Error: {}: {}",
        interp.stringify(&reason, false),
        interp.stringify(&arg, true)
    )))
}

/// (globals) — the symbols bound in the global environment, leading
/// frame marker excluded, newest first.
pub fn prim_globals(interp: &mut Interp, _args: &Value) -> SchemeResult<Value> {
    let mut names: Vec<Value> = Vec::new();
    let mut current = interp.global_env().next();
    while let Some(binding) = current {
        if let Some(id) = binding.symbol() {
            names.push(Value::Sym(id));
        }
        current = binding.next();
    }
    Ok(value::list(&names))
}

fn two_args(args: &Value) -> SchemeResult<(Value, Value)> {
    let a = value::car(args)?;
    let b = value::car(&value::cdr(args)?)?;
    Ok((a, b))
}
