//! The numeric tower: fixed 32-bit integers, arbitrary-precision
//! integers, and 64-bit floats, with silent narrow-to-wide promotion.

use std::cmp::Ordering;
use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::error::{SchemeError, SchemeResult};
use crate::value::Value;

pub fn add(a: &Value, b: &Value) -> SchemeResult<Value> {
    apply_op(a, b, "+", |x, y| x + y, |x, y| x + y, |x, y| x + y)
}

pub fn subtract(a: &Value, b: &Value) -> SchemeResult<Value> {
    apply_op(a, b, "-", |x, y| x - y, |x, y| x - y, |x, y| x - y)
}

pub fn multiply(a: &Value, b: &Value) -> SchemeResult<Value> {
    apply_op(a, b, "*", |x, y| x * y, |x, y| x * y, |x, y| x * y)
}

/// Three-way numeric comparison under the same promotion rules as the
/// arithmetic operations. NaN ordering is whatever `total_cmp` says.
pub fn compare(a: &Value, b: &Value) -> SchemeResult<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        _ if is_float(a) || is_float(b) => Ok(to_f64(a)?.total_cmp(&to_f64(b)?)),
        _ => Ok(widen(a)?.cmp(&widen(b)?)),
    }
}

/// Parse a token as a number: Int first, then BigInt, then Float.
/// Returns None when the token is not numeric (it is a symbol name).
pub fn parse(token: &str) -> Option<Value> {
    if let Ok(n) = token.parse::<i32>() {
        return Some(Value::Int(n));
    }
    if let Ok(n) = token.parse::<BigInt>() {
        return Some(Value::BigInt(Rc::new(n)));
    }
    token.parse::<f64>().ok().map(Value::Float)
}

/// Binary operation with promotion:
/// both Int -> 64-bit intermediate, demoted when it fits;
/// any Float -> Float; otherwise BigInt, normalized afterwards.
fn apply_op(
    a: &Value,
    b: &Value,
    name: &str,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
    big_op: fn(&BigInt, &BigInt) -> BigInt,
) -> SchemeResult<Value> {
    if !a.is_number() || !b.is_number() {
        return Err(SchemeError::TypeMismatch(format!(
            "{}: operands must be numbers",
            name
        )));
    }
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => {
            let wide = int_op(*x as i64, *y as i64);
            Ok(match i32::try_from(wide) {
                Ok(n) => Value::Int(n),
                Err(_) => Value::BigInt(Rc::new(BigInt::from(wide))),
            })
        }
        _ if is_float(a) || is_float(b) => Ok(Value::Float(float_op(to_f64(a)?, to_f64(b)?))),
        _ => Ok(normalize(big_op(&widen(a)?, &widen(b)?))),
    }
}

/// Demote a BigInt result back to Int when it fits in 32 bits.
fn normalize(n: BigInt) -> Value {
    match n.to_i32() {
        Some(small) => Value::Int(small),
        None => Value::BigInt(Rc::new(n)),
    }
}

fn is_float(v: &Value) -> bool {
    matches!(v, Value::Float(_))
}

fn to_f64(v: &Value) -> SchemeResult<f64> {
    match v {
        Value::Int(n) => Ok(*n as f64),
        Value::BigInt(n) => Ok(n.to_f64().unwrap_or(f64::NAN)),
        Value::Float(x) => Ok(*x),
        _ => Err(SchemeError::TypeMismatch("not a number".into())),
    }
}

fn widen(v: &Value) -> SchemeResult<BigInt> {
    match v {
        Value::Int(n) => Ok(BigInt::from(*n)),
        Value::BigInt(n) => Ok((**n).clone()),
        _ => Err(SchemeError::TypeMismatch("not a number".into())),
    }
}
