use std::fmt;
use std::rc::Rc;

use num_bigint::BigInt;

use crate::cont::Continuation;
use crate::env::Env;
use crate::error::{SchemeError, SchemeResult};

/// Unique identifier for an interned symbol.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

/// A cons cell. Lists are assembled back to front, so neither field
/// needs interior mutability; sharing is by reference count.
pub struct Cell {
    pub car: Value,
    pub cdr: Value,
}

/// A lambda together with its defining environment. The environment is
/// captured by reference, so definitions added to that frame later are
/// visible to the closure.
pub struct Closure {
    pub params: Value,
    pub body: Value,
    pub env: Env,
}

/// Signature of a built-in procedure: the interpreter instance plus the
/// already-evaluated argument list.
pub type PrimFn = fn(&mut crate::eval::Interp, &Value) -> SchemeResult<Value>;

/// A built-in procedure implemented in Rust.
/// Arity is exact when non-negative; -1 means variadic.
pub struct Intrinsic {
    pub name: SymbolId,
    pub arity: i32,
    pub func: PrimFn,
}

/// The fundamental runtime value.
#[derive(Clone)]
pub enum Value {
    Bool(bool),
    /// The empty list, also the proper-list terminator.
    Null,
    Int(i32),
    BigInt(Rc<BigInt>),
    Float(f64),
    Str(Rc<String>),
    Sym(SymbolId),
    Cell(Rc<Cell>),
    Closure(Rc<Closure>),
    Intrinsic(Rc<Intrinsic>),
    /// A captured continuation snapshot.
    Continuation(Rc<Continuation>),
    /// The no-value sentinel (result of define, set!, one-armed if).
    None,
    /// End of input.
    Eof,
    /// Marker unwrapped by apply_function into a continuation capture.
    Callcc,
    /// Marker unwrapped by apply_function into a spread application.
    Apply,
}

impl Value {
    pub fn is_pair(&self) -> bool {
        matches!(self, Value::Cell(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Only `#f` is false; every other value is true.
    pub fn is_false(&self) -> bool {
        matches!(self, Value::Bool(false))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::BigInt(_) | Value::Float(_))
    }

    pub fn as_cell(&self) -> Option<&Rc<Cell>> {
        match self {
            Value::Cell(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<SymbolId> {
        match self {
            Value::Sym(id) => Some(*id),
            _ => None,
        }
    }
}

/// Allocate a fresh cons cell.
pub fn cons(car: Value, cdr: Value) -> Value {
    Value::Cell(Rc::new(Cell { car, cdr }))
}

/// First element of a pair.
pub fn car(v: &Value) -> SchemeResult<Value> {
    match v {
        Value::Cell(cell) => Ok(cell.car.clone()),
        _ => Err(SchemeError::TypeMismatch("car of a non-pair".into())),
    }
}

/// Rest of a pair.
pub fn cdr(v: &Value) -> SchemeResult<Value> {
    match v {
        Value::Cell(cell) => Ok(cell.cdr.clone()),
        _ => Err(SchemeError::TypeMismatch("cdr of a non-pair".into())),
    }
}

/// Build a proper list from a slice.
pub fn list(items: &[Value]) -> Value {
    let mut result = Value::Null;
    for item in items.iter().rev() {
        result = cons(item.clone(), result);
    }
    result
}

/// Length of a proper list. Fails on a dotted tail.
pub fn list_len(v: &Value) -> SchemeResult<usize> {
    let mut count = 0;
    let mut current = v.clone();
    loop {
        match current {
            Value::Null => return Ok(count),
            Value::Cell(cell) => {
                count += 1;
                current = cell.cdr.clone();
            }
            _ => return Err(SchemeError::ImproperList("expected a proper list".into())),
        }
    }
}

/// The `eq?` relation: pointer identity for heap values, plain equality
/// for the small atoms, id equality for interned symbols.
pub fn identical(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Null, Value::Null)
        | (Value::None, Value::None)
        | (Value::Eof, Value::Eof)
        | (Value::Callcc, Value::Callcc)
        | (Value::Apply, Value::Apply) => true,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::BigInt(x), Value::BigInt(y)) => Rc::ptr_eq(x, y) || x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Sym(x), Value::Sym(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => Rc::ptr_eq(x, y),
        (Value::Cell(x), Value::Cell(y)) => Rc::ptr_eq(x, y),
        (Value::Closure(x), Value::Closure(y)) => Rc::ptr_eq(x, y),
        (Value::Intrinsic(x), Value::Intrinsic(y)) => Rc::ptr_eq(x, y),
        (Value::Continuation(x), Value::Continuation(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Null => write!(f, "Null"),
            Value::Int(n) => write!(f, "Int({})", n),
            Value::BigInt(n) => write!(f, "BigInt({})", n),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Sym(id) => write!(f, "Sym({})", id.0),
            Value::Cell(cell) => write!(f, "({:?} . {:?})", cell.car, cell.cdr),
            Value::Closure(_) => write!(f, "Closure"),
            Value::Intrinsic(p) => write!(f, "Intrinsic({})", p.name.0),
            Value::Continuation(k) => write!(f, "Continuation({})", k.len()),
            Value::None => write!(f, "None"),
            Value::Eof => write!(f, "Eof"),
            Value::Callcc => write!(f, "Callcc"),
            Value::Apply => write!(f, "Apply"),
        }
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_construction_and_length() {
        let l = list(&[Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(list_len(&l).unwrap(), 3);
        assert!(matches!(car(&l).unwrap(), Value::Int(1)));
    }

    #[test]
    fn improper_list_length_fails() {
        let dotted = cons(Value::Int(1), Value::Int(2));
        assert!(matches!(
            list_len(&dotted),
            Err(SchemeError::ImproperList(_))
        ));
    }

    #[test]
    fn identity_relation() {
        let a = cons(Value::Int(1), Value::Null);
        let b = a.clone();
        let c = cons(Value::Int(1), Value::Null);
        assert!(identical(&a, &b));
        assert!(!identical(&a, &c));
        assert!(identical(&Value::Sym(SymbolId(4)), &Value::Sym(SymbolId(4))));
        assert!(!identical(&Value::Int(1), &Value::Float(1.0)));
    }
}
