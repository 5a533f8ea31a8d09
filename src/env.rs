//! The environment: a singly linked chain of bindings. A binding with
//! no symbol is a frame marker delimiting a function-call scope, which
//! is what keeps `define` inside a lambda body local to that call.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{SchemeError, SchemeResult};
use crate::value::{SymbolId, Value};

/// One link in an environment chain.
pub struct Binding {
    sym: Option<SymbolId>,
    val: RefCell<Value>,
    next: RefCell<Option<Env>>,
}

pub type Env = Rc<Binding>;

impl Binding {
    /// A named binding in front of `next`.
    pub fn new(sym: SymbolId, val: Value, next: Option<Env>) -> Env {
        Rc::new(Binding {
            sym: Some(sym),
            val: RefCell::new(val),
            next: RefCell::new(next),
        })
    }

    /// A frame marker in front of `next`.
    pub fn frame_marker(next: Option<Env>) -> Env {
        Rc::new(Binding {
            sym: None,
            val: RefCell::new(Value::None),
            next: RefCell::new(next),
        })
    }

    pub fn is_frame_marker(&self) -> bool {
        self.sym.is_none()
    }

    pub fn symbol(&self) -> Option<SymbolId> {
        self.sym
    }

    pub fn value(&self) -> Value {
        self.val.borrow().clone()
    }

    /// Mutate the value slot in place (the `set!` operation).
    pub fn set_value(&self, v: Value) {
        *self.val.borrow_mut() = v;
    }

    pub fn next(&self) -> Option<Env> {
        self.next.borrow().clone()
    }
}

/// Scan the chain outward for the first binding of `sym`.
pub fn look_for(start: &Env, sym: SymbolId) -> Option<Env> {
    let mut current = Some(start.clone());
    while let Some(binding) = current {
        if binding.sym == Some(sym) {
            return Some(binding);
        }
        current = binding.next();
    }
    None
}

/// Insert a new binding immediately after the nearest frame marker, by
/// mutating the marker's next pointer. Every chain that already holds a
/// reference to the marker sees the definition; an existing binding of
/// the same name is shadowed, never replaced.
pub fn define(env: &Env, sym: SymbolId, val: Value) -> SchemeResult<()> {
    let mut current = env.clone();
    loop {
        if current.is_frame_marker() {
            let tail = current.next();
            let link = Binding::new(sym, val, tail);
            *current.next.borrow_mut() = Some(link);
            return Ok(());
        }
        match current.next() {
            Some(next) => current = next,
            None => {
                return Err(SchemeError::Internal(
                    "define: no frame marker in scope".into(),
                ))
            }
        }
    }
}

/// Zip a parameter list with an argument list onto `tail`, newest
/// parameter in front. Returns `tail` itself when both lists are empty.
pub fn prepend_defs(tail: &Env, params: &Value, args: &Value) -> SchemeResult<Env> {
    match (params, args) {
        (Value::Null, Value::Null) => Ok(tail.clone()),
        (Value::Cell(p), Value::Cell(a)) => {
            let sym = p.car.as_symbol().ok_or_else(|| {
                SchemeError::TypeMismatch("parameter is not a symbol".into())
            })?;
            let rest = prepend_defs(tail, &p.cdr, &a.cdr)?;
            Ok(Binding::new(sym, a.car.clone(), Some(rest)))
        }
        (Value::Null, Value::Cell(_)) | (Value::Cell(_), Value::Null) => Err(
            SchemeError::ArityMismatch("parameter and argument lists differ in length".into()),
        ),
        _ => Err(SchemeError::ImproperList(
            "parameter or argument list has a dotted tail".into(),
        )),
    }
}
