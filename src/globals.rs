use std::rc::Rc;

use crate::env::{self, Binding, Env};
use crate::primitives::*;
use crate::symbol::sym;
use crate::value::{Intrinsic, PrimFn, SymbolId, Value};

/// Build the initial global environment: a frame marker followed by the
/// primitive bindings. Each entry is inserted behind the marker, so the
/// finished chain reads newest-first and later `define`s land in front
/// of all of these.
pub fn build_globals() -> Env {
    let globe = Binding::frame_marker(None);

    let prims: &[(SymbolId, i32, PrimFn)] = &[
        (sym::CAR, 1, prim_car),
        (sym::CDR, 1, prim_cdr),
        (sym::CONS, 2, prim_cons),
        (sym::EQ, 2, prim_eq),
        (sym::PAIR_P, 1, prim_pair_p),
        (sym::NULL_P, 1, prim_null_p),
        (sym::NOT, 1, prim_not),
        (sym::LIST, -1, prim_list),
        (sym::DISPLAY, 1, prim_display),
        (sym::NEWLINE, 0, prim_newline),
        (sym::READ, 0, prim_read),
        (sym::EOF_P, 1, prim_eof_p),
        (sym::SYMBOL_P, 1, prim_symbol_p),
    ];
    for &(name, arity, func) in prims {
        install(&globe, name, arity, func);
    }

    // The two sentinel functions; apply_function unwraps these.
    env::define(&globe, sym::CALLCC, Value::Callcc).expect("globe always has a frame marker");
    env::define(&globe, sym::APPLY, Value::Apply).expect("globe always has a frame marker");

    let rest: &[(SymbolId, i32, PrimFn)] = &[
        (sym::PLUS, 2, prim_add),
        (sym::MINUS, 2, prim_subtract),
        (sym::TIMES, 2, prim_multiply),
        (sym::LESS, 2, prim_less),
        (sym::EQUALS, 2, prim_num_eq),
        (sym::NUMBER_P, 1, prim_number_p),
        (sym::ERROR, 2, prim_error),
        (sym::GLOBALS, 0, prim_globals),
    ];
    for &(name, arity, func) in rest {
        install(&globe, name, arity, func);
    }

    globe
}

fn install(globe: &Env, name: SymbolId, arity: i32, func: PrimFn) {
    let value = Value::Intrinsic(Rc::new(Intrinsic { name, arity, func }));
    env::define(globe, name, value).expect("globe always has a frame marker");
}
