use std::rc::Rc;

use crate::cont::{Continuation, Step};
use crate::env::Env;
use crate::symbol::SymbolTable;
use crate::value::Value;

/// Print a value to a string. `quote_strings` controls whether string
/// values are wrapped in double quotes (`display` passes false).
pub fn stringify(val: &Value, symbols: &SymbolTable, quote_strings: bool) -> String {
    let mut out = String::new();
    write_value(&mut out, val, symbols, quote_strings);
    out
}

fn write_value(out: &mut String, val: &Value, symbols: &SymbolTable, quote_strings: bool) {
    match val {
        Value::Bool(true) => out.push_str("#t"),
        Value::Bool(false) => out.push_str("#f"),
        Value::Null => out.push_str("()"),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::BigInt(n) => out.push_str(&n.to_string()),
        Value::Float(x) => write_float(out, *x),
        Value::Str(s) => {
            if quote_strings {
                out.push('"');
                out.push_str(s);
                out.push('"');
            } else {
                out.push_str(s);
            }
        }
        Value::Sym(id) => out.push_str(symbols.name(*id)),
        Value::Cell(cell) => {
            // Walk the spine iteratively; a non-null terminator prints
            // as a dotted tail.
            out.push('(');
            write_value(out, &cell.car, symbols, quote_strings);
            let mut current = cell.cdr.clone();
            loop {
                match current {
                    Value::Null => break,
                    Value::Cell(next) => {
                        out.push(' ');
                        write_value(out, &next.car, symbols, quote_strings);
                        current = next.cdr.clone();
                    }
                    other => {
                        out.push_str(" . ");
                        write_value(out, &other, symbols, quote_strings);
                        break;
                    }
                }
            }
            out.push(')');
        }
        Value::Closure(c) => {
            out.push_str("#<lambda:");
            write_value(out, &c.params, symbols, quote_strings);
            out.push('>');
        }
        Value::Intrinsic(p) => {
            out.push_str(&format!("#<{}:{}>", symbols.name(p.name), p.arity));
        }
        Value::Continuation(k) => {
            out.push_str(&format!("#<continuation:{}>", k.len()));
        }
        Value::None => out.push_str("#<none>"),
        Value::Eof => out.push_str("#<eof>"),
        Value::Callcc => out.push_str("#<call/cc>"),
        Value::Apply => out.push_str("#<apply>"),
    }
}

/// Floats always carry a decimal point so they read back as floats.
fn write_float(out: &mut String, x: f64) {
    if x.is_finite() && x.fract() == 0.0 {
        out.push_str(&format!("{:.1}", x));
    } else {
        out.push_str(&x.to_string());
    }
}

/// Diagnostic rendering of an environment chain: binding names from the
/// head outward, frame markers as `|`, the global chain collapsed to
/// `GlobalEnv`.
pub fn stringify_env(env: &Env, globals: &Env, symbols: &SymbolTable) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current = Some(env.clone());
    while let Some(binding) = current {
        if Rc::ptr_eq(&binding, globals) {
            parts.push("GlobalEnv".into());
            break;
        }
        match binding.symbol() {
            Some(id) => parts.push(symbols.name(id).to_string()),
            None => parts.push("|".into()),
        }
        current = binding.next();
    }
    format!("#<{}>", parts.join(" "))
}

/// Diagnostic rendering of a continuation, next step first. This is the
/// pseudo stack trace attached to evaluator errors.
pub fn stringify_continuation(k: &Continuation, globals: &Env, symbols: &SymbolTable) -> String {
    let mut parts: Vec<String> = Vec::new();
    for step in k.steps().iter().rev() {
        let payload = match step {
            Step::Then(v)
            | Step::Begin(v)
            | Step::Apply(v)
            | Step::ApplyFun(v)
            | Step::EvalArg(v)
            | Step::ConsArgs(v) => stringify(v, symbols, true),
            Step::Define(id) => symbols.name(*id).to_string(),
            Step::Setq(binding) => match binding.symbol() {
                Some(id) => symbols.name(id).to_string(),
                None => "|".into(),
            },
            Step::RestoreEnv(env) => stringify_env(env, globals, symbols),
        };
        parts.push(format!("{} {}", step.op_name(), payload));
    }
    format!("#<{}>", parts.join("\n\t  "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Binding;
    use crate::value::{cons, list, SymbolId, Value};
    use std::rc::Rc;

    fn fixture() -> SymbolTable {
        SymbolTable::new()
    }

    #[test]
    fn atoms() {
        let symbols = fixture();
        assert_eq!(stringify(&Value::Bool(true), &symbols, true), "#t");
        assert_eq!(stringify(&Value::Null, &symbols, true), "()");
        assert_eq!(stringify(&Value::Int(-3), &symbols, true), "-3");
        assert_eq!(stringify(&Value::Float(2.0), &symbols, true), "2.0");
        assert_eq!(stringify(&Value::Float(2.5), &symbols, true), "2.5");
        assert_eq!(stringify(&Value::Sym(SymbolId(6)), &symbols, true), "car");
    }

    #[test]
    fn string_quoting_follows_the_flag() {
        let symbols = fixture();
        let s = Value::Str(Rc::new("hi".into()));
        assert_eq!(stringify(&s, &symbols, true), "\"hi\"");
        assert_eq!(stringify(&s, &symbols, false), "hi");
        // The flag reaches strings nested in lists.
        let l = list(&[s]);
        assert_eq!(stringify(&l, &symbols, false), "(hi)");
    }

    #[test]
    fn lists_and_dotted_tails() {
        let symbols = fixture();
        let l = list(&[Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(stringify(&l, &symbols, true), "(1 2 3)");
        let dotted = cons(Value::Int(1), cons(Value::Int(2), Value::Int(3)));
        assert_eq!(stringify(&dotted, &symbols, true), "(1 2 . 3)");
    }

    #[test]
    fn environment_diagnostics() {
        let mut symbols = fixture();
        let global = Binding::frame_marker(None);
        let n = symbols.intern("n");
        let inner = Binding::new(n, Value::Int(1), Some(global.clone()));
        let framed = Binding::frame_marker(Some(inner));
        assert_eq!(
            stringify_env(&framed, &global, &symbols),
            "#<| n GlobalEnv>"
        );
    }
}
