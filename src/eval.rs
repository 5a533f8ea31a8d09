use std::collections::VecDeque;
use std::io::{self, Write};
use std::rc::Rc;

use crate::cont::{Continuation, Step};
use crate::env::{self, Binding, Env};
use crate::error::{SchemeError, SchemeResult};
use crate::globals;
use crate::printer;
use crate::reader::{self, ExprReader, LineSource, StdinSource};
use crate::symbol::{sym, SymbolTable};
use crate::value::{self, Closure, Value};

/// The interpreter instance. All process-wide language state — the
/// symbol table, the global environment, the pending token buffer, the
/// host I/O — lives here so that several interpreters can coexist.
pub struct Interp {
    pub symbols: SymbolTable,
    globals: Env,
    /// Host-facing expression reader, shared by the REPL and the `read`
    /// primitive.
    reader: ExprReader,
    /// Token buffer for loaded files and piped input, kept separate so
    /// `read` never consumes the rest of a running script.
    script: VecDeque<String>,
    pub(crate) out: Box<dyn Write>,
    /// Debug trace flag.
    pub trace: bool,
}

impl Interp {
    /// An interpreter wired to stdin/stdout.
    pub fn new() -> Self {
        Self::with_io(Box::new(StdinSource), Box::new(io::stdout()))
    }

    /// An interpreter with an explicit line source and output sink.
    pub fn with_io(source: Box<dyn LineSource>, out: Box<dyn Write>) -> Self {
        Interp {
            symbols: SymbolTable::new(),
            globals: globals::build_globals(),
            reader: ExprReader::new(source),
            script: VecDeque::new(),
            out,
            trace: false,
        }
    }

    /// The initial environment: a frame marker followed by the
    /// primitive bindings.
    pub fn global_env(&self) -> Env {
        self.globals.clone()
    }

    pub fn stringify(&self, val: &Value, quote_strings: bool) -> String {
        printer::stringify(val, &self.symbols, quote_strings)
    }

    /// Read one complete expression from the host, prompting with
    /// `prompt1` for a fresh expression and `prompt2` for continuation
    /// lines. Returns `Eof` at end of stream.
    pub fn read_expression(&mut self, prompt1: &str, prompt2: &str) -> SchemeResult<Value> {
        // Pending display output must be visible before the host blocks
        // on input.
        self.out
            .flush()
            .map_err(|e| SchemeError::Io(e.to_string()))?;
        self.reader
            .read_expression(&mut self.symbols, prompt1, prompt2)
    }

    /// Queue raw source text for `next_expression`.
    pub fn feed_source(&mut self, text: &str) {
        reader::tokenize(text, &mut self.script);
    }

    /// Parse the next queued expression, if any.
    pub fn next_expression(&mut self) -> SchemeResult<Option<Value>> {
        reader::next_datum(&mut self.script, &mut self.symbols)
    }

    /// Evaluate every expression in `text` against the global
    /// environment, discarding the results. This is the file loader.
    pub fn load_source(&mut self, text: &str) -> SchemeResult<()> {
        self.feed_source(text);
        while let Some(expr) = self.next_expression()? {
            let env = self.global_env();
            self.evaluate(expr, &env)?;
        }
        Ok(())
    }

    /// Evaluate an expression. Any error other than a user-signalled one
    /// comes back wrapped with the pending continuation as a pseudo
    /// stack trace.
    pub fn evaluate(&mut self, expr: Value, env: &Env) -> SchemeResult<Value> {
        let mut k = Continuation::new();
        match self.drive(expr, env.clone(), &mut k) {
            Err(e) if !matches!(e, SchemeError::User(_) | SchemeError::Traced { .. }) => {
                Err(SchemeError::Traced {
                    error: Box::new(e),
                    continuation: printer::stringify_continuation(
                        &k,
                        &self.globals,
                        &self.symbols,
                    ),
                })
            }
            other => other,
        }
    }

    /// The trampoline. Phase A breaks the current expression down until
    /// a value is in hand; Phase B pops continuation steps until one of
    /// them demands another expression, or the stack empties.
    fn drive(&mut self, mut exp: Value, mut env: Env, k: &mut Continuation) -> SchemeResult<Value> {
        loop {
            if self.trace {
                eprintln!(
                    "[eval] exp={} depth={}",
                    printer::stringify(&exp, &self.symbols, true),
                    k.len()
                );
            }

            // Phase A: expression dispatch.
            loop {
                match &exp {
                    Value::Cell(cell) => {
                        let head = cell.car.clone();
                        let tail = cell.cdr.clone();
                        match head.as_symbol() {
                            Some(s) if s == sym::QUOTE => {
                                exp = value::car(&tail)?;
                                break;
                            }
                            Some(s) if s == sym::IF => {
                                let test = value::car(&tail)?;
                                k.push(Step::Then(value::cdr(&tail)?));
                                exp = test;
                            }
                            Some(s) if s == sym::BEGIN => {
                                let first = value::car(&tail)?;
                                let rest = value::cdr(&tail)?;
                                if !rest.is_null() {
                                    k.push(Step::Begin(rest));
                                }
                                exp = first;
                            }
                            Some(s) if s == sym::LAMBDA => {
                                let params = value::car(&tail)?;
                                let body = value::cdr(&tail)?;
                                exp = Value::Closure(Rc::new(Closure {
                                    params,
                                    body,
                                    env: env.clone(),
                                }));
                                break;
                            }
                            Some(s) if s == sym::DEFINE => {
                                let var = value::car(&tail)?.as_symbol().ok_or_else(|| {
                                    SchemeError::TypeMismatch(
                                        "define: variable is not a symbol".into(),
                                    )
                                })?;
                                k.push(Step::Define(var));
                                exp = value::car(&value::cdr(&tail)?)?;
                            }
                            Some(s) if s == sym::SETQ => {
                                // Resolve the binding now, before the
                                // value expression runs.
                                let var = value::car(&tail)?.as_symbol().ok_or_else(|| {
                                    SchemeError::TypeMismatch(
                                        "set!: variable is not a symbol".into(),
                                    )
                                })?;
                                let binding = env::look_for(&env, var).ok_or_else(|| {
                                    SchemeError::UnboundName(self.symbols.name(var).to_string())
                                })?;
                                k.push(Step::Setq(binding));
                                exp = value::car(&value::cdr(&tail)?)?;
                            }
                            _ => {
                                // Procedure call: evaluate the head with
                                // the raw argument list pending.
                                k.push(Step::Apply(tail));
                                exp = head;
                            }
                        }
                    }
                    Value::Sym(s) => {
                        let id = *s;
                        let binding = env::look_for(&env, id).ok_or_else(|| {
                            SchemeError::UnboundName(self.symbols.name(id).to_string())
                        })?;
                        exp = binding.value();
                        break;
                    }
                    _ => break, // literal
                }
            }

            // Phase B: continuation dispatch.
            loop {
                let Some(step) = k.pop() else {
                    return Ok(exp);
                };
                match step {
                    Step::Then(branches) => {
                        if exp.is_false() {
                            match value::cdr(&branches)? {
                                Value::Null => exp = Value::None,
                                rest => {
                                    exp = value::car(&rest)?;
                                    break;
                                }
                            }
                        } else {
                            exp = value::car(&branches)?;
                            break;
                        }
                    }
                    Step::Begin(body) => {
                        let rest = value::cdr(&body)?;
                        if !rest.is_null() {
                            k.push(Step::Begin(rest));
                        }
                        exp = value::car(&body)?;
                        break;
                    }
                    Step::Define(var) => {
                        env::define(&env, var, exp)?;
                        exp = Value::None;
                    }
                    Step::Setq(binding) => {
                        binding.set_value(exp);
                        exp = Value::None;
                    }
                    Step::Apply(args) => {
                        if args.is_null() {
                            let (v, e) = self.apply_function(exp, Value::Null, k, env)?;
                            exp = v;
                            env = e;
                        } else {
                            k.push(Step::ApplyFun(exp));
                            // Queue every argument but the last; the
                            // last evaluates first, so consing yields
                            // the list in call order.
                            let mut rest = args;
                            loop {
                                match rest {
                                    Value::Cell(cell) => {
                                        if cell.cdr.is_null() {
                                            exp = cell.car.clone();
                                            break;
                                        }
                                        k.push(Step::EvalArg(cell.car.clone()));
                                        rest = cell.cdr.clone();
                                    }
                                    _ => {
                                        return Err(SchemeError::ImproperList(
                                            "argument list has a dotted tail".into(),
                                        ))
                                    }
                                }
                            }
                            k.push(Step::ConsArgs(Value::Null));
                            break;
                        }
                    }
                    Step::ConsArgs(so_far) => {
                        let args = value::cons(exp, so_far);
                        match k.pop() {
                            Some(Step::EvalArg(next)) => {
                                k.push(Step::ConsArgs(args));
                                exp = next;
                                break;
                            }
                            Some(Step::ApplyFun(f)) => {
                                let (v, e) = self.apply_function(f, args, k, env)?;
                                exp = v;
                                env = e;
                            }
                            _ => {
                                return Err(SchemeError::Internal(
                                    "cons-args step without a pending application".into(),
                                ))
                            }
                        }
                    }
                    Step::RestoreEnv(saved) => {
                        env = saved;
                    }
                    Step::ApplyFun(_) | Step::EvalArg(_) => {
                        return Err(SchemeError::Internal(
                            "application step surfaced outside cons-args".into(),
                        ))
                    }
                }
            }
        }
    }

    /// Apply `fun` to an evaluated argument list. Returns the result
    /// value and the environment to continue in; for a closure the
    /// result is the no-value sentinel and the body has been pushed
    /// onto the continuation.
    fn apply_function(
        &mut self,
        fun: Value,
        args: Value,
        k: &mut Continuation,
        env: Env,
    ) -> SchemeResult<(Value, Env)> {
        let mut fun = fun;
        let mut args = args;

        // Unwrap the sentinel functions first: call/cc reifies the
        // current stack into the argument, apply spreads its list.
        loop {
            match fun {
                Value::Callcc => {
                    k.push_restore_env(&env);
                    let target = value::car(&args)?;
                    args = value::cons(
                        Value::Continuation(Rc::new(k.clone())),
                        Value::Null,
                    );
                    fun = target;
                }
                Value::Apply => {
                    let target = value::car(&args)?;
                    args = value::car(&value::cdr(&args)?)?;
                    fun = target;
                }
                _ => break,
            }
        }

        match fun {
            Value::Intrinsic(p) => {
                if p.arity >= 0 {
                    let supplied = value::list_len(&args)?;
                    if supplied != p.arity as usize {
                        return Err(SchemeError::ArityMismatch(format!(
                            "{} takes {} argument(s), got {}",
                            self.symbols.name(p.name),
                            p.arity,
                            supplied
                        )));
                    }
                }
                let result = (p.func)(self, &args)?;
                Ok((result, env))
            }
            Value::Closure(c) => {
                if self.trace {
                    eprintln!(
                        "[apply] params={} args={}",
                        printer::stringify(&c.params, &self.symbols, true),
                        printer::stringify(&args, &self.symbols, true)
                    );
                }
                k.push_restore_env(&env);
                k.push(Step::Begin(c.body.clone()));
                let inner = env::prepend_defs(&c.env, &c.params, &args)?;
                Ok((Value::None, Binding::frame_marker(Some(inner))))
            }
            Value::Continuation(snapshot) => {
                k.replace_with(&snapshot);
                Ok((value::car(&args)?, env))
            }
            other => Err(SchemeError::NotAFunction(
                printer::stringify(&other, &self.symbols, true),
            )),
        }
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}
