//! The continuation: an ordered stack of deferred operations. A captured
//! continuation is a snapshot of this stack; invoking one replaces the
//! live stack with a copy of the snapshot, never pushes onto it.

use crate::env::Env;
use crate::value::{SymbolId, Value};

/// One deferred operation, tagged with its payload.
#[derive(Clone)]
pub enum Step {
    /// Branches of a pending `if`: one or two expressions.
    Then(Value),
    /// Remaining body expressions of a `begin` or lambda body.
    Begin(Value),
    /// Variable awaiting its defined value.
    Define(SymbolId),
    /// Binding resolved at `set!` time, awaiting the new value.
    Setq(Env),
    /// Unevaluated argument list of a pending call.
    Apply(Value),
    /// Evaluated function waiting for its arguments.
    ApplyFun(Value),
    /// An argument expression queued for evaluation.
    EvalArg(Value),
    /// Arguments evaluated so far.
    ConsArgs(Value),
    /// Caller environment to reinstate on return.
    RestoreEnv(Env),
}

impl Step {
    pub fn op_name(&self) -> &'static str {
        match self {
            Step::Then(_) => "then",
            Step::Begin(_) => "begin",
            Step::Define(_) => "define",
            Step::Setq(_) => "set!",
            Step::Apply(_) => "apply",
            Step::ApplyFun(_) => "apply-fun",
            Step::EvalArg(_) => "eval-arg",
            Step::ConsArgs(_) => "cons-args",
            Step::RestoreEnv(_) => "restore-env",
        }
    }
}

/// The step stack. The last element is the next step to execute.
#[derive(Clone, Default)]
pub struct Continuation {
    steps: Vec<Step>,
}

impl Continuation {
    pub fn new() -> Self {
        Continuation { steps: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn pop(&mut self) -> Option<Step> {
        self.steps.pop()
    }

    /// Push a RestoreEnv step unless one is already on top. Collapsing
    /// consecutive restores is what keeps tail-call chains from growing
    /// the stack.
    pub fn push_restore_env(&mut self, env: &Env) {
        if !matches!(self.steps.last(), Some(Step::RestoreEnv(_))) {
            self.steps.push(Step::RestoreEnv(env.clone()));
        }
    }

    /// Invocation semantics: discard the live stack and reinstate a copy
    /// of the snapshot.
    pub fn replace_with(&mut self, snapshot: &Continuation) {
        self.steps = snapshot.steps.clone();
    }

    /// The steps, bottom first.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Binding;

    #[test]
    fn restore_env_does_not_stack_up() {
        let env = Binding::frame_marker(None);
        let mut k = Continuation::new();
        k.push_restore_env(&env);
        k.push_restore_env(&env);
        assert_eq!(k.len(), 1);
        k.push(Step::Begin(Value::Null));
        k.push_restore_env(&env);
        assert_eq!(k.len(), 3);
    }

    #[test]
    fn snapshot_is_independent_of_the_live_stack() {
        let mut k = Continuation::new();
        k.push(Step::Then(Value::Null));
        k.push(Step::Begin(Value::Null));
        let snapshot = k.clone();
        k.pop();
        k.pop();
        assert!(k.is_empty());
        assert_eq!(snapshot.len(), 2);

        k.replace_with(&snapshot);
        assert_eq!(k.len(), 2);
        assert_eq!(k.pop().unwrap().op_name(), "begin");
        // The snapshot survives for a second invocation.
        assert_eq!(snapshot.len(), 2);
    }
}
