//! The seam between function objects and the bytecode evaluator.
//!
//! Function objects never execute code themselves. A call packages the function's
//! current state into an [`EvalRequest`] and hands it to an [`Evaluator`], which does
//! all argument binding, arity checking and execution. Whatever the evaluator
//! returns, success or failure, goes back to the caller untouched.

use std::rc::Rc;

use crate::{
    exception::RunResult,
    types::{Cell, Code, Dict, StringDict},
    value::{Tuple, Value},
};

/// Everything the evaluator needs to run one call of a function object.
///
/// `defaults`, `kw_defaults` and `closure` are the function's fields as they were at
/// call time, shared by reference rather than copied. `locals` is always a fresh,
/// empty dict owned by this call.
#[derive(Debug, Clone)]
pub struct EvalRequest {
    pub code: Rc<Code>,
    pub globals: Dict,
    pub locals: Dict,
    pub args: Vec<Value>,
    pub kwargs: StringDict,
    pub defaults: Option<Tuple>,
    pub kw_defaults: Option<Dict>,
    pub closure: Option<Rc<[Cell]>>,
}

/// Sees every call entering and leaving the evaluator.
///
/// An observer is handed to [`Evaluator::evaluate`] alongside each request. Calls the
/// evaluator makes from inside the body should go through
/// [`FunctionRef::call_observed`](crate::FunctionRef::call_observed) (or
/// [`Value::call_observed`]) with that same observer, so nested and recursive calls
/// are seen at their real depth.
pub trait CallObserver {
    /// Called with the callee's `__qualname__` before the request is evaluated.
    fn enter_call(&mut self, qualname: &str);

    /// Called after evaluation, with whether it produced a value.
    fn exit_call(&mut self, ok: bool);
}

/// Observer used when nobody is watching.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CallObserver for NoopObserver {
    #[inline(always)]
    fn enter_call(&mut self, _qualname: &str) {}

    #[inline(always)]
    fn exit_call(&mut self, _ok: bool) {}
}

/// Executes code objects on behalf of function objects.
///
/// Evaluators may call back into function objects (e.g. `Value::call_observed` from
/// inside the dispatch loop) to any depth; nothing here bounds or unwinds that recursion.
///
/// Any `FnMut(EvalRequest) -> RunResult<Value>` closure is an evaluator, which keeps
/// test doubles and embedding shims short. Closures ignore the observer, so calls they
/// make internally are not observed.
pub trait Evaluator {
    /// Runs `request.code` and returns its result.
    fn evaluate(&mut self, request: EvalRequest, calls: &mut dyn CallObserver) -> RunResult<Value>;
}

impl<F> Evaluator for F
where
    F: FnMut(EvalRequest) -> RunResult<Value>,
{
    fn evaluate(&mut self, request: EvalRequest, _calls: &mut dyn CallObserver) -> RunResult<Value> {
        self(request)
    }
}
