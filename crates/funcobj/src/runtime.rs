use std::rc::Rc;

use crate::{
    evaluator::{CallObserver, Evaluator},
    exception::RunResult,
    function::FunctionRef,
    tracer::{FunctionTracer, NoopTracer},
    types::{Cell, Code, Dict, StringDict},
    value::Value,
};

/// Host-facing entry point that pairs an evaluator with a tracer.
///
/// Every function-object operation is also available directly on [`FunctionRef`];
/// going through the runtime adds tracing and call-depth bookkeeping. The depth is
/// informational only: no limit is enforced here, recursion bounds belong to the
/// evaluator.
///
/// Each call hands the evaluator a [`CallObserver`] tied to this runtime's tracer.
/// Nested calls the evaluator makes through [`FunctionRef::call_observed`] or
/// [`Value::call_observed`] with that observer are traced at their real depth; calls
/// made through the plain `call` methods are not.
#[derive(Debug)]
pub struct Runtime<E: Evaluator, Tr: FunctionTracer = NoopTracer> {
    evaluator: E,
    tracer: Tr,
    depth: usize,
}

impl<E: Evaluator> Runtime<E, NoopTracer> {
    /// Creates a runtime with tracing disabled.
    pub fn new(evaluator: E) -> Self {
        Self::with_tracer(evaluator, NoopTracer)
    }
}

impl<E: Evaluator, Tr: FunctionTracer> Runtime<E, Tr> {
    /// Creates a runtime that reports to `tracer`.
    pub fn with_tracer(evaluator: E, tracer: Tr) -> Self {
        Self {
            evaluator,
            tracer,
            depth: 0,
        }
    }

    /// Creates a function object, see [`FunctionRef::new`].
    pub fn make_function(&mut self, code: Rc<Code>, globals: Dict, qualname: &str) -> FunctionRef {
        let func = FunctionRef::new(code, globals, qualname);
        self.trace_make(&func);
        func
    }

    /// Creates a closure, see [`FunctionRef::new_closure`].
    pub fn make_closure(&mut self, code: Rc<Code>, globals: Dict, qualname: &str, closure: Rc<[Cell]>) -> FunctionRef {
        let func = FunctionRef::new_closure(code, globals, qualname, closure);
        self.trace_make(&func);
        func
    }

    fn trace_make(&mut self, func: &FunctionRef) {
        let f = func.borrow();
        let defaults_count = f.defaults.as_ref().map_or(0, |d| d.len());
        self.tracer.on_make_function(&f.qualname, f.closure_len(), defaults_count);
    }

    /// Calls a function through the evaluator.
    ///
    /// Errors raised by the evaluator are returned unchanged.
    pub fn call(&mut self, func: &FunctionRef, args: Vec<Value>, kwargs: StringDict) -> RunResult<Value> {
        let mut stack = CallStack {
            tracer: &mut self.tracer,
            depth: &mut self.depth,
        };
        func.call_observed(&mut self.evaluator, &mut stack, args, kwargs)
    }

    /// Calls any callable value: a function, or a bound method with its receiver prepended.
    ///
    /// Anything else raises `TypeError: '<type>' object is not callable` without reaching
    /// the tracer.
    pub fn call_value(&mut self, callable: &Value, args: Vec<Value>, kwargs: StringDict) -> RunResult<Value> {
        let mut stack = CallStack {
            tracer: &mut self.tracer,
            depth: &mut self.depth,
        };
        callable.call_observed(&mut self.evaluator, &mut stack, args, kwargs)
    }

    /// Reads an attribute, see [`FunctionRef::get_attr`].
    pub fn get_attr(&self, func: &FunctionRef, name: &str) -> RunResult<Value> {
        func.get_attr(name)
    }

    /// Assigns an attribute, see [`FunctionRef::set_attr`].
    pub fn set_attr(&mut self, func: &FunctionRef, name: &str, value: Value) -> RunResult<()> {
        let result = func.set_attr(name, value);
        self.tracer.on_attr_set(name, result.is_ok());
        result
    }

    /// Deletes an attribute, see [`FunctionRef::del_attr`].
    pub fn del_attr(&mut self, func: &FunctionRef, name: &str) -> RunResult<()> {
        let result = func.del_attr(name);
        self.tracer.on_attr_delete(name, result.is_ok());
        result
    }

    /// Reads a function through an owner, see [`FunctionRef::bind`].
    pub fn bind(&mut self, func: &FunctionRef, instance: &Value, owner: &Value) -> Value {
        let bound = func.bind(instance, owner);
        self.tracer.on_bind(matches!(bound, Value::BoundMethod(_)));
        bound
    }

    /// Current depth of runtime-initiated calls.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn evaluator_mut(&mut self) -> &mut E {
        &mut self.evaluator
    }

    pub fn tracer(&self) -> &Tr {
        &self.tracer
    }

    pub fn tracer_mut(&mut self) -> &mut Tr {
        &mut self.tracer
    }

    /// Consumes the runtime, returning the evaluator and tracer.
    pub fn into_parts(self) -> (E, Tr) {
        (self.evaluator, self.tracer)
    }
}

/// The runtime's view of the calls in flight, handed to the evaluator with each request.
struct CallStack<'a, Tr: FunctionTracer> {
    tracer: &'a mut Tr,
    depth: &'a mut usize,
}

impl<Tr: FunctionTracer> CallObserver for CallStack<'_, Tr> {
    fn enter_call(&mut self, qualname: &str) {
        *self.depth += 1;
        self.tracer.on_call(qualname, *self.depth);
    }

    fn exit_call(&mut self, ok: bool) {
        *self.depth -= 1;
        self.tracer.on_return(*self.depth, ok);
    }
}
