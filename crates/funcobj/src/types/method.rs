use std::fmt;

use crate::{
    evaluator::{CallObserver, Evaluator, NoopObserver},
    exception::RunResult,
    function::FunctionRef,
    types::StringDict,
    value::Value,
};

/// A function bound to the instance it was read from.
///
/// Created by [`FunctionRef::bind`] when a function is accessed through an instance.
/// Calling it calls the function with the instance prepended to the positional
/// arguments. It exposes `__func__` and `__self__`; every other attribute read is
/// answered by the underlying function.
#[derive(Debug)]
pub struct BoundMethod {
    /// The underlying function.
    func: FunctionRef,
    /// The bound `self` value.
    self_arg: Value,
}

impl BoundMethod {
    /// Creates a new bound method from a function and bound argument.
    #[must_use]
    pub fn new(func: FunctionRef, self_arg: Value) -> Self {
        Self { func, self_arg }
    }

    /// Returns the underlying function.
    #[must_use]
    pub fn func(&self) -> &FunctionRef {
        &self.func
    }

    /// Returns the bound `self` value.
    #[must_use]
    pub fn self_arg(&self) -> &Value {
        &self.self_arg
    }

    /// Calls the function with `self_arg` followed by `args`.
    pub fn call(&self, evaluator: &mut impl Evaluator, args: Vec<Value>, kwargs: StringDict) -> RunResult<Value> {
        self.call_observed(evaluator, &mut NoopObserver, args, kwargs)
    }

    /// Like [`BoundMethod::call`], reporting the call to `calls`.
    pub fn call_observed(
        &self,
        evaluator: &mut impl Evaluator,
        calls: &mut dyn CallObserver,
        args: Vec<Value>,
        kwargs: StringDict,
    ) -> RunResult<Value> {
        let mut full_args = Vec::with_capacity(args.len() + 1);
        full_args.push(self.self_arg.clone());
        full_args.extend(args);
        self.func.call_observed(evaluator, calls, full_args, kwargs)
    }

    /// Reads an attribute of the bound method.
    pub fn get_attr(&self, name: &str) -> RunResult<Value> {
        match name {
            "__self__" => Ok(self.self_arg.clone()),
            "__func__" => Ok(Value::Function(self.func.clone())),
            _ => self.func.get_attr(name),
        }
    }
}

impl fmt::Display for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<bound method {} of {:?}>", self.func.qualname(), self.self_arg)
    }
}
