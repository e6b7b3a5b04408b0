use std::{
    cell::{Ref, RefCell, RefMut},
    fmt,
    rc::Rc,
};

use crate::{
    descriptor,
    evaluator::{CallObserver, EvalRequest, Evaluator, NoopObserver},
    exception::{ExcType, RunResult},
    types::{BoundMethod, Cell, Code, Dict, StringDict, Type, WeakFunctionRef},
    value::{Tuple, Value},
};

/// Key looked up in the globals at definition time to find the defining module.
pub const MODULE_NAME_KEY: &str = "__name__";

/// A user-defined function: the result of executing a `def` statement.
///
/// Function objects and code objects are different things. The code is the compiled
/// body, shared by every function created from the same `def`; the function adds the
/// per-definition state (globals, defaults, closure cells) and the metadata program
/// code can rewrite through attributes.
///
/// # Closure arity
///
/// `closure` must hold exactly one cell per name in `code.freevars()`. Construction
/// checks this with a debug assertion only, since functions are built by the
/// evaluator. The `__code__` setter and [`FunctionRef::set_closure`] check it at
/// runtime and reject mismatches with `ValueError`.
#[derive(Debug)]
pub(crate) struct Function {
    /// The `__code__` attribute.
    pub code: Rc<Code>,
    /// Globals of the defining module, shared with the module itself.
    pub globals: Dict,
    /// The `__defaults__` attribute, or `None` when there are no positional defaults.
    pub defaults: Option<Tuple>,
    /// The `__kwdefaults__` attribute.
    pub kw_defaults: Option<Dict>,
    /// Captured cells, one per free variable of `code`.
    pub closure: Option<Rc<[Cell]>>,
    /// The `__doc__` attribute, can be anything.
    pub doc: Value,
    /// The `__name__` attribute.
    pub name: String,
    /// Qualified name (e.g., `Outer.<locals>.inner` or `Class.method`).
    pub qualname: String,
    /// The `__module__` attribute, can be anything.
    pub module: Value,
    /// The `__dict__` attribute; `None` until something is stored in it.
    pub dict: Option<Dict>,
    /// The `__annotations__` attribute.
    pub annotations: Option<Dict>,
}

impl Function {
    /// Number of closure cells currently held (0 when there is no closure).
    pub fn closure_len(&self) -> usize {
        self.closure.as_ref().map_or(0, |cells| cells.len())
    }
}

/// A shared handle to a function object.
///
/// Functions are referenced from module namespaces, enclosing scopes, class bodies
/// and bound methods at once; every holder sees the same mutable state. Cloning the
/// handle never copies the function.
#[derive(Clone)]
pub struct FunctionRef(Rc<RefCell<Function>>);

impl FunctionRef {
    /// Creates a function for `code` defined in a module with the given globals.
    ///
    /// - `__doc__` is the first constant of `code` when that constant is a string,
    ///   otherwise `None`.
    /// - `__module__` is `globals["__name__"]` if present, otherwise `None`.
    /// - `__qualname__` is `qualname`, or the code name when `qualname` is empty.
    ///
    /// Defaults, keyword defaults, closure, `__dict__` and annotations start out absent.
    #[must_use]
    pub fn new(code: Rc<Code>, globals: Dict, qualname: &str) -> Self {
        let doc = match code.consts().first() {
            Some(first @ Value::Str(_)) => first.clone(),
            _ => Value::None,
        };
        let module = globals.get(MODULE_NAME_KEY).unwrap_or(Value::None);
        let name = code.name().to_owned();
        let qualname = if qualname.is_empty() {
            name.clone()
        } else {
            qualname.to_owned()
        };
        Self(Rc::new(RefCell::new(Function {
            code,
            globals,
            defaults: None,
            kw_defaults: None,
            closure: None,
            doc,
            name,
            qualname,
            module,
            dict: None,
            annotations: None,
        })))
    }

    /// Creates a closure: a function that captures `closure` cells from its enclosing scope.
    ///
    /// The caller guarantees one cell per free variable of `code`.
    #[must_use]
    pub fn new_closure(code: Rc<Code>, globals: Dict, qualname: &str, closure: Rc<[Cell]>) -> Self {
        debug_assert_eq!(
            code.free_var_count(),
            closure.len(),
            "closure cells must match the code's free variables"
        );
        let func = Self::new(code, globals, qualname);
        if !closure.is_empty() {
            func.borrow_mut().closure = Some(closure);
        }
        func
    }

    /// Calls the function.
    ///
    /// Packages the code, globals, a fresh empty locals dict, the arguments, and the
    /// current defaults, keyword defaults and closure into an [`EvalRequest`] and runs
    /// it on `evaluator`. No argument checking happens here, and any error from the
    /// evaluator is returned as-is. The function itself is not modified.
    pub fn call(&self, evaluator: &mut impl Evaluator, args: Vec<Value>, kwargs: StringDict) -> RunResult<Value> {
        self.call_observed(evaluator, &mut NoopObserver, args, kwargs)
    }

    /// Like [`FunctionRef::call`], reporting entry and exit to `calls`.
    ///
    /// `calls` is passed on to the evaluator, which uses it for the calls it makes itself.
    pub fn call_observed(
        &self,
        evaluator: &mut impl Evaluator,
        calls: &mut dyn CallObserver,
        args: Vec<Value>,
        kwargs: StringDict,
    ) -> RunResult<Value> {
        // the borrow must end before evaluation: the body may read or rewrite this function
        let request = {
            let f = self.borrow();
            calls.enter_call(&f.qualname);
            EvalRequest {
                code: Rc::clone(&f.code),
                globals: f.globals.clone(),
                locals: Dict::new(),
                args,
                kwargs,
                defaults: f.defaults.clone(),
                kw_defaults: f.kw_defaults.clone(),
                closure: f.closure.clone(),
            }
        };
        let result = evaluator.evaluate(request, calls);
        calls.exit_call(result.is_ok());
        result
    }

    /// Implements `function.__get__(instance, owner)`.
    ///
    /// Reading the function through the owning type itself (`instance` is `None`)
    /// returns the function unchanged; reading it through an instance returns a bound
    /// method that supplies `instance` as the first argument.
    #[must_use]
    pub fn bind(&self, instance: &Value, _owner: &Value) -> Value {
        if instance.is_none() {
            Value::Function(self.clone())
        } else {
            Value::BoundMethod(Rc::new(BoundMethod::new(self.clone(), instance.clone())))
        }
    }

    /// Looks up an attribute: the descriptor table first, then `__dict__`.
    pub fn get_attr(&self, name: &str) -> RunResult<Value> {
        if let Some(descr) = descriptor::lookup(name) {
            return Ok(descr.get(self));
        }
        self.borrow()
            .dict
            .as_ref()
            .and_then(|dict| dict.get(name))
            .ok_or_else(|| ExcType::attribute_error(Type::Function, name))
    }

    /// Assigns an attribute.
    ///
    /// Names in the descriptor table go through their validating setter; anything else
    /// is stored in `__dict__`, which is created on first use.
    pub fn set_attr(&self, name: &str, value: Value) -> RunResult<()> {
        if let Some(descr) = descriptor::lookup(name) {
            return descr.set(self, value);
        }
        let mut f = self.borrow_mut();
        f.dict.get_or_insert_with(Dict::new).set(name, value);
        Ok(())
    }

    /// Deletes an attribute, raising `AttributeError` if it cannot be deleted or does not exist.
    pub fn del_attr(&self, name: &str) -> RunResult<()> {
        if let Some(descr) = descriptor::lookup(name) {
            return descr.delete(self);
        }
        let removed = self.borrow().dict.as_ref().and_then(|dict| dict.remove(name));
        match removed {
            Some(_) => Ok(()),
            None => Err(ExcType::attribute_error(Type::Function, name)),
        }
    }

    /// Replaces the closure, enforcing one cell per free variable.
    ///
    /// An empty slice and `None` both mean "no closure".
    pub fn set_closure(&self, closure: Option<Rc<[Cell]>>) -> RunResult<()> {
        let mut f = self.borrow_mut();
        let given = closure.as_ref().map_or(0, |cells| cells.len());
        let expected = f.code.free_var_count();
        if given != expected {
            return Err(ExcType::value_error(format!(
                "{}() requires a closure of {expected} cells, not {given}",
                f.name
            )));
        }
        f.closure = closure.filter(|cells| !cells.is_empty());
        Ok(())
    }

    /// Sets positional defaults directly (the evaluator's `MAKE_FUNCTION` path).
    pub fn set_defaults(&self, defaults: Option<Tuple>) {
        self.borrow_mut().defaults = defaults;
    }

    /// Sets keyword-only defaults directly.
    pub fn set_kw_defaults(&self, kw_defaults: Option<Dict>) {
        self.borrow_mut().kw_defaults = kw_defaults;
    }

    /// Sets annotations directly.
    pub fn set_annotations(&self, annotations: Option<Dict>) {
        self.borrow_mut().annotations = annotations;
    }

    #[must_use]
    pub fn code(&self) -> Rc<Code> {
        Rc::clone(&self.borrow().code)
    }

    #[must_use]
    pub fn globals(&self) -> Dict {
        self.borrow().globals.clone()
    }

    #[must_use]
    pub fn defaults(&self) -> Option<Tuple> {
        self.borrow().defaults.clone()
    }

    #[must_use]
    pub fn kw_defaults(&self) -> Option<Dict> {
        self.borrow().kw_defaults.clone()
    }

    #[must_use]
    pub fn closure(&self) -> Option<Rc<[Cell]>> {
        self.borrow().closure.clone()
    }

    #[must_use]
    pub fn doc(&self) -> Value {
        self.borrow().doc.clone()
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.borrow().name.clone()
    }

    #[must_use]
    pub fn qualname(&self) -> String {
        self.borrow().qualname.clone()
    }

    #[must_use]
    pub fn module(&self) -> Value {
        self.borrow().module.clone()
    }

    #[must_use]
    pub fn dict(&self) -> Option<Dict> {
        self.borrow().dict.clone()
    }

    #[must_use]
    pub fn annotations(&self) -> Option<Dict> {
        self.borrow().annotations.clone()
    }

    /// Creates a weak reference that does not keep the function alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakFunctionRef {
        WeakFunctionRef::new(Rc::downgrade(&self.0))
    }

    /// Number of live weak references to this function.
    #[must_use]
    pub fn weakref_count(&self) -> usize {
        Rc::weak_count(&self.0)
    }

    /// Returns whether both handles refer to the same function (`is`).
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address-based identity, as shown in the repr.
    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub(crate) fn from_rc(inner: Rc<RefCell<Function>>) -> Self {
        Self(inner)
    }

    pub(crate) fn borrow(&self) -> Ref<'_, Function> {
        self.0.borrow()
    }

    pub(crate) fn borrow_mut(&self) -> RefMut<'_, Function> {
        self.0.borrow_mut()
    }
}

/// Python repr: `<function qualname at 0x...>`.
impl fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {} at 0x{:x}>", self.borrow().qualname, self.id())
    }
}

impl fmt::Debug for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
