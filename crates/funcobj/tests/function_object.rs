//! Tests for constructing and calling function objects.
//!
//! Calls are checked against closure evaluators that record the `EvalRequest` they
//! receive, so each test can assert exactly what a call forwards.

use std::{cell::RefCell, rc::Rc};

use funcobj::{Cell, Code, Dict, EvalRequest, ExcType, FunctionRef, RunResult, SimpleException, StringDict, Value};
use pretty_assertions::assert_eq;

fn add_code() -> Rc<Code> {
    Rc::new(Code::new("add").with_consts(vec![Value::str("adds two numbers"), Value::Int(1)]))
}

fn mathmod_globals() -> Dict {
    Dict::from_pairs([("__name__", Value::str("mathmod"))])
}

// =============================================================================
// 1. Construction
// =============================================================================

/// The documented end-to-end scenario: metadata is derived from code and globals.
#[test]
fn construct_add_scenario() {
    let f = FunctionRef::new(add_code(), mathmod_globals(), "");
    assert_eq!(f.name(), "add");
    assert_eq!(f.qualname(), "add");
    assert_eq!(f.doc(), Value::str("adds two numbers"));
    assert_eq!(f.module(), Value::str("mathmod"));
    assert!(f.closure().is_none());
    assert!(f.defaults().is_none());
    assert!(f.kw_defaults().is_none());
    assert!(f.dict().is_none());
    assert!(f.annotations().is_none());
}

/// A non-empty qualname is kept as given; the name still comes from the code.
#[test]
fn construct_with_qualname() {
    let f = FunctionRef::new(add_code(), mathmod_globals(), "Calc.add");
    assert_eq!(f.name(), "add");
    assert_eq!(f.qualname(), "Calc.add");
}

/// A non-string first constant does not become the docstring.
#[test]
fn construct_non_string_first_const_has_no_doc() {
    let code = Rc::new(Code::new("f").with_consts(vec![Value::Int(3), Value::str("later")]));
    let f = FunctionRef::new(code, Dict::new(), "");
    assert_eq!(f.doc(), Value::None);
}

/// Code with no constants at all yields `__doc__ = None`.
#[test]
fn construct_no_consts_has_no_doc() {
    let f = FunctionRef::new(Rc::new(Code::new("f")), Dict::new(), "");
    assert_eq!(f.doc(), Value::None);
}

/// Without `__name__` in globals the module is `None`.
#[test]
fn construct_without_module_name() {
    let f = FunctionRef::new(add_code(), Dict::new(), "");
    assert_eq!(f.module(), Value::None);
}

/// `__module__` is whatever value `__name__` holds, not necessarily a string.
#[test]
fn construct_module_any_value() {
    let globals = Dict::from_pairs([("__name__", Value::Int(7))]);
    let f = FunctionRef::new(add_code(), globals, "");
    assert_eq!(f.module(), Value::Int(7));
}

/// Globals are shared with the defining module, not copied.
#[test]
fn globals_are_shared() {
    let globals = mathmod_globals();
    let f = FunctionRef::new(add_code(), globals.clone(), "");
    globals.set("counter", Value::Int(1));
    assert!(f.globals().ptr_eq(&globals));
    assert_eq!(f.globals().get("counter"), Some(Value::Int(1)));
}

/// One code object can back several independent functions.
#[test]
fn one_code_many_functions() {
    let code = add_code();
    let a = FunctionRef::new(Rc::clone(&code), Dict::new(), "");
    let b = FunctionRef::new(Rc::clone(&code), Dict::new(), "");
    assert!(!a.ptr_eq(&b));
    assert!(Rc::ptr_eq(&a.code(), &b.code()));
    a.set_attr("__name__", Value::str("renamed")).unwrap();
    assert_eq!(b.name(), "add");
}

/// Closures keep the exact cells they were given.
#[test]
fn construct_closure_shares_cells() {
    let code = Rc::new(Code::new("inner").with_freevars(["x"]));
    let cell = Cell::new(Value::Int(1));
    let f = FunctionRef::new_closure(code, Dict::new(), "outer.<locals>.inner", Rc::from([cell.clone()]));
    cell.set(Value::Int(2));
    let closure = f.closure().unwrap();
    assert_eq!(closure.len(), 1);
    assert!(closure[0].ptr_eq(&cell));
    assert_eq!(closure[0].get(), Some(Value::Int(2)));
}

/// The repr uses the qualified name.
#[test]
fn repr_uses_qualname() {
    let f = FunctionRef::new(add_code(), Dict::new(), "Calc.add");
    let repr = f.to_string();
    assert!(repr.starts_with("<function Calc.add at 0x"), "{repr}");
}

// =============================================================================
// 2. Calling
// =============================================================================

/// The documented call scenario: exactly the function's state is forwarded.
#[test]
fn call_forwards_request() {
    let globals = mathmod_globals();
    let code = add_code();
    let f = FunctionRef::new(Rc::clone(&code), globals.clone(), "");
    let seen: RefCell<Option<EvalRequest>> = RefCell::new(None);

    let mut evaluator = |request: EvalRequest| -> RunResult<Value> {
        *seen.borrow_mut() = Some(request);
        Ok(Value::Int(5))
    };
    let result = f.call(&mut evaluator, vec![Value::Int(2), Value::Int(3)], StringDict::new());
    assert_eq!(result, Ok(Value::Int(5)));

    let request = seen.into_inner().unwrap();
    assert!(Rc::ptr_eq(&request.code, &code));
    assert!(request.globals.ptr_eq(&globals));
    assert!(request.locals.is_empty());
    assert_eq!(request.args, vec![Value::Int(2), Value::Int(3)]);
    assert!(request.kwargs.is_empty());
    assert!(request.defaults.is_none());
    assert!(request.kw_defaults.is_none());
    assert!(request.closure.is_none());
}

/// Defaults, keyword defaults and closure are passed as the function holds them now.
#[test]
fn call_passes_current_defaults_and_closure() {
    let code = Rc::new(Code::new("g").with_freevars(["y"]));
    let cell = Cell::new(Value::Int(10));
    let f = FunctionRef::new_closure(code, Dict::new(), "", Rc::from([cell.clone()]));
    let kw = Dict::from_pairs([("scale", Value::Int(2))]);
    f.set_attr("__defaults__", Value::tuple([Value::Int(1)])).unwrap();
    f.set_attr("__kwdefaults__", Value::Dict(kw.clone())).unwrap();

    let mut captured = None;
    let mut evaluator = |request: EvalRequest| -> RunResult<Value> {
        captured = Some(request);
        Ok(Value::None)
    };
    let mut kwargs = StringDict::new();
    kwargs.insert("scale".to_owned(), Value::Int(3));
    f.call(&mut evaluator, vec![], kwargs).unwrap();

    let request = captured.unwrap();
    assert_eq!(request.defaults.as_deref(), Some(&[Value::Int(1)][..]));
    assert!(request.kw_defaults.unwrap().ptr_eq(&kw));
    assert!(request.closure.unwrap()[0].ptr_eq(&cell));
    assert_eq!(request.kwargs.get("scale"), Some(&Value::Int(3)));
}

/// Every call gets its own fresh locals dict.
#[test]
fn call_uses_fresh_locals() {
    let f = FunctionRef::new(add_code(), Dict::new(), "");
    let mut seen: Vec<Dict> = Vec::new();
    let mut evaluator = |request: EvalRequest| -> RunResult<Value> {
        request.locals.set("tmp", Value::Int(1));
        seen.push(request.locals);
        Ok(Value::None)
    };
    f.call(&mut evaluator, vec![], StringDict::new()).unwrap();
    f.call(&mut evaluator, vec![], StringDict::new()).unwrap();
    assert_eq!(seen.len(), 2);
    assert!(!seen[0].ptr_eq(&seen[1]));
}

/// Evaluator errors come back byte-for-byte unchanged.
#[test]
fn call_propagates_evaluator_error() {
    let f = FunctionRef::new(add_code(), Dict::new(), "");
    let raised: funcobj::RunError = SimpleException::new_msg(ExcType::ZeroDivisionError, "division by zero").into();
    let expected = raised.clone();
    let mut evaluator = move |_request: EvalRequest| -> RunResult<Value> { Err(raised.clone()) };
    let err = f.call(&mut evaluator, vec![Value::Int(1)], StringDict::new()).unwrap_err();
    assert_eq!(err, expected);
}

/// Calling does not touch any of the function's fields.
#[test]
fn call_leaves_function_unchanged() {
    let f = FunctionRef::new(add_code(), mathmod_globals(), "");
    f.set_attr("__defaults__", Value::tuple([Value::Int(0)])).unwrap();
    let mut evaluator = |_request: EvalRequest| -> RunResult<Value> { Ok(Value::None) };
    f.call(&mut evaluator, vec![Value::Int(1)], StringDict::new()).unwrap();
    assert_eq!(f.get_attr("__defaults__").unwrap(), Value::tuple([Value::Int(0)]));
    assert_eq!(f.name(), "add");
    assert_eq!(f.globals().len(), 1);
}

/// The evaluator may call back into the same function recursively.
#[test]
fn call_reentrant_recursion() {
    struct Countdown {
        calls: usize,
    }

    impl funcobj::Evaluator for Countdown {
        fn evaluate(&mut self, request: EvalRequest, calls: &mut dyn funcobj::CallObserver) -> RunResult<Value> {
            self.calls += 1;
            let Some(Value::Int(n)) = request.args.first().cloned() else {
                return Err(ExcType::type_error("expected an int"));
            };
            if n == 0 {
                return Ok(Value::Int(0));
            }
            let Some(Value::Function(me)) = request.globals.get("countdown") else {
                return Err(ExcType::type_error("countdown missing"));
            };
            me.call_observed(self, calls, vec![Value::Int(n - 1)], StringDict::new())
        }
    }

    let globals = Dict::new();
    let f = FunctionRef::new(Rc::new(Code::new("countdown")), globals.clone(), "");
    globals.set("countdown", Value::Function(f.clone()));

    let mut evaluator = Countdown { calls: 0 };
    let result = f.call(&mut evaluator, vec![Value::Int(5)], StringDict::new());
    assert_eq!(result, Ok(Value::Int(0)));
    assert_eq!(evaluator.calls, 6);
}

/// The evaluator may rewrite the function's attributes while it is running.
#[test]
fn call_body_may_mutate_function() {
    let globals = Dict::new();
    let f = FunctionRef::new(add_code(), globals.clone(), "");
    globals.set("add", Value::Function(f.clone()));
    let mut evaluator = |request: EvalRequest| -> RunResult<Value> {
        let Some(Value::Function(me)) = request.globals.get("add") else {
            return Err(ExcType::type_error("missing"));
        };
        me.set_attr("calls", Value::Int(1))?;
        Ok(Value::None)
    };
    f.call(&mut evaluator, vec![], StringDict::new()).unwrap();
    assert_eq!(f.get_attr("calls").unwrap(), Value::Int(1));
}

/// Non-callable values raise `TypeError` through `Value::call`.
#[test]
fn value_call_not_callable() {
    let mut evaluator = |_request: EvalRequest| -> RunResult<Value> { Ok(Value::None) };
    assert!(!Value::Int(3).is_callable());
    assert!(Value::Function(FunctionRef::new(add_code(), Dict::new(), "")).is_callable());
    let err = Value::Int(3)
        .call(&mut evaluator, vec![], StringDict::new())
        .unwrap_err();
    assert_eq!(err.exc_type(), Some(ExcType::TypeError));
    assert_eq!(err.message(), Some("'int' object is not callable"));
}

// =============================================================================
// 3. Closures and weak references
// =============================================================================

/// `set_closure` enforces one cell per free variable.
#[test]
fn set_closure_checks_arity() {
    let code = Rc::new(Code::new("inner").with_freevars(["a", "b"]));
    let f = FunctionRef::new(code, Dict::new(), "");
    let err = f.set_closure(Some(Rc::from([Cell::empty()]))).unwrap_err();
    assert_eq!(err.exc_type(), Some(ExcType::ValueError));
    assert!(f.closure().is_none());

    f.set_closure(Some(Rc::from([Cell::empty(), Cell::empty()]))).unwrap();
    assert_eq!(f.closure().map(|c| c.len()), Some(2));
}

/// Weak references observe the function without keeping it alive.
#[test]
fn weakref_lifecycle() {
    let f = FunctionRef::new(add_code(), Dict::new(), "");
    let weak = f.downgrade();
    assert_eq!(f.weakref_count(), 1);
    assert!(weak.is_alive());
    assert!(weak.upgrade().unwrap().ptr_eq(&f));

    drop(f);
    assert!(!weak.is_alive());
    assert!(weak.upgrade().is_none());
}

/// The host setters used when a definition is evaluated fill the optional slots directly.
#[test]
fn host_setters_fill_optional_slots() {
    let f = FunctionRef::new(add_code(), Dict::new(), "");
    f.set_defaults(Some(Rc::from([Value::Int(1), Value::Int(2)])));
    f.set_kw_defaults(Some(Dict::from_pairs([("step", Value::Int(3))])));
    f.set_annotations(Some(Dict::from_pairs([("return", Value::str("int"))])));

    assert_eq!(f.get_attr("__defaults__").unwrap(), Value::tuple([Value::Int(1), Value::Int(2)]));
    assert_eq!(f.kw_defaults().and_then(|d| d.get("step")), Some(Value::Int(3)));
    assert_eq!(f.get_attr("__annotations__").unwrap().py_type(), funcobj::Type::Dict);

    f.set_defaults(None);
    assert_eq!(f.get_attr("__defaults__").unwrap(), Value::None);
}
