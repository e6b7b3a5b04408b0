//! Tests for `function.__get__` and bound methods.

use std::rc::Rc;

use funcobj::{Code, Dict, EvalRequest, ExcType, FunctionRef, RunResult, StringDict, Value};
use pretty_assertions::assert_eq;

/// Evaluator that returns its positional arguments as a tuple.
fn echo_args(request: EvalRequest) -> RunResult<Value> {
    Ok(Value::tuple(request.args))
}

fn method_fn() -> FunctionRef {
    FunctionRef::new(Rc::new(Code::new("area")), Dict::new(), "Shape.area")
}

/// Reading through the owner itself returns the very same function.
#[test]
fn bind_without_instance_is_identity() {
    let f = method_fn();
    let owner = Value::str("Shape");
    let Value::Function(got) = f.bind(&Value::None, &owner) else {
        panic!("expected the function itself");
    };
    assert!(got.ptr_eq(&f));
}

/// Reading through an instance yields a bound method pairing the two.
#[test]
fn bind_with_instance_makes_method() {
    let f = method_fn();
    let instance = Value::Int(7);
    let Value::BoundMethod(method) = f.bind(&instance, &Value::None) else {
        panic!("expected a bound method");
    };
    assert!(method.func().ptr_eq(&f));
    assert_eq!(method.self_arg(), &instance);
    assert_eq!(method.get_attr("__self__").unwrap(), instance);
    assert_eq!(method.get_attr("__func__").unwrap(), Value::Function(f));
}

/// Each bind produces a fresh bound method, but binds to the same instance compare equal.
#[test]
fn bind_twice_equal_methods() {
    let f = method_fn();
    let instance = Value::list([Value::Int(1)]);
    let a = f.bind(&instance, &Value::None);
    let b = f.bind(&instance, &Value::None);
    assert!(!a.is_identical(&b));
    assert_eq!(a, b);
}

/// Bound methods differ when the receivers are distinct objects, even if equal in value.
#[test]
fn bind_distinct_receivers_not_equal() {
    let f = method_fn();
    let a = f.bind(&Value::list([Value::Int(1)]), &Value::None);
    let b = f.bind(&Value::list([Value::Int(1)]), &Value::None);
    assert_ne!(a, b);

    let other = FunctionRef::new(Rc::new(Code::new("area")), Dict::new(), "Shape.area");
    let instance = Value::Int(1);
    assert_ne!(f.bind(&instance, &Value::None), other.bind(&instance, &Value::None));
}

/// Calling `m(a, b)` is the same as calling `f(instance, a, b)`.
#[test]
fn bound_call_prepends_instance() {
    let f = method_fn();
    let instance = Value::str("self");
    let method = f.bind(&instance, &Value::None);

    let mut evaluator = echo_args;
    let via_method = method
        .call(&mut evaluator, vec![Value::Int(1), Value::Int(2)], StringDict::new())
        .unwrap();
    let direct = f
        .call(&mut evaluator, vec![instance, Value::Int(1), Value::Int(2)], StringDict::new())
        .unwrap();
    assert_eq!(via_method, direct);
    assert_eq!(
        via_method,
        Value::tuple([Value::str("self"), Value::Int(1), Value::Int(2)])
    );
}

/// Keyword arguments pass through a bound method untouched.
#[test]
fn bound_call_forwards_kwargs() {
    let f = method_fn();
    let Value::BoundMethod(method) = f.bind(&Value::Int(0), &Value::None) else {
        panic!("expected a bound method");
    };
    let mut seen = None;
    let mut evaluator = |request: EvalRequest| -> RunResult<Value> {
        seen = Some(request.kwargs);
        Ok(Value::None)
    };
    let mut kwargs = StringDict::new();
    kwargs.insert("unit".to_owned(), Value::str("cm"));
    method.call(&mut evaluator, vec![], kwargs.clone()).unwrap();
    assert_eq!(seen, Some(kwargs));
}

/// Evaluator failures surface unchanged through a bound method.
#[test]
fn bound_call_propagates_error() {
    let method = method_fn().bind(&Value::Int(0), &Value::None);
    let mut evaluator = |_request: EvalRequest| -> RunResult<Value> { Err(ExcType::value_error("bad shape")) };
    let err = method
        .call(&mut evaluator, vec![], StringDict::new())
        .unwrap_err();
    assert_eq!(err, ExcType::value_error("bad shape"));
}

/// Other attributes of a bound method come from the function.
#[test]
fn bound_method_delegates_attrs() {
    let f = method_fn();
    f.set_attr("tag", Value::Int(9)).unwrap();
    let Value::BoundMethod(method) = f.bind(&Value::Int(0), &Value::None) else {
        panic!("expected a bound method");
    };
    assert_eq!(method.get_attr("__name__").unwrap(), Value::str("area"));
    assert_eq!(method.get_attr("tag").unwrap(), Value::Int(9));
    assert!(method.get_attr("missing").is_err());
}

/// The repr names the function's qualname.
#[test]
fn bound_method_repr() {
    let method = method_fn().bind(&Value::Int(3), &Value::None);
    assert_eq!(format!("{method:?}"), "<bound method Shape.area of 3>");
}
