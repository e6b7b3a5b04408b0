use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    cycle,
    evaluator::{CallObserver, Evaluator, NoopObserver},
    exception::{ExcType, RunResult},
    function::FunctionRef,
    types::{BoundMethod, Cell, Code, Dict, StringDict, Type},
};

/// An immutable ordered sequence (Python `tuple`).
pub type Tuple = Rc<[Value]>;

/// The dynamic value type exchanged between function objects, the evaluator and the host.
///
/// Scalars and tuples are plain data. `List`, `Dict`, `Cell`, `Function` and
/// `BoundMethod` are reference types: cloning the `Value` clones the handle.
///
/// Equality follows Python's `==`: structural for data types, identity (`is`) for
/// cells and functions. Two bound methods are equal when they wrap the same function
/// and their receivers are identical, so binding twice to one instance compares equal.
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Tuple(Tuple),
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Dict),
    Code(Rc<Code>),
    Cell(Cell),
    Function(FunctionRef),
    BoundMethod(Rc<BoundMethod>),
}

impl Value {
    /// Convenience constructor for string values.
    #[must_use]
    pub fn str(s: &str) -> Self {
        Self::Str(Rc::from(s))
    }

    /// Convenience constructor for tuple values.
    #[must_use]
    pub fn tuple(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Tuple(items.into_iter().collect())
    }

    /// Convenience constructor for list values.
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::List(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    #[must_use]
    pub fn py_type(&self) -> Type {
        match self {
            Self::None => Type::NoneType,
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::Str(_) => Type::Str,
            Self::Tuple(_) => Type::Tuple,
            Self::List(_) => Type::List,
            Self::Dict(_) => Type::Dict,
            Self::Code(_) => Type::Code,
            Self::Cell(_) => Type::Cell,
            Self::Function(_) => Type::Function,
            Self::BoundMethod(_) => Type::Method,
        }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns the string contents if this is a `str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Snapshots an ordered sequence (`tuple` or `list`) as a tuple.
    ///
    /// Tuples are shared, lists are copied so later list mutation does not leak in.
    #[must_use]
    pub fn to_tuple(&self) -> Option<Tuple> {
        match self {
            Self::Tuple(items) => Some(Rc::clone(items)),
            Self::List(items) => Some(items.borrow().iter().cloned().collect()),
            _ => None,
        }
    }

    /// Calls this value with the given arguments.
    ///
    /// Functions delegate to the evaluator and bound methods prepend their receiver.
    /// Any other value raises `TypeError: '<type>' object is not callable`.
    pub fn call(&self, evaluator: &mut impl Evaluator, args: Vec<Self>, kwargs: StringDict) -> RunResult<Self> {
        self.call_observed(evaluator, &mut NoopObserver, args, kwargs)
    }

    /// Like [`Value::call`], reporting the call to `calls`.
    pub fn call_observed(
        &self,
        evaluator: &mut impl Evaluator,
        calls: &mut dyn CallObserver,
        args: Vec<Self>,
        kwargs: StringDict,
    ) -> RunResult<Self> {
        match self {
            Self::Function(func) => func.call_observed(evaluator, calls, args, kwargs),
            Self::BoundMethod(method) => method.call_observed(evaluator, calls, args, kwargs),
            other => Err(ExcType::type_error_not_callable(other.py_type())),
        }
    }

    /// Python's `is`.
    ///
    /// Reference types compare by address. Immutable scalars compare by value, the way
    /// an interpreter with interned small values would report them.
    #[must_use]
    pub fn is_identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => Rc::ptr_eq(a, b),
            (Self::Tuple(a), Self::Tuple(b)) => Rc::ptr_eq(a, b),
            (Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b),
            (Self::Dict(a), Self::Dict(b)) => a.ptr_eq(b),
            (Self::Code(a), Self::Code(b)) => Rc::ptr_eq(a, b),
            (Self::Cell(a), Self::Cell(b)) => a.ptr_eq(b),
            (Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
            (Self::BoundMethod(a), Self::BoundMethod(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Returns whether this value supports [`Value::call`].
    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_) | Self::BoundMethod(_))
    }
}

impl PartialEq for Value {
    #[expect(clippy::float_cmp, reason = "Python float equality is exact")]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                Rc::ptr_eq(a, b)
                    || cycle::eq_guard(Rc::as_ptr(a) as usize, Rc::as_ptr(b) as usize, || {
                        *a.borrow() == *b.borrow()
                    })
            }
            (Self::Dict(a), Self::Dict(b)) => a == b,
            (Self::Code(a), Self::Code(b)) => Rc::ptr_eq(a, b) || a == b,
            (Self::Cell(a), Self::Cell(b)) => a.ptr_eq(b),
            (Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
            (Self::BoundMethod(a), Self::BoundMethod(b)) => {
                a.func().ptr_eq(b.func()) && a.self_arg().is_identical(b.self_arg())
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Tuple(items) => {
                let mut t = f.debug_tuple("");
                for item in items.iter() {
                    t.field(item);
                }
                t.finish()
            }
            Self::List(items) => {
                match cycle::repr_guard(Rc::as_ptr(items) as usize, || {
                    f.debug_list().entries(items.borrow().iter()).finish()
                }) {
                    Some(result) => result,
                    None => f.write_str("[...]"),
                }
            }
            Self::Dict(dict) => fmt::Debug::fmt(dict, f),
            Self::Code(code) => write!(f, "<code object {} at 0x{:x}>", code.name(), Rc::as_ptr(code) as usize),
            Self::Cell(cell) => fmt::Debug::fmt(cell, f),
            Self::Function(func) => fmt::Display::fmt(func, f),
            Self::BoundMethod(method) => fmt::Display::fmt(method, f),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::str(value)
    }
}

impl From<Dict> for Value {
    fn from(value: Dict) -> Self {
        Self::Dict(value)
    }
}

impl From<FunctionRef> for Value {
    fn from(value: FunctionRef) -> Self {
        Self::Function(value)
    }
}
