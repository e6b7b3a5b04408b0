//! Attribute descriptors for function objects.
//!
//! Every named attribute of a function (`__code__`, `__defaults__`, `__name__`, ...)
//! is served by one [`Descriptor`]: a getter plus an optional setter and deleter.
//! The table is built once, on first use, and is the only dispatch point for these
//! names; anything else goes to the function's `__dict__`.
//!
//! Setters check the shape of the incoming value before touching the function, so a
//! rejected assignment leaves the function exactly as it was:
//!
//! | Attribute | Accepts | Delete |
//! |-----------|---------|--------|
//! | `__code__` | code object with one free var per closure cell | not allowed |
//! | `__defaults__` | tuple or list | clears |
//! | `__kwdefaults__` | dict | clears |
//! | `__annotations__` | dict | clears |
//! | `__dict__` | dict | clears |
//! | `__name__` | str | not allowed |
//! | `__qualname__` | str | not allowed |
//! | `__doc__` | anything | resets to `None` |
//! | `__module__` | anything | resets to `None` |
//! | `__globals__` | read-only | read-only |
//! | `__closure__` | read-only | read-only |

use std::sync::LazyLock;

use ahash::AHashMap;

use crate::{
    exception::{ExcType, RunResult},
    function::{Function, FunctionRef},
    types::Dict,
    value::Value,
};

type Getter = fn(&Function) -> Value;
type Setter = fn(&mut Function, Value) -> RunResult<()>;
type Deleter = fn(&mut Function);

/// Accessor for one named attribute of a function object.
#[derive(Clone, Copy)]
pub struct Descriptor {
    name: &'static str,
    fget: Getter,
    fset: Option<Setter>,
    fdel: Option<Deleter>,
}

impl Descriptor {
    const fn new(name: &'static str, fget: Getter, fset: Option<Setter>, fdel: Option<Deleter>) -> Self {
        Self {
            name,
            fget,
            fset,
            fdel,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.fset.is_some()
    }

    #[must_use]
    pub fn is_deletable(&self) -> bool {
        self.fdel.is_some()
    }

    /// Reads the attribute. Absent optional fields read back as `None`.
    #[must_use]
    pub fn get(&self, func: &FunctionRef) -> Value {
        (self.fget)(&func.borrow())
    }

    /// Assigns the attribute.
    ///
    /// Raises `AttributeError` for read-only attributes, `TypeError` when the value has
    /// the wrong type, and `ValueError` when a code object's free variables do not match
    /// the closure.
    pub fn set(&self, func: &FunctionRef, value: Value) -> RunResult<()> {
        let Some(fset) = self.fset else {
            return Err(ExcType::attribute_error_readonly());
        };
        fset(&mut func.borrow_mut(), value)
    }

    /// Deletes the attribute. Deleting an already-absent field is not an error.
    pub fn delete(&self, func: &FunctionRef) -> RunResult<()> {
        match (self.fdel, self.fset) {
            (Some(fdel), _) => {
                fdel(&mut func.borrow_mut());
                Ok(())
            }
            (None, Some(_)) => Err(ExcType::attribute_error_cannot_delete(self.name)),
            (None, None) => Err(ExcType::attribute_error_readonly()),
        }
    }
}

impl std::fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .field("writable", &self.is_writable())
            .field("deletable", &self.is_deletable())
            .finish()
    }
}

/// Returns the descriptor for `name`, if functions define one.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static Descriptor> {
    FUNCTION_DESCRIPTORS.get(name)
}

/// Names of all attributes served by descriptors, in definition order.
pub fn names() -> impl Iterator<Item = &'static str> {
    DESCRIPTORS.iter().map(Descriptor::name)
}

static FUNCTION_DESCRIPTORS: LazyLock<AHashMap<&'static str, Descriptor>> =
    LazyLock::new(|| DESCRIPTORS.iter().map(|d| (d.name, *d)).collect());

static DESCRIPTORS: [Descriptor; 11] = [
    Descriptor::new("__code__", get_code, Some(set_code), None),
    Descriptor::new("__defaults__", get_defaults, Some(set_defaults), Some(del_defaults)),
    Descriptor::new("__kwdefaults__", get_kw_defaults, Some(set_kw_defaults), Some(del_kw_defaults)),
    Descriptor::new("__annotations__", get_annotations, Some(set_annotations), Some(del_annotations)),
    Descriptor::new("__dict__", get_dict, Some(set_dict), Some(del_dict)),
    Descriptor::new("__name__", get_name, Some(set_name), None),
    Descriptor::new("__qualname__", get_qualname, Some(set_qualname), None),
    Descriptor::new("__doc__", get_doc, Some(set_doc), Some(del_doc)),
    Descriptor::new("__module__", get_module, Some(set_module), Some(del_module)),
    Descriptor::new("__globals__", get_globals, None, None),
    Descriptor::new("__closure__", get_closure, None, None),
];

fn get_code(f: &Function) -> Value {
    Value::Code(f.code.clone())
}

fn set_code(f: &mut Function, value: Value) -> RunResult<()> {
    let code = match value {
        Value::Code(code) => code,
        other => return Err(ExcType::type_error_attr_kind("__code__", "a code object", other.py_type())),
    };
    let nfree = code.free_var_count();
    let nclosure = f.closure_len();
    if nfree != nclosure {
        return Err(ExcType::value_error_free_vars(&f.name, nclosure, nfree));
    }
    f.code = code;
    Ok(())
}

fn get_defaults(f: &Function) -> Value {
    f.defaults.clone().map_or(Value::None, Value::Tuple)
}

fn set_defaults(f: &mut Function, value: Value) -> RunResult<()> {
    let Some(defaults) = value.to_tuple() else {
        return Err(ExcType::type_error_attr_kind(
            "__defaults__",
            "a tuple or list object",
            value.py_type(),
        ));
    };
    f.defaults = Some(defaults);
    Ok(())
}

fn del_defaults(f: &mut Function) {
    f.defaults = None;
}

fn get_kw_defaults(f: &Function) -> Value {
    f.kw_defaults.clone().map_or(Value::None, Value::Dict)
}

fn set_kw_defaults(f: &mut Function, value: Value) -> RunResult<()> {
    f.kw_defaults = Some(expect_dict("__kwdefaults__", value)?);
    Ok(())
}

fn del_kw_defaults(f: &mut Function) {
    f.kw_defaults = None;
}

fn get_annotations(f: &Function) -> Value {
    f.annotations.clone().map_or(Value::None, Value::Dict)
}

fn set_annotations(f: &mut Function, value: Value) -> RunResult<()> {
    f.annotations = Some(expect_dict("__annotations__", value)?);
    Ok(())
}

fn del_annotations(f: &mut Function) {
    f.annotations = None;
}

fn get_dict(f: &Function) -> Value {
    f.dict.clone().map_or(Value::None, Value::Dict)
}

fn set_dict(f: &mut Function, value: Value) -> RunResult<()> {
    f.dict = Some(expect_dict("__dict__", value)?);
    Ok(())
}

fn del_dict(f: &mut Function) {
    f.dict = None;
}

fn get_name(f: &Function) -> Value {
    Value::str(&f.name)
}

fn set_name(f: &mut Function, value: Value) -> RunResult<()> {
    f.name = expect_str("__name__", &value)?;
    Ok(())
}

fn get_qualname(f: &Function) -> Value {
    Value::str(&f.qualname)
}

fn set_qualname(f: &mut Function, value: Value) -> RunResult<()> {
    f.qualname = expect_str("__qualname__", &value)?;
    Ok(())
}

fn get_doc(f: &Function) -> Value {
    f.doc.clone()
}

fn set_doc(f: &mut Function, value: Value) -> RunResult<()> {
    f.doc = value;
    Ok(())
}

fn del_doc(f: &mut Function) {
    f.doc = Value::None;
}

fn get_module(f: &Function) -> Value {
    f.module.clone()
}

fn set_module(f: &mut Function, value: Value) -> RunResult<()> {
    f.module = value;
    Ok(())
}

fn del_module(f: &mut Function) {
    f.module = Value::None;
}

fn get_globals(f: &Function) -> Value {
    Value::Dict(f.globals.clone())
}

fn get_closure(f: &Function) -> Value {
    match &f.closure {
        Some(cells) => Value::tuple(cells.iter().cloned().map(Value::Cell)),
        None => Value::None,
    }
}

fn expect_dict(attr: &str, value: Value) -> RunResult<Dict> {
    match value {
        Value::Dict(dict) => Ok(dict),
        other => Err(ExcType::type_error_attr_kind(attr, "a dict object", other.py_type())),
    }
}

fn expect_str(attr: &str, value: &Value) -> RunResult<String> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| ExcType::type_error_attr_kind(attr, "a string object", value.py_type()))
}
