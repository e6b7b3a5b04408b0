use std::{
    borrow::Cow,
    fmt::{self, Display},
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::types::Type;

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// Exception classes that can surface through function objects.
///
/// The accessor layer only ever originates `TypeError`, `ValueError` and `AttributeError`;
/// the remaining variants exist so evaluators can report their own failures through the
/// same `RunError` channel, which this crate forwards untouched.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>` implementations.
/// The string representation matches the variant name exactly (e.g., `ValueError` -> "ValueError").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum ExcType {
    /// Root of the hierarchy.
    BaseException,
    /// primary exception class - matches any exception in isinstance checks.
    Exception,

    // --- ArithmeticError hierarchy ---
    ArithmeticError,
    ZeroDivisionError,

    AttributeError,
    TypeError,
    ValueError,
}

impl ExcType {
    /// Checks if this exception type is a subclass of another exception type.
    ///
    /// Returns true if `self` would be caught by `except handler_type:`.
    #[must_use]
    pub fn is_subclass_of(self, handler_type: Self) -> bool {
        if self == handler_type {
            return true;
        }
        match handler_type {
            Self::BaseException => true,
            Self::Exception => self != Self::BaseException,
            Self::ArithmeticError => self == Self::ZeroDivisionError,
            _ => false,
        }
    }

    /// Creates a TypeError with the given message.
    #[must_use]
    pub fn type_error(msg: impl Display) -> RunError {
        SimpleException::new_msg(Self::TypeError, msg).into()
    }

    /// Creates a ValueError with the given message.
    #[must_use]
    pub fn value_error(msg: impl Display) -> RunError {
        SimpleException::new_msg(Self::ValueError, msg).into()
    }

    /// Creates a TypeError for a descriptor setter that received the wrong kind of value.
    ///
    /// Format: `__defaults__ must be set to a tuple object, not 'int'`
    #[must_use]
    pub(crate) fn type_error_attr_kind(attr: &str, expected: &str, got: Type) -> RunError {
        Self::type_error(format!("{attr} must be set to {expected}, not '{got}'"))
    }

    /// Creates a ValueError for a code object whose free variables do not match the closure.
    ///
    /// Matches CPython's format: `f() requires a code object with 0 free vars, not 1`
    #[must_use]
    pub(crate) fn value_error_free_vars(func_name: &str, expected: usize, actual: usize) -> RunError {
        Self::value_error(format!(
            "{func_name}() requires a code object with {expected} free vars, not {actual}"
        ))
    }

    /// Creates an AttributeError for a missing attribute.
    ///
    /// Matches CPython's format: `AttributeError: 'function' object has no attribute 'x'`
    #[must_use]
    pub(crate) fn attribute_error(type_: Type, attr: &str) -> RunError {
        SimpleException::new_msg(Self::AttributeError, format!("'{type_}' object has no attribute '{attr}'")).into()
    }

    /// Creates an AttributeError for writes to a read-only descriptor.
    #[must_use]
    pub(crate) fn attribute_error_readonly() -> RunError {
        SimpleException::new_msg(Self::AttributeError, "readonly attribute").into()
    }

    /// Creates an AttributeError for deleting a descriptor without a deleter.
    #[must_use]
    pub(crate) fn attribute_error_cannot_delete(attr: &str) -> RunError {
        SimpleException::new_msg(Self::AttributeError, format!("cannot delete attribute '{attr}'")).into()
    }

    /// Creates a TypeError for calling a value that is not callable.
    ///
    /// Matches CPython's format: `TypeError: 'int' object is not callable`
    #[must_use]
    pub(crate) fn type_error_not_callable(type_: Type) -> RunError {
        Self::type_error(format!("'{type_}' object is not callable"))
    }
}

/// An exception instance: its class plus the optional message argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleException {
    exc_type: ExcType,
    arg: Option<String>,
}

impl SimpleException {
    /// Creates a new exception with the given type and optional argument message.
    #[must_use]
    pub fn new(exc_type: ExcType, arg: Option<String>) -> Self {
        Self { exc_type, arg }
    }

    /// Creates a new exception with the given type and argument message.
    #[must_use]
    pub fn new_msg(exc_type: ExcType, arg: impl Display) -> Self {
        Self {
            exc_type,
            arg: Some(arg.to_string()),
        }
    }

    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.exc_type
    }

    #[must_use]
    pub fn arg(&self) -> Option<&str> {
        self.arg.as_deref()
    }
}

impl Display for SimpleException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{}: {arg}", self.exc_type),
            None => write!(f, "{}", self.exc_type),
        }
    }
}

/// Runtime error types produced by, or forwarded through, function objects.
///
/// Two variants:
/// - `Exc`: an exception that program code can catch (accessor failures, evaluator raises)
/// - `Internal`: a bug in the host, not in user code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunError {
    /// Internal host error - indicates a bug in the embedding, not user code.
    Internal(Cow<'static, str>),
    /// Catchable exception (e.g., ValueError, TypeError).
    Exc(Box<SimpleException>),
}

impl RunError {
    /// Returns the exception type if this is a catchable exception.
    #[must_use]
    pub fn exc_type(&self) -> Option<ExcType> {
        match self {
            Self::Exc(exc) => Some(exc.exc_type()),
            Self::Internal(_) => None,
        }
    }

    /// Returns the exception message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Exc(exc) => exc.arg(),
            Self::Internal(msg) => Some(msg),
        }
    }
}

impl From<SimpleException> for RunError {
    fn from(exc: SimpleException) -> Self {
        Self::Exc(Box::new(exc))
    }
}

impl Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
            Self::Exc(exc) => Display::fmt(exc, f),
        }
    }
}

impl std::error::Error for RunError {}
