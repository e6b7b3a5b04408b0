use std::fmt;

/// Represents the Python type of a value.
///
/// Used for error messages (`'int' object is not callable`) and for the shape checks
/// performed by function attribute setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    NoneType,
    Bool,
    Int,
    Float,
    Str,
    Tuple,
    List,
    Dict,
    Code,
    Cell,
    Function,
    Method,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoneType => f.write_str("NoneType"),
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Str => f.write_str("str"),
            Self::Tuple => f.write_str("tuple"),
            Self::List => f.write_str("list"),
            Self::Dict => f.write_str("dict"),
            Self::Code => f.write_str("code"),
            Self::Cell => f.write_str("cell"),
            Self::Function => f.write_str("function"),
            Self::Method => f.write_str("method"),
        }
    }
}
