//! Runtime types that function objects are built from and hand out.
//!
//! Code artifacts and cells come from the compiler side, dicts from the host object
//! model; bound methods and weak references are produced by function objects themselves.
pub mod cell;
pub mod code;
pub mod dict;
pub mod method;
pub mod r#type;
pub mod weakref;

pub use cell::Cell;
pub use code::Code;
pub use dict::{Dict, StringDict};
pub use method::BoundMethod;
pub use r#type::Type;
pub use weakref::WeakFunctionRef;
