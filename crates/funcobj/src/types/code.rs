use crate::value::Value;

/// A compiled function body.
///
/// Code objects are produced by the compiler and never change afterwards. One code
/// object may back any number of function objects: each execution of a `def`
/// statement pairs the same code with a fresh closure, globals and defaults.
///
/// The first constant doubles as the docstring when it is a string, and the number
/// of free variables fixes how many closure cells a function must carry.
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    name: String,
    consts: Vec<Value>,
    freevars: Vec<String>,
}

impl Code {
    /// Creates an empty code object with the given name.
    ///
    /// Use the `with_*` methods to fill in the rest before wrapping it in an `Rc`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            consts: Vec::new(),
            freevars: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_consts(mut self, consts: Vec<Value>) -> Self {
        self.consts = consts;
        self
    }

    #[must_use]
    pub fn with_freevars<S: Into<String>>(mut self, freevars: impl IntoIterator<Item = S>) -> Self {
        self.freevars = freevars.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn consts(&self) -> &[Value] {
        &self.consts
    }

    #[must_use]
    pub fn freevars(&self) -> &[String] {
        &self.freevars
    }

    /// Number of closure cells a function running this code must carry.
    #[must_use]
    pub fn free_var_count(&self) -> usize {
        self.freevars.len()
    }
}
