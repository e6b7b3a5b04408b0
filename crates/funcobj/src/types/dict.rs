use std::{
    cell::{Ref, RefCell},
    fmt,
    rc::Rc,
};

use indexmap::IndexMap;

use crate::{cycle, value::Value};

/// An owned, insertion-ordered string-keyed mapping.
///
/// Used directly for call-time keyword arguments, and as the storage behind [`Dict`].
pub type StringDict = IndexMap<String, Value>;

/// A shared, mutable, string-keyed dictionary.
///
/// Cloning a `Dict` clones the handle, not the contents: module globals, `__dict__`,
/// `__kwdefaults__` and `__annotations__` are all aliased by whoever holds them, so a
/// write through one holder is visible to all.
#[derive(Clone, Default)]
pub struct Dict(Rc<RefCell<StringDict>>);

impl Dict {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dict from key/value pairs, keeping the first-seen key order.
    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::from(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect::<StringDict>())
    }

    /// Returns a clone of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Inserts or replaces `key`, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value)
    }

    /// Removes `key`, preserving the order of the remaining entries.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().shift_remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Borrows the underlying map for iteration.
    ///
    /// The borrow must be released before anything else writes to this dict.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, StringDict> {
        self.0.borrow()
    }

    /// Returns a detached copy of the current contents.
    #[must_use]
    pub fn to_map(&self) -> StringDict {
        self.0.borrow().clone()
    }

    /// Returns whether both handles refer to the same dict.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<StringDict> for Dict {
    fn from(map: StringDict) -> Self {
        Self(Rc::new(RefCell::new(map)))
    }
}

impl Dict {
    fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

/// Content equality. A dict reachable from itself compares equal to another whose
/// cycle lines up, rather than recursing without end.
impl PartialEq for Dict {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || cycle::eq_guard(self.addr(), other.addr(), || *self.0.borrow() == *other.0.borrow())
    }
}

/// A dict nested inside itself prints as `{...}`.
impl fmt::Debug for Dict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match cycle::repr_guard(self.addr(), || f.debug_map().entries(self.0.borrow().iter()).finish()) {
            Some(result) => result,
            None => f.write_str("{...}"),
        }
    }
}
