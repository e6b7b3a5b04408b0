//! Closure cells.
//!
//! A cell is a single shared slot. The defining scope and every closure that
//! captured the variable hold clones of the same `Cell`, so a store through any
//! holder is visible to all of them.

use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    exception::{ExcType, RunResult},
    value::Value,
};

/// A shared, mutably-aliased storage slot for a captured variable.
///
/// `None` inside the slot means the variable has not been bound yet.
#[derive(Clone, Default)]
pub struct Cell(Rc<RefCell<Option<Value>>>);

impl Cell {
    /// Creates a cell holding `value`.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(Rc::new(RefCell::new(Some(value))))
    }

    /// Creates an unbound cell.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a clone of the current contents, or `None` when unbound.
    #[must_use]
    pub fn get(&self) -> Option<Value> {
        self.0.borrow().clone()
    }

    /// Stores a new value, replacing any previous contents.
    pub fn set(&self, value: Value) {
        *self.0.borrow_mut() = Some(value);
    }

    /// Unbinds the cell (`del x` on a captured variable).
    pub fn clear(&self) {
        self.0.borrow_mut().take();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_none()
    }

    /// Python's `cell.cell_contents`.
    ///
    /// Raises `ValueError: Cell is empty` when the slot is unbound.
    pub fn contents(&self) -> RunResult<Value> {
        self.get().ok_or_else(|| ExcType::value_error("Cell is empty"))
    }

    /// Returns whether both handles refer to the same slot.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addr = Rc::as_ptr(&self.0) as usize;
        match &*self.0.borrow() {
            Some(value) => write!(f, "<cell at 0x{addr:x}: {} object>", value.py_type()),
            None => write!(f, "<cell at 0x{addr:x}: empty>"),
        }
    }
}
