//! Weak references to function objects.
//!
//! A weak reference observes a function without keeping it alive. Liveness is
//! tracked by the shared handle itself, so there is no separate observer list to
//! maintain: once the last strong handle is dropped, every weak reference reads
//! back as dead.

use std::{cell::RefCell, fmt, rc::Weak};

use crate::function::{Function, FunctionRef};

/// A non-owning reference to a function object (`weakref.ref(f)`).
#[derive(Clone)]
pub struct WeakFunctionRef {
    target: Weak<RefCell<Function>>,
}

impl WeakFunctionRef {
    pub(crate) fn new(target: Weak<RefCell<Function>>) -> Self {
        Self { target }
    }

    /// Returns the function if it is still alive.
    ///
    /// Mirrors calling a `weakref.ref` object, which returns `None` once the target is gone.
    #[must_use]
    pub fn upgrade(&self) -> Option<FunctionRef> {
        self.target.upgrade().map(FunctionRef::from_rc)
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }
}

impl fmt::Debug for WeakFunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addr = self.target.as_ptr() as usize;
        if self.is_alive() {
            write!(f, "<weakref at 0x{addr:x}; to 'function'>")
        } else {
            write!(f, "<weakref at 0x{addr:x}; dead>")
        }
    }
}
