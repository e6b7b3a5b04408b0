//! Cycle guards for self-referencing containers.
//!
//! Dicts and lists are shared handles, so `d["me"] = d` is legal and formatting or
//! comparing such a value would recurse forever. Containers register their address
//! here for the duration of the nested walk:
//!
//! - repr prints the placeholder (`{...}`, `[...]`) when it meets a container that is
//!   already being formatted further up the stack
//! - equality treats a pair of containers already being compared as equal, so two
//!   structures whose cycles line up compare equal instead of overflowing the stack

use std::cell::RefCell;

use ahash::AHashSet;

thread_local! {
    static REPR_ACTIVE: RefCell<AHashSet<usize>> = RefCell::new(AHashSet::new());
    static EQ_ACTIVE: RefCell<AHashSet<(usize, usize)>> = RefCell::new(AHashSet::new());
}

/// Removes its entry when the walk ends, including on unwind.
struct ReprEntry(usize);

impl Drop for ReprEntry {
    fn drop(&mut self) {
        REPR_ACTIVE.with(|active| active.borrow_mut().remove(&self.0));
    }
}

struct EqEntry((usize, usize));

impl Drop for EqEntry {
    fn drop(&mut self) {
        EQ_ACTIVE.with(|active| active.borrow_mut().remove(&self.0));
    }
}

/// Runs `f` to format the container at `id`, or returns `None` if it is already
/// being formatted.
pub(crate) fn repr_guard<R>(id: usize, f: impl FnOnce() -> R) -> Option<R> {
    if !REPR_ACTIVE.with(|active| active.borrow_mut().insert(id)) {
        return None;
    }
    let _entry = ReprEntry(id);
    Some(f())
}

/// Runs `f` to compare the containers at `left` and `right`; a pair already under
/// comparison is taken as equal.
pub(crate) fn eq_guard(left: usize, right: usize, f: impl FnOnce() -> bool) -> bool {
    let key = (left, right);
    if !EQ_ACTIVE.with(|active| active.borrow_mut().insert(key)) {
        return true;
    }
    let _entry = EqEntry(key);
    f()
}
