//! Construct, relocate and destroy runs of raw slots.
//!
//! These are the only routines that turn uninitialised slots into live
//! values and back. The constructing routines hold an [`InitGuard`]: if a
//! user constructor panics part-way through, the guard drops exactly the
//! slots initialised so far, so the caller never sees a half-built run.
//!
//! Relocation always goes through [`move_slots`]. A Rust move is a bitwise
//! copy that cannot fail, which settles the "move or copy?" question for
//! every element type at compile time; [`clone_slots`] is used where real
//! copies are wanted (cloning and `clone_from`), never for relocation.

#![allow(unsafe_code)]

use std::mem;
use std::ptr;

/// Drops the first `initialized` slots starting at `start` unless disarmed.
struct InitGuard<T> {
    start: *mut T,
    initialized: usize,
}

impl<T> InitGuard<T> {
    fn new(start: *mut T) -> Self {
        Self {
            start,
            initialized: 0,
        }
    }

    /// Keep the initialised slots alive and return how many there are.
    fn disarm(self) -> usize {
        let n = self.initialized;
        mem::forget(self);
        n
    }
}

impl<T> Drop for InitGuard<T> {
    fn drop(&mut self) {
        // SAFETY: exactly `initialized` slots from `start` were written by
        // the routine owning this guard and have not been handed out.
        unsafe { drop_slots(self.start, self.initialized) };
    }
}

/// Relocate `count` live values from `src` to `dst`.
///
/// Afterwards the source slots are logically uninitialised: the caller must
/// not drop them again.
///
/// # Safety
///
/// `src` must be valid for reading `count` live values, `dst` valid for
/// writing `count` slots, and the two ranges must not overlap.
#[inline]
pub(crate) unsafe fn move_slots<T>(src: *const T, dst: *mut T, count: usize) {
    // SAFETY: forwarded from the caller.
    unsafe { ptr::copy_nonoverlapping(src, dst, count) };
}

/// Clone every value of `src` into consecutive slots starting at `dst`.
///
/// If a `clone()` panics, the clones already written are dropped before the
/// panic continues, leaving every destination slot uninitialised.
///
/// # Safety
///
/// `dst` must be valid for writing `src.len()` slots that do not overlap
/// `src`.
pub(crate) unsafe fn clone_slots<T: Clone>(src: &[T], dst: *mut T) {
    let mut guard = InitGuard::new(dst);
    for value in src {
        // SAFETY: guard.initialized < src.len(), inside the caller's range.
        unsafe { dst.add(guard.initialized).write(value.clone()) };
        guard.initialized += 1;
    }
    guard.disarm();
}

/// Construct `count` values with `f` into consecutive slots from `dst`.
///
/// Panic behaviour matches [`clone_slots`].
///
/// # Safety
///
/// `dst` must be valid for writing `count` slots.
pub(crate) unsafe fn fill_slots<T, F>(dst: *mut T, count: usize, mut f: F)
where
    F: FnMut() -> T,
{
    let mut guard = InitGuard::new(dst);
    while guard.initialized < count {
        // SAFETY: guard.initialized < count.
        unsafe { dst.add(guard.initialized).write(f()) };
        guard.initialized += 1;
    }
    guard.disarm();
}

/// Drop `count` live values starting at `start`.
///
/// # Safety
///
/// The range must hold `count` live values that nothing else will drop or
/// read afterwards.
#[inline]
pub(crate) unsafe fn drop_slots<T>(start: *mut T, count: usize) {
    // SAFETY: forwarded from the caller.
    unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(start, count)) };
}
