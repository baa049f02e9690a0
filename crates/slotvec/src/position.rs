//! Index-like positions inside a [`SlotVec`](crate::vector::SlotVec).
//!
//! A [`Position`] names a slot by index rather than by address, so it stays
//! meaningful across moves of the array itself. Any capacity-changing call
//! invalidates every outstanding position; debug builds stamp each position
//! with the array's epoch and assert on stale use, release builds carry the
//! index alone.

use std::cmp::Ordering;
use std::fmt;

/// A slot index handed out by a [`SlotVec`](crate::vector::SlotVec).
#[derive(Clone, Copy, Debug)]
pub struct Position {
    pub(crate) index: usize,
    #[cfg(debug_assertions)]
    pub(crate) epoch: u32,
}

impl Position {
    pub(crate) fn new(
        index: usize,
        #[cfg_attr(not(debug_assertions), allow(unused_variables))] epoch: u32,
    ) -> Self {
        Self {
            index,
            #[cfg(debug_assertions)]
            epoch,
        }
    }

    /// Index of the slot this position names.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The position `n` slots further on, from the same array.
    ///
    /// The result is not range-checked until it is used.
    ///
    /// # Panics
    ///
    /// Panics if the index overflows `usize`.
    pub fn advance(self, n: usize) -> Self {
        let Some(index) = self.index.checked_add(n) else {
            panic!("advancing {self} by {n} overflows");
        };
        let mut next = self;
        next.index = index;
        next
    }

    /// Number of slots from `self` to `later`.
    ///
    /// # Panics
    ///
    /// Panics if `later` comes before `self`.
    pub fn distance_to(self, later: Position) -> usize {
        assert!(
            later.index >= self.index,
            "distance_to called with an earlier position"
        );
        later.index - self.index
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for Position {}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self.index)
    }
}
