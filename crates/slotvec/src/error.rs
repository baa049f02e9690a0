//! Storage error types.
//!
//! Only allocation problems are represented as values. Contract violations
//! (stale positions, out-of-range slots) panic or trip debug assertions, and
//! panics raised by element constructors unwind through the container
//! untouched.

use std::error::Error;
use std::fmt;

/// Errors reported by the fallible allocation surface
/// ([`RawBlock::try_allocate`](crate::raw::RawBlock::try_allocate) and
/// [`SlotVec::try_reserve`](crate::vector::SlotVec::try_reserve)).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageError {
    /// The byte size of the requested block does not fit in `isize::MAX`,
    /// or the growth arithmetic overflowed `usize`.
    CapacityOverflow {
        /// Number of element slots requested.
        requested: usize,
    },
    /// The global allocator returned null.
    AllocationFailed {
        /// Size of the failed request in bytes.
        bytes: usize,
        /// Alignment of the failed request in bytes.
        align: usize,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityOverflow { requested } => {
                write!(f, "capacity overflow: {requested} slots requested")
            }
            Self::AllocationFailed { bytes, align } => {
                write!(
                    f,
                    "allocation failed: {bytes} bytes with alignment {align}"
                )
            }
        }
    }
}

impl Error for StorageError {}
