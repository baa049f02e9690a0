//! A growable contiguous array built directly on raw storage.
//!
//! `slotvec` separates *owning memory* from *owning values*:
//!
//! ```text
//! SlotVec<T> (values: len, growth, panic safety)
//! ├── RawBlock<T> (one allocation of `capacity` uninitialised slots)
//! ├── slots::{fill, clone, move, drop} (guarded runs of slot construction)
//! ├── GrowthPolicy (max(2 × capacity, required))
//! └── Position (index handle, epoch-checked in debug builds)
//! ```
//!
//! Slots `[0, len)` of the block always hold live values and slots
//! `[len, capacity)` never do. All `unsafe` lives in [`raw`], [`vector`],
//! [`iter`] and the private `slots` module.
//!
//! # Panic safety
//!
//! A user constructor (`Default`, `Clone`, or an `emplace` closure) that
//! panics is the one failure an operation has to survive. Appends and
//! inserts build the new element before anything else moves, so the array
//! is left exactly as it was. Bulk construction drops whatever it had built
//! and frees any storage it allocated. The [`vector`] module documents the
//! guarantee of every operation.
//!
//! # Quick start
//!
//! ```
//! use slotvec::prelude::*;
//!
//! let mut v: SlotVec<String> = SlotVec::new();
//! v.push_back("b".to_string());
//! v.insert(v.begin(), "a".to_string());
//! assert_eq!(v.capacity(), 2);
//! let next = v.erase(v.begin());
//! assert_eq!(v[next], "b");
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod error;
pub mod iter;
pub mod position;
pub mod raw;
mod slots;
pub mod vector;

pub use config::GrowthPolicy;
pub use error::StorageError;
pub use iter::IntoIter;
pub use position::Position;
pub use raw::RawBlock;
pub use vector::SlotVec;

/// Common imports.
pub mod prelude {
    pub use crate::error::StorageError;
    pub use crate::position::Position;
    pub use crate::vector::SlotVec;
}
