//! Test utilities for slotvec development.
//!
//! Element types that count their own lifetimes or fail on demand, so
//! tests can check that a container never leaks, never drops twice, and
//! leaves the promised state behind when a constructor panics.
//! See [`fixtures`] for the types and [`expect_panic`] for the harness.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

pub use fixtures::{CloneBudget, FaultyClone, FaultyDefault, Ledger, MoveOnly, Tracked};

/// Message carried by every panic raised on purpose by a fixture.
pub const DELIBERATE_PANIC: &str = "deliberate fixture failure";

/// Run `f`, assert that it panics, and return the panic message.
///
/// # Panics
///
/// Panics if `f` returns normally.
pub fn expect_panic<R>(f: impl FnOnce() -> R) -> String {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(_) => panic!("expected the operation to panic, but it returned"),
        Err(payload) => panic_message(payload.as_ref()),
    }
}

/// Extract the text of a panic payload, or a placeholder for non-string payloads.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
