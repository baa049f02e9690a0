//! Instrumented element types.
//!
//! - [`Tracked`]: counts constructions and drops in a shared [`Ledger`].
//! - [`FaultyClone`]: like `Tracked`, but `clone()` panics once a shared
//!   [`CloneBudget`] is spent.
//! - [`FaultyDefault`]: `Default` that panics after N successful calls
//!   on the current thread.
//! - [`MoveOnly`]: a value without `Clone`.

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::DELIBERATE_PANIC;

/// Shared construction/drop counters.
///
/// Every fixture instance created through a ledger (including clones)
/// bumps `created`; every drop bumps `dropped`. A container that neither
/// leaks nor double-drops keeps `live()` equal to the number of elements
/// it reports.
#[derive(Debug, Default)]
pub struct Ledger {
    created: AtomicUsize,
    dropped: AtomicUsize,
}

impl Ledger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Total instances ever created.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// Total instances dropped.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Instances currently alive.
    ///
    /// # Panics
    ///
    /// Panics if more instances were dropped than created, which means
    /// something was dropped twice.
    pub fn live(&self) -> usize {
        let created = self.created();
        let dropped = self.dropped();
        assert!(
            dropped <= created,
            "double drop detected: {dropped} drops for {created} instances"
        );
        created - dropped
    }

    fn record_create(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }
}

/// A value whose lifetime is recorded in a [`Ledger`].
#[derive(Debug)]
pub struct Tracked {
    value: i64,
    ledger: Arc<Ledger>,
}

impl Tracked {
    pub fn new(value: i64, ledger: &Arc<Ledger>) -> Self {
        ledger.record_create();
        Self {
            value,
            ledger: Arc::clone(ledger),
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Self::new(self.value, &self.ledger)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.ledger.record_drop();
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Number of clones a group of [`FaultyClone`] values may still perform.
///
/// Uses `AtomicUsize` so fixtures stay `Send + Sync`.
#[derive(Debug)]
pub struct CloneBudget {
    remaining: AtomicUsize,
}

impl CloneBudget {
    /// A budget allowing `successes` clones before the next one panics.
    pub fn new(successes: usize) -> Arc<Self> {
        Arc::new(Self {
            remaining: AtomicUsize::new(successes),
        })
    }

    /// A budget that never runs out (until re-armed).
    pub fn unlimited() -> Arc<Self> {
        Self::new(usize::MAX)
    }

    /// Re-arm the budget.
    pub fn set(&self, successes: usize) {
        self.remaining.store(successes, Ordering::Relaxed);
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Relaxed)
    }

    fn spend(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// A tracked value whose `clone()` panics once its [`CloneBudget`] is spent.
///
/// Failed clones create nothing, so the ledger only ever counts real
/// instances.
#[derive(Debug)]
pub struct FaultyClone {
    inner: Tracked,
    budget: Arc<CloneBudget>,
}

impl FaultyClone {
    pub fn new(value: i64, ledger: &Arc<Ledger>, budget: &Arc<CloneBudget>) -> Self {
        Self {
            inner: Tracked::new(value, ledger),
            budget: Arc::clone(budget),
        }
    }

    pub fn value(&self) -> i64 {
        self.inner.value()
    }
}

impl Clone for FaultyClone {
    fn clone(&self) -> Self {
        if !self.budget.spend() {
            panic!("{}", DELIBERATE_PANIC);
        }
        Self {
            inner: self.inner.clone(),
            budget: Arc::clone(&self.budget),
        }
    }
}

impl PartialEq for FaultyClone {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

thread_local! {
    static DEFAULT_BUDGET: Cell<usize> = const { Cell::new(usize::MAX) };
    static DEFAULT_SEQUENCE: Cell<i64> = const { Cell::new(0) };
    static DEFAULT_LIVE: Cell<usize> = const { Cell::new(0) };
}

/// A value whose `Default` impl panics after a configurable number of
/// successful calls on the current thread.
///
/// `Default` takes no arguments, so the budget and live count are
/// thread-local; each test thread sees its own state. Successful defaults
/// are numbered 0, 1, 2, … since the last [`arm`](Self::arm).
#[derive(Debug, PartialEq, Eq)]
pub struct FaultyDefault {
    pub seq: i64,
}

impl FaultyDefault {
    /// Allow `successes` defaults before panicking and reset the sequence
    /// and live counter.
    pub fn arm(successes: usize) {
        DEFAULT_BUDGET.with(|b| b.set(successes));
        DEFAULT_SEQUENCE.with(|s| s.set(0));
        DEFAULT_LIVE.with(|l| l.set(0));
    }

    /// Stop failing. The live counter is left untouched.
    pub fn disarm() {
        DEFAULT_BUDGET.with(|b| b.set(usize::MAX));
    }

    /// Instances alive on this thread since the last [`arm`](Self::arm).
    pub fn live() -> usize {
        DEFAULT_LIVE.with(|l| l.get())
    }
}

impl Default for FaultyDefault {
    fn default() -> Self {
        let allowed = DEFAULT_BUDGET.with(|b| match b.get() {
            0 => false,
            n => {
                b.set(n - 1);
                true
            }
        });
        if !allowed {
            panic!("{}", DELIBERATE_PANIC);
        }
        let seq = DEFAULT_SEQUENCE.with(|s| {
            let n = s.get();
            s.set(n + 1);
            n
        });
        DEFAULT_LIVE.with(|l| l.set(l.get() + 1));
        Self { seq }
    }
}

impl Drop for FaultyDefault {
    fn drop(&mut self) {
        DEFAULT_LIVE.with(|l| l.set(l.get().saturating_sub(1)));
    }
}

/// A value that can only be moved.
#[derive(Debug, Default, PartialEq, Eq, Hash)]
pub struct MoveOnly(pub i64);
