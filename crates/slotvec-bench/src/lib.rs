//! Workload generators for slotvec benchmarks and differential tests.
//!
//! - [`workload`]: a seeded, reproducible stream of array operations
//! - [`Sequence`]: the operation surface shared by [`SlotVec`] and `Vec`
//! - [`apply`]: replay a workload against any [`Sequence`]

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use slotvec::SlotVec;

/// Largest length a generated `Reserve` or `Resize` asks for.
pub const MAX_TARGET_LEN: usize = 256;

/// One array operation.
///
/// Slot numbers are raw draws; [`apply`] reduces them modulo the current
/// length so every operation is valid whatever came before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Append a value.
    PushBack(u64),
    /// Remove the last value, if any.
    PopBack,
    /// Insert a value before `slot % (len + 1)`.
    Insert {
        /// Raw slot draw.
        slot: usize,
        /// Value to insert.
        value: u64,
    },
    /// Erase the value at `slot % len`, if any.
    Erase {
        /// Raw slot draw.
        slot: usize,
    },
    /// Make room for this many elements in total.
    Reserve(usize),
    /// Resize to this length, filling with zeros.
    Resize(usize),
    /// Drop every element.
    Clear,
}

/// Generate `count` operations from `seed`.
///
/// Mix: 40% push, 15% pop, 20% insert, 15% erase, 4% reserve, 4% resize,
/// 2% clear. The same seed always yields the same workload.
pub fn workload(seed: u64, count: usize) -> Vec<Op> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count).map(|_| next_op(&mut rng)).collect()
}

fn next_op(rng: &mut ChaCha8Rng) -> Op {
    match rng.random_range(0..100u32) {
        0..=39 => Op::PushBack(rng.random()),
        40..=54 => Op::PopBack,
        55..=74 => Op::Insert {
            slot: rng.random::<u64>() as usize,
            value: u64::from(rng.random::<u32>()),
        },
        75..=89 => Op::Erase { slot: rng.random::<u64>() as usize },
        90..=93 => Op::Reserve(rng.random_range(0..=MAX_TARGET_LEN)),
        94..=97 => Op::Resize(rng.random_range(0..=MAX_TARGET_LEN)),
        _ => Op::Clear,
    }
}

/// The operations a workload needs from an array of `u64`.
pub trait Sequence {
    /// Append `value`.
    fn push_back(&mut self, value: u64);
    /// Remove and return the last value.
    fn pop_back(&mut self) -> Option<u64>;
    /// Insert `value` before index `at` (`at <= len`).
    fn insert_at(&mut self, at: usize, value: u64);
    /// Remove the value at index `at` (`at < len`).
    fn erase_at(&mut self, at: usize);
    /// Ensure room for `total` elements.
    fn reserve_total(&mut self, total: usize);
    /// Resize to `len`, filling with zeros.
    fn resize_to(&mut self, len: usize);
    /// Drop every element.
    fn clear_all(&mut self);
    /// Current contents.
    fn values(&self) -> &[u64];
}

impl Sequence for SlotVec<u64> {
    fn push_back(&mut self, value: u64) {
        SlotVec::push_back(self, value);
    }

    fn pop_back(&mut self) -> Option<u64> {
        SlotVec::pop_back(self)
    }

    fn insert_at(&mut self, at: usize, value: u64) {
        let pos = self.position(at);
        self.insert(pos, value);
    }

    fn erase_at(&mut self, at: usize) {
        let pos = self.position(at);
        self.erase(pos);
    }

    fn reserve_total(&mut self, total: usize) {
        self.reserve(total);
    }

    fn resize_to(&mut self, len: usize) {
        self.resize(len);
    }

    fn clear_all(&mut self) {
        self.clear();
    }

    fn values(&self) -> &[u64] {
        self.as_slice()
    }
}

impl Sequence for Vec<u64> {
    fn push_back(&mut self, value: u64) {
        self.push(value);
    }

    fn pop_back(&mut self) -> Option<u64> {
        self.pop()
    }

    fn insert_at(&mut self, at: usize, value: u64) {
        self.insert(at, value);
    }

    fn erase_at(&mut self, at: usize) {
        self.remove(at);
    }

    fn reserve_total(&mut self, total: usize) {
        self.reserve(total.saturating_sub(self.len()));
    }

    fn resize_to(&mut self, len: usize) {
        self.resize(len, 0);
    }

    fn clear_all(&mut self) {
        self.clear();
    }

    fn values(&self) -> &[u64] {
        self
    }
}

/// Replay `ops` against `seq`. Returns the values popped, in order.
pub fn apply<S: Sequence>(seq: &mut S, ops: &[Op]) -> Vec<Option<u64>> {
    let mut popped = Vec::new();
    for op in ops {
        let len = seq.values().len();
        match *op {
            Op::PushBack(value) => seq.push_back(value),
            Op::PopBack => popped.push(seq.pop_back()),
            Op::Insert { slot, value } => seq.insert_at(slot % (len + 1), value),
            Op::Erase { slot } => {
                if len > 0 {
                    seq.erase_at(slot % len);
                }
            }
            Op::Reserve(total) => seq.reserve_total(total),
            Op::Resize(target) => seq.resize_to(target),
            Op::Clear => seq.clear_all(),
        }
    }
    popped
}

/// `0, 1, …, n - 1` pushed one at a time.
pub fn sequential(n: usize) -> SlotVec<u64> {
    let mut v = SlotVec::new();
    for i in 0..n as u64 {
        v.push_back(i);
    }
    v
}
