//! Owning iteration.

#![allow(unsafe_code)]

use std::fmt;
use std::iter::FusedIterator;
use std::slice;

use crate::raw::RawBlock;
use crate::slots::drop_slots;
use crate::vector::SlotVec;

/// Iterator that moves elements out of a [`SlotVec`].
///
/// Elements not yet yielded are dropped together with the iterator.
pub struct IntoIter<T> {
    block: RawBlock<T>,
    /// Live range still to be yielded.
    start: usize,
    end: usize,
}

impl<T> IntoIter<T> {
    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: [start, end) are live.
        unsafe { slice::from_raw_parts(self.block.offset(self.start), self.end - self.start) }
    }
}

impl<T> IntoIterator for SlotVec<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        let (block, len) = self.into_parts();
        IntoIter {
            block,
            start: 0,
            end: len,
        }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        // SAFETY: `start` is live and leaves the live range right after.
        let value = unsafe { self.block.offset(self.start).read() };
        self.start += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.start;
        (n, Some(n))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        self.end -= 1;
        // SAFETY: `end` was live and is now outside the live range.
        Some(unsafe { self.block.offset(self.end).read() })
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        let remaining = self.end - self.start;
        let start = self.start;
        self.start = self.end;
        // SAFETY: [start, start + remaining) are live and no longer reachable.
        unsafe { drop_slots(self.block.offset_mut(start), remaining) };
    }
}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}
