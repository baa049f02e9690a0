//! The growable array.
//!
//! [`SlotVec`] owns one [`RawBlock`] and a length. Slots `[0, len)` hold live
//! values, slots `[len, capacity)` are uninitialised. Every operation that
//! needs more room allocates a fresh block, constructs the new element in
//! its final slot there, and only then relocates the existing elements, so a
//! panicking constructor never disturbs the array.
//!
//! # Panic safety at a glance
//!
//! | Operation | On a panicking constructor |
//! |---|---|
//! | `with_len`, `clone` | partial elements dropped, storage freed |
//! | `push_back*`, `emplace_back`, `insert*`, `emplace` | array unchanged |
//! | `resize`, `resize_with` | new elements dropped, length unchanged (capacity may have grown) |
//! | `clone_from` (fits in capacity) | array valid but partially overwritten |
//! | `clone_from` (needs more capacity) | array unchanged |
//!
//! Relocation itself is a bitwise move and cannot panic, so `reserve` never
//! loses elements.

#![allow(unsafe_code)]

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::ptr;
use std::slice;

use crate::config::GrowthPolicy;
use crate::error::StorageError;
use crate::position::Position;
use crate::raw::{capacity_overflow, RawBlock};
use crate::slots::{clone_slots, drop_slots, fill_slots, move_slots};

/// A contiguous growable array built directly on raw storage.
///
/// ```
/// use slotvec::SlotVec;
///
/// let mut v = SlotVec::new();
/// v.push_back(1);
/// v.push_back(3);
/// let at = v.insert(v.position(1), 2);
/// assert_eq!(v[at], 2);
/// assert_eq!(v, [1, 2, 3]);
/// ```
pub struct SlotVec<T> {
    block: RawBlock<T>,
    len: usize,
    /// Bumped on every capacity change; stamps issued positions.
    #[cfg(debug_assertions)]
    epoch: u32,
}

impl<T> SlotVec<T> {
    /// An empty array with no storage.
    pub const fn new() -> Self {
        Self::from_block(RawBlock::new())
    }

    /// An empty array with room for exactly `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_block(RawBlock::allocate(capacity))
    }

    /// An array of `len` default values, with capacity exactly `len`.
    ///
    /// If `T::default()` panics, the values built so far are dropped and the
    /// storage is freed before the panic continues.
    pub fn with_len(len: usize) -> Self
    where
        T: Default,
    {
        let mut vec = Self::with_capacity(len);
        // SAFETY: the fresh block has exactly `len` free slots.
        unsafe { fill_slots(vec.block.offset_mut(0), len, T::default) };
        vec.len = len;
        vec
    }

    const fn from_block(block: RawBlock<T>) -> Self {
        Self {
            block,
            len: 0,
            #[cfg(debug_assertions)]
            epoch: 0,
        }
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots owned, live or not.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.block.capacity()
    }

    /// The live elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: [0, len) are live and the pointer is non-null and aligned
        // even when nothing is allocated.
        unsafe { slice::from_raw_parts(self.block.as_ptr(), self.len) }
    }

    /// The live elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in `as_slice`, with exclusive access.
        unsafe { slice::from_raw_parts_mut(self.block.as_mut_ptr(), self.len) }
    }

    /// Pointer to the first slot. Changes whenever capacity changes.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.block.as_ptr()
    }

    /// Forward iterator over the live elements.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Forward iterator over the live elements, mutably.
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Reference to element `index` without a bounds check.
    ///
    /// # Safety
    ///
    /// `index` must be less than [`len`](Self::len). Checked only in debug
    /// builds.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.len, "index {index} out of range for length {}", self.len);
        // SAFETY: index < len per the caller.
        unsafe { &*self.block.offset(index) }
    }

    /// Mutable reference to element `index` without a bounds check.
    ///
    /// # Safety
    ///
    /// Same as [`get_unchecked`](Self::get_unchecked).
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.len, "index {index} out of range for length {}", self.len);
        // SAFETY: index < len per the caller.
        unsafe { &mut *self.block.offset_mut(index) }
    }

    // ── Positions ────────────────────────────────────────────────

    /// Position of the first element (equal to [`end`](Self::end) when empty).
    pub fn begin(&self) -> Position {
        Position::new(0, self.epoch())
    }

    /// Position one past the last element.
    pub fn end(&self) -> Position {
        Position::new(self.len, self.epoch())
    }

    /// Position of element `index`; `index == len` names the end.
    pub fn position(&self, index: usize) -> Position {
        debug_assert!(
            index <= self.len,
            "position {index} out of range for length {}",
            self.len
        );
        Position::new(index, self.epoch())
    }

    #[inline]
    fn epoch(&self) -> u32 {
        #[cfg(debug_assertions)]
        {
            self.epoch
        }
        #[cfg(not(debug_assertions))]
        {
            0
        }
    }

    #[inline]
    fn bump_epoch(&mut self) {
        #[cfg(debug_assertions)]
        {
            self.epoch = self.epoch.wrapping_add(1);
        }
    }

    /// Index named by `pos`, asserting in debug builds that no capacity
    /// change happened since it was issued.
    #[inline]
    fn resolve(&self, pos: Position) -> usize {
        #[cfg(debug_assertions)]
        assert!(
            pos.epoch == self.epoch,
            "stale {pos}: the array changed capacity after it was issued"
        );
        pos.index
    }

    // ── Capacity ─────────────────────────────────────────────────

    /// Make room for at least `capacity` elements in total.
    ///
    /// Does nothing if the array is already that large. Otherwise allocates
    /// a block of exactly `capacity` slots and relocates every element into
    /// it, invalidating all positions.
    ///
    /// # Panics
    ///
    /// Panics with `capacity overflow` if the block size overflows.
    pub fn reserve(&mut self, capacity: usize) {
        if capacity <= self.capacity() {
            return;
        }
        self.adopt(RawBlock::allocate(capacity));
    }

    /// Fallible twin of [`reserve`](Self::reserve). On error the array is
    /// unchanged.
    pub fn try_reserve(&mut self, capacity: usize) -> Result<(), StorageError> {
        if capacity <= self.capacity() {
            return Ok(());
        }
        self.adopt(RawBlock::try_allocate(capacity)?);
        Ok(())
    }

    /// Relocate every element into `block` at the same indices and keep it.
    fn adopt(&mut self, mut block: RawBlock<T>) {
        debug_assert!(block.capacity() >= self.len);
        // SAFETY: [0, len) are live in the current block, the new block has
        // at least `len` free slots, and the two allocations are distinct.
        unsafe { move_slots(self.block.offset(0), block.offset_mut(0), self.len) };
        self.block.swap(&mut block);
        self.bump_epoch();
        // `block` now holds the old allocation with nothing live in it.
    }

    /// Capacity to grow to when one more element is needed.
    fn grown_capacity(&self) -> usize {
        let required = self.len.checked_add(1).unwrap_or_else(|| capacity_overflow());
        GrowthPolicy::next_capacity(self.capacity(), required).unwrap_or_else(|| capacity_overflow())
    }

    /// Grow into a fresh block, constructing the new element at `index`
    /// before relocating the current elements around it.
    ///
    /// If `make` panics, the fresh block is freed on unwind and `self` is
    /// untouched.
    fn grow_and_emplace<F>(&mut self, index: usize, make: F)
    where
        F: FnOnce() -> T,
    {
        debug_assert!(index <= self.len);
        let mut block = RawBlock::<T>::allocate(self.grown_capacity());
        let slot = block.offset_mut(index);
        // SAFETY: index <= len < new capacity, and the slot is free.
        unsafe { slot.write(make()) };
        // SAFETY: the prefix [0, index) and suffix [index, len) are live in
        // the old block; their targets in the new block are free and skip
        // the slot just filled.
        unsafe {
            move_slots(self.block.offset(0), block.offset_mut(0), index);
            move_slots(
                self.block.offset(index),
                block.offset_mut(index + 1),
                self.len - index,
            );
        }
        self.block.swap(&mut block);
        self.len += 1;
        self.bump_epoch();
    }

    // ── Appending and removing at the back ───────────────────────

    /// Append `value`.
    ///
    /// When the array is full, capacity becomes `max(2 * capacity, len + 1)`.
    pub fn push_back(&mut self, value: T) {
        self.emplace_back(|| value);
    }

    /// Append a clone of `value`.
    ///
    /// The clone is made in its final slot before anything else changes, so
    /// a panicking `clone()` leaves the array as it was.
    pub fn push_back_cloned(&mut self, value: &T)
    where
        T: Clone,
    {
        self.emplace_back(|| value.clone());
    }

    /// Append the value returned by `make` and return a reference to it.
    ///
    /// `make` runs directly into the target slot, in a new block if the
    /// array has to grow. If it panics, the array is unchanged.
    pub fn emplace_back<F>(&mut self, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        let index = self.len;
        if self.len == self.capacity() {
            self.grow_and_emplace(index, make);
        } else {
            let slot = self.block.offset_mut(index);
            // SAFETY: len < capacity, so the slot exists and is free.
            unsafe { slot.write(make()) };
            self.len += 1;
        }
        // SAFETY: slot `index` was just initialised.
        unsafe { &mut *self.block.offset_mut(index) }
    }

    /// Remove and return the last element, or `None` if empty.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: slot `len` was live and is now outside the live range.
        Some(unsafe { self.block.offset(self.len).read() })
    }

    /// Drop every element past `len`. Capacity is unchanged.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = self.len - len;
        // Shrink first so a panicking destructor cannot cause a double drop.
        self.len = len;
        // SAFETY: [len, len + tail) were live and are no longer reachable.
        unsafe { drop_slots(self.block.offset_mut(len), tail) };
    }

    /// Drop every element. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Set the length to `len`, dropping trailing elements or appending
    /// default values.
    ///
    /// Growing first [`reserve`](Self::reserve)s exactly `len` slots. If a
    /// `default()` panics, the values appended so far are dropped and the
    /// length is unchanged.
    pub fn resize(&mut self, len: usize)
    where
        T: Default,
    {
        self.resize_with(len, T::default);
    }

    /// Like [`resize`](Self::resize), with new elements produced by `make`.
    pub fn resize_with<F>(&mut self, len: usize, make: F)
    where
        F: FnMut() -> T,
    {
        if len <= self.len {
            self.truncate(len);
            return;
        }
        self.reserve(len);
        let extra = len - self.len;
        // SAFETY: capacity >= len after reserve, so [self.len, len) are free.
        unsafe { fill_slots(self.block.offset_mut(self.len), extra, make) };
        self.len = len;
    }

    // ── Inserting and erasing anywhere ───────────────────────────

    /// Insert the value returned by `make` at `pos`, shifting later
    /// elements right. Returns the position of the new element.
    ///
    /// With spare capacity, `make` runs first and the shift happens only
    /// once it has returned. Without, a block of `max(2 * capacity, len + 1)`
    /// slots is allocated, the new element is constructed at its final
    /// offset there, and the old elements are relocated around it. Either
    /// way a panicking `make` leaves the array unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is past the end. Debug builds also reject positions
    /// issued before the last capacity change.
    pub fn emplace<F>(&mut self, pos: Position, make: F) -> Position
    where
        F: FnOnce() -> T,
    {
        let index = self.resolve(pos);
        assert!(
            index <= self.len,
            "insertion {pos} out of range for length {}",
            self.len
        );
        if self.len == self.capacity() {
            self.grow_and_emplace(index, make);
        } else if index == self.len {
            let slot = self.block.offset_mut(index);
            // SAFETY: len < capacity and the slot is free.
            unsafe { slot.write(make()) };
            self.len += 1;
        } else {
            let value = make();
            let hole = self.block.offset_mut(index);
            // SAFETY: index < len < capacity, so shifting [index, len) one
            // slot right stays inside the block; slot `index` is then a
            // bitwise duplicate that gets overwritten without a drop.
            unsafe {
                ptr::copy(hole, hole.add(1), self.len - index);
                hole.write(value);
            }
            self.len += 1;
        }
        Position::new(index, self.epoch())
    }

    /// Insert `value` at `pos`. See [`emplace`](Self::emplace).
    pub fn insert(&mut self, pos: Position, value: T) -> Position {
        self.emplace(pos, || value)
    }

    /// Insert a clone of `value` at `pos`. See [`emplace`](Self::emplace).
    pub fn insert_cloned(&mut self, pos: Position, value: &T) -> Position
    where
        T: Clone,
    {
        self.emplace(pos, || value.clone())
    }

    /// Remove the element at `pos`, shifting later elements left, and
    /// return it.
    ///
    /// # Panics
    ///
    /// Panics if `pos` does not name a live element.
    pub fn remove(&mut self, pos: Position) -> T {
        let index = self.resolve(pos);
        assert!(
            index < self.len,
            "removal {pos} out of range for length {}",
            self.len
        );
        let hole = self.block.offset_mut(index);
        // SAFETY: index < len; the value is read out before the tail
        // [index + 1, len) slides over its slot.
        let value = unsafe {
            let value = hole.read();
            ptr::copy(hole.add(1), hole, self.len - index - 1);
            value
        };
        self.len -= 1;
        value
    }

    /// Drop the element at `pos`, shifting later elements left. Returns the
    /// position of the element that now occupies `pos` (the end position if
    /// the last element was erased).
    ///
    /// The array is consistent again before the erased element is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `pos` does not name a live element.
    pub fn erase(&mut self, pos: Position) -> Position {
        let index = pos.index;
        drop(self.remove(pos));
        Position::new(index, self.epoch())
    }

    // ── Whole-array moves ────────────────────────────────────────

    /// Move the contents out, leaving `self` empty with no storage.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Exchange contents and storage with `other`. Never allocates.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Take storage and length apart without dropping anything.
    pub(crate) fn into_parts(self) -> (RawBlock<T>, usize) {
        let mut this = mem::ManuallyDrop::new(self);
        (mem::take(&mut this.block), this.len)
    }
}

impl<T> Drop for SlotVec<T> {
    fn drop(&mut self) {
        // SAFETY: [0, len) are live; the block frees the memory afterwards.
        unsafe { drop_slots(self.block.offset_mut(0), self.len) };
    }
}

impl<T> Default for SlotVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for SlotVec<T> {
    /// A copy with capacity exactly `self.len()`.
    ///
    /// If a `clone()` panics, the copies made so far are dropped and the
    /// new storage is freed.
    fn clone(&self) -> Self {
        let mut copy = Self::with_capacity(self.len);
        // SAFETY: the fresh block has exactly `len` free slots.
        unsafe { clone_slots(self.as_slice(), copy.block.offset_mut(0)) };
        copy.len = self.len;
        copy
    }

    /// Copy-assign from `source`.
    ///
    /// If `source` does not fit in the current capacity, a full copy is
    /// built first and then swapped in, so a panic leaves `self` unchanged.
    /// Otherwise the existing storage is reused: the shared prefix is
    /// overwritten slot by slot with `clone_from`, then the remaining source
    /// elements are cloned in or the surplus elements dropped. A panic
    /// during the overwrite leaves `self` valid but partially updated.
    fn clone_from(&mut self, source: &Self) {
        if source.len > self.capacity() {
            let mut fresh = source.clone();
            self.block.swap(&mut fresh.block);
            mem::swap(&mut self.len, &mut fresh.len);
            self.bump_epoch();
            return;
        }
        let common = self.len.min(source.len);
        self.as_mut_slice()[..common].clone_from_slice(&source.as_slice()[..common]);
        if source.len > self.len {
            let tail = &source.as_slice()[self.len..];
            // SAFETY: source.len <= capacity, so [len, source.len) are free.
            unsafe { clone_slots(tail, self.block.offset_mut(self.len)) };
            self.len = source.len;
        } else {
            self.truncate(source.len);
        }
    }
}

impl<T> Deref for SlotVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for SlotVec<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> AsRef<[T]> for SlotVec<T> {
    fn as_ref(&self) -> &[T] {
        self
    }
}

impl<T> AsMut<[T]> for SlotVec<T> {
    fn as_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T> Index<usize> for SlotVec<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T> IndexMut<usize> for SlotVec<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<T> Index<Position> for SlotVec<T> {
    type Output = T;

    fn index(&self, pos: Position) -> &T {
        let index = self.resolve(pos);
        &self.as_slice()[index]
    }
}

impl<T> IndexMut<Position> for SlotVec<T> {
    fn index_mut(&mut self, pos: Position) -> &mut T {
        let index = self.resolve(pos);
        &mut self.as_mut_slice()[index]
    }
}

impl<'a, T> IntoIterator for &'a SlotVec<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut SlotVec<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T> Extend<T> for SlotVec<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        if let Some(wanted) = self.len.checked_add(lower) {
            if wanted > self.capacity() {
                self.reserve(wanted);
            }
        }
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T> FromIterator<T> for SlotVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut vec = Self::new();
        vec.extend(iter);
        vec
    }
}

impl<T, const N: usize> From<[T; N]> for SlotVec<T> {
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<T> From<Vec<T>> for SlotVec<T> {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }
}

impl<T: Clone> From<&[T]> for SlotVec<T> {
    fn from(values: &[T]) -> Self {
        let mut vec = Self::with_capacity(values.len());
        // SAFETY: the fresh block has exactly `values.len()` free slots.
        unsafe { clone_slots(values, vec.block.offset_mut(0)) };
        vec.len = values.len();
        vec
    }
}

impl<T: fmt::Debug> fmt::Debug for SlotVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Hash> Hash for SlotVec<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<T: PartialEq<U>, U> PartialEq<SlotVec<U>> for SlotVec<T> {
    fn eq(&self, other: &SlotVec<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for SlotVec<T> {}

impl<T: PartialEq<U>, U> PartialEq<[U]> for SlotVec<T> {
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq<U>, U> PartialEq<&[U]> for SlotVec<T> {
    fn eq(&self, other: &&[U]) -> bool {
        self.as_slice() == *other
    }
}

impl<T: PartialEq<U>, U, const N: usize> PartialEq<[U; N]> for SlotVec<T> {
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq<U>, U> PartialEq<Vec<U>> for SlotVec<T> {
    fn eq(&self, other: &Vec<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotvec_test_utils::{expect_panic, MoveOnly};

    #[test]
    fn new_is_empty_without_storage() {
        let v: SlotVec<u32> = SlotVec::new();
        assert_eq!(v.len(), 0);
        assert_eq!(v.capacity(), 0);
        assert!(v.is_empty());
        assert_eq!(v.begin(), v.end());
    }

    #[test]
    fn with_len_default_constructs() {
        let v: SlotVec<i32> = SlotVec::with_len(3);
        assert_eq!(v, [0, 0, 0]);
        assert_eq!(v.capacity(), 3);
    }

    #[test]
    fn with_capacity_holds_nothing() {
        let v: SlotVec<String> = SlotVec::with_capacity(10);
        assert!(v.is_empty());
        assert_eq!(v.capacity(), 10);
    }

    #[test]
    fn push_back_capacity_sequence() {
        let mut v = SlotVec::new();
        let mut capacities = vec![v.capacity()];
        for i in 0..5 {
            v.push_back(i);
            capacities.push(v.capacity());
        }
        assert_eq!(capacities, vec![0, 1, 2, 4, 4, 8]);
        assert_eq!(v.len(), 5);
        assert_eq!(v, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn push_back_cloned_uses_same_growth() {
        let mut v = SlotVec::new();
        let mut capacities = vec![];
        let s = String::from("x");
        for _ in 0..5 {
            v.push_back_cloned(&s);
            capacities.push(v.capacity());
        }
        assert_eq!(capacities, vec![1, 2, 4, 4, 8]);
        assert!(v.iter().all(|e| e == "x"));
    }

    #[test]
    fn emplace_back_returns_new_element() {
        let mut v = SlotVec::new();
        v.push_back(String::from("a"));
        let r = v.emplace_back(|| String::from("b"));
        r.push('!');
        assert_eq!(v, ["a", "b!"]);
    }

    #[test]
    fn pop_back_on_empty_is_none() {
        let mut v: SlotVec<u8> = SlotVec::new();
        assert_eq!(v.pop_back(), None);
        assert_eq!(v.len(), 0);
    }

    #[test]
    fn push_then_pop_restores_state() {
        let mut v: SlotVec<i32> = [1, 2, 3].into();
        v.push_back(99);
        assert_eq!(v.pop_back(), Some(99));
        assert_eq!(v, [1, 2, 3]);
    }

    #[test]
    fn reserve_smaller_is_noop() {
        let mut v: SlotVec<u64> = SlotVec::with_capacity(8);
        v.push_back(1);
        let ptr = v.as_ptr();
        v.reserve(4);
        v.reserve(8);
        assert_eq!(v.capacity(), 8);
        assert_eq!(v.as_ptr(), ptr);
    }

    #[test]
    fn reserve_relocates_exactly() {
        let mut v: SlotVec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        v.reserve(10);
        assert_eq!(v.capacity(), 10);
        assert_eq!(v, ["a", "b"]);
    }

    #[test]
    fn try_reserve_reports_overflow_and_keeps_contents() {
        let mut v: SlotVec<u64> = [1, 2].into();
        let cap = v.capacity();
        let err = v.try_reserve(usize::MAX).unwrap_err();
        assert_eq!(
            err,
            StorageError::CapacityOverflow {
                requested: usize::MAX
            }
        );
        assert_eq!(v, [1, 2]);
        assert_eq!(v.capacity(), cap);
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn reserve_overflow_panics() {
        let mut v: SlotVec<u64> = SlotVec::new();
        v.reserve(usize::MAX);
    }

    #[test]
    fn resize_scenario() {
        let mut v: SlotVec<i32> = SlotVec::with_len(3);
        assert_eq!(v, [0, 0, 0]);
        v.resize(5);
        assert_eq!(v, [0, 0, 0, 0, 0]);
        assert_eq!(v.capacity(), 5);
        v.resize(2);
        assert_eq!(v, [0, 0]);
        assert_eq!(v.capacity(), 5);
    }

    #[test]
    fn resize_shrink_keeps_prefix() {
        let mut v: SlotVec<i32> = [1, 2, 3, 4].into();
        v.resize(2);
        assert_eq!(v, [1, 2]);
    }

    #[test]
    fn resize_with_uses_closure() {
        let mut v: SlotVec<i32> = [1].into();
        let mut n = 10;
        v.resize_with(4, || {
            n += 1;
            n
        });
        assert_eq!(v, [1, 11, 12, 13]);
    }

    #[test]
    fn insert_at_begin_middle_end() {
        let mut v: SlotVec<char> = SlotVec::with_capacity(8);
        v.push_back('b');
        v.push_back('d');
        let p = v.insert(v.begin(), 'a');
        assert_eq!(p.index(), 0);
        let p = v.insert(v.position(2), 'c');
        assert_eq!(p.index(), 2);
        let p = v.insert(v.end(), 'e');
        assert_eq!(p.index(), 4);
        assert_eq!(v, ['a', 'b', 'c', 'd', 'e']);
        assert_eq!(v.capacity(), 8);
    }

    #[test]
    fn insert_with_reallocation() {
        let mut v: SlotVec<char> = SlotVec::with_capacity(3);
        v.push_back('A');
        v.push_back('B');
        v.push_back('C');
        let old = v.as_ptr();
        let p = v.insert(v.position(1), 'X');
        assert_eq!(v, ['A', 'X', 'B', 'C']);
        assert!(v.capacity() >= 4);
        assert_eq!(v.capacity(), 6);
        assert_ne!(v.as_ptr(), old);
        assert_eq!(v[p], 'X');
    }

    #[test]
    fn insert_into_empty_allocates_one() {
        let mut v = SlotVec::new();
        let p = v.insert(v.begin(), 7);
        assert_eq!(v, [7]);
        assert_eq!(v.capacity(), 1);
        assert_eq!(p.index(), 0);
    }

    #[test]
    fn insert_cloned_copies() {
        let mut v: SlotVec<String> = SlotVec::new();
        let s = String::from("z");
        v.insert_cloned(v.begin(), &s);
        v.insert_cloned(v.end(), &s);
        assert_eq!(v, ["z", "z"]);
        assert_eq!(s, "z");
    }

    #[test]
    fn erase_returns_following_position() {
        let mut v: SlotVec<char> = ['A', 'B', 'C'].into();
        let p = v.erase(v.position(1));
        assert_eq!(v, ['A', 'C']);
        assert_eq!(v[p], 'C');
    }

    #[test]
    fn write_through_returned_position() {
        let mut v: SlotVec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let p = v.insert(v.position(1), "x".to_string());
        v[p] = "y".to_string();
        v[p].push('!');
        assert_eq!(v, ["a", "y!", "b"]);

        let p = v.erase(v.begin());
        v[p] = "first".to_string();
        assert_eq!(v, ["first", "b"]);
    }

    #[test]
    fn erase_last_returns_end() {
        let mut v: SlotVec<i32> = [1, 2].into();
        let p = v.erase(v.position(1));
        assert_eq!(p, v.end());
    }

    #[test]
    fn erase_inverts_insert() {
        let mut v: SlotVec<i32> = [1, 2, 3].into();
        let p = v.insert(v.position(1), 9);
        let p = v.erase(p);
        assert_eq!(v, [1, 2, 3]);
        assert_eq!(v[p], 2);
    }

    #[test]
    fn remove_hands_back_element() {
        let mut v: SlotVec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let removed = v.remove(v.begin());
        assert_eq!(removed, "a");
        assert_eq!(v, ["b", "c"]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn erase_at_end_panics() {
        let mut v: SlotVec<i32> = [1].into();
        let end = v.end();
        v.erase(end);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn insert_past_end_panics() {
        let mut v: SlotVec<i32> = [1].into();
        let past = v.end().advance(1);
        v.insert(past, 0);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "stale")]
    fn stale_position_is_caught_in_debug() {
        let mut v: SlotVec<i32> = SlotVec::with_capacity(1);
        v.push_back(1);
        let first = v.begin();
        v.push_back(2); // reallocates
        let _ = v[first];
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn release_positions_carry_the_index_only() {
        let mut v: SlotVec<i32> = SlotVec::with_capacity(1);
        v.push_back(1);
        let first = v.begin();
        v.push_back(2); // reallocates
        assert_eq!(std::mem::size_of::<Position>(), std::mem::size_of::<usize>());
        assert_eq!(v[first], 1);
        let at = v.insert(first.advance(1), 5);
        assert_eq!(v[at], 5);
        assert_eq!(v, [1, 5, 2]);
    }

    #[test]
    fn positions_survive_non_reallocating_calls() {
        let mut v: SlotVec<i32> = SlotVec::with_capacity(4);
        v.push_back(1);
        let first = v.begin();
        v.push_back(2);
        v.reserve(2);
        assert_eq!(v[first], 1);
    }

    #[test]
    fn clone_is_exact_and_independent() {
        let mut source: SlotVec<String> = SlotVec::with_capacity(10);
        source.push_back("a".into());
        source.push_back("b".into());
        let mut copy = source.clone();
        assert_eq!(copy, source);
        assert_eq!(copy.capacity(), 2);
        assert_ne!(copy.as_ptr(), source.as_ptr());
        copy[0].push('!');
        assert_eq!(source[0], "a");
    }

    #[test]
    fn clone_from_larger_source_reallocates() {
        let mut target: SlotVec<i32> = [1].into();
        let source: SlotVec<i32> = [4, 5, 6].into();
        target.clone_from(&source);
        assert_eq!(target, [4, 5, 6]);
        assert_eq!(target.capacity(), 3);
    }

    #[test]
    fn clone_from_reuses_storage_when_it_fits() {
        let mut target: SlotVec<i32> = SlotVec::with_capacity(8);
        target.extend([1, 2]);
        let ptr = target.as_ptr();
        let source: SlotVec<i32> = [7, 8, 9, 10].into();
        target.clone_from(&source);
        assert_eq!(target, [7, 8, 9, 10]);
        assert_eq!(target.as_ptr(), ptr);

        let shorter: SlotVec<i32> = [3].into();
        target.clone_from(&shorter);
        assert_eq!(target, [3]);
        assert_eq!(target.capacity(), 8);
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut source: SlotVec<i32> = [1, 2, 3].into();
        let moved = source.take();
        assert_eq!(moved, [1, 2, 3]);
        assert_eq!(source.len(), 0);
        assert_eq!(source.capacity(), 0);
        source.push_back(4);
        assert_eq!(source, [4]);
    }

    #[test]
    fn swap_exchanges_everything() {
        let mut a: SlotVec<i32> = [1, 2].into();
        let mut b: SlotVec<i32> = SlotVec::with_capacity(7);
        a.swap(&mut b);
        assert!(a.is_empty());
        assert_eq!(a.capacity(), 7);
        assert_eq!(b, [1, 2]);
    }

    #[test]
    fn move_only_elements_relocate() {
        let mut v = SlotVec::new();
        for i in 0..10 {
            v.push_back(MoveOnly(i));
        }
        v.insert(v.begin(), MoveOnly(-1));
        assert_eq!(v[0], MoveOnly(-1));
        assert_eq!(v[10], MoveOnly(9));
    }

    #[test]
    fn zero_sized_elements() {
        let mut v = SlotVec::new();
        for _ in 0..5 {
            v.push_back(());
        }
        assert_eq!(v.len(), 5);
        assert_eq!(v.capacity(), 8);
        v.erase(v.begin());
        assert_eq!(v.len(), 4);
        assert_eq!(v.pop_back(), Some(()));
    }

    #[test]
    fn unchecked_access_reads_and_writes() {
        let mut v: SlotVec<i32> = [1, 2, 3].into();
        unsafe {
            *v.get_unchecked_mut(1) = 20;
            assert_eq!(*v.get_unchecked(1), 20);
        }
    }

    #[test]
    #[should_panic]
    fn index_out_of_range_panics() {
        let v: SlotVec<i32> = [1].into();
        let _ = v[1];
    }

    #[test]
    fn traversal_is_restartable() {
        let mut v: SlotVec<i32> = [1, 2, 3].into();
        let first: i32 = v.iter().sum();
        let second: i32 = (&v).into_iter().sum();
        assert_eq!(first, second);
        for x in &mut v {
            *x *= 2;
        }
        assert_eq!(v, [2, 4, 6]);
    }

    #[test]
    fn debug_lists_elements() {
        let v: SlotVec<i32> = [1, 2].into();
        assert_eq!(format!("{v:?}"), "[1, 2]");
    }

    #[test]
    fn from_slice_clones() {
        let data = [String::from("p"), String::from("q")];
        let v = SlotVec::from(&data[..]);
        assert_eq!(v, data);
        assert_eq!(v.capacity(), 2);
    }

    #[test]
    fn with_len_panic_frees_everything() {
        use slotvec_test_utils::FaultyDefault;
        FaultyDefault::arm(3);
        expect_panic(|| SlotVec::<FaultyDefault>::with_len(5));
        assert_eq!(FaultyDefault::live(), 0);
        FaultyDefault::disarm();
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Push(i32),
            Pop,
            Insert(usize, i32),
            Erase(usize),
            Reserve(usize),
            Resize(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                any::<i32>().prop_map(Op::Push),
                Just(Op::Pop),
                (any::<usize>(), any::<i32>()).prop_map(|(i, x)| Op::Insert(i, x)),
                any::<usize>().prop_map(Op::Erase),
                (0usize..64).prop_map(Op::Reserve),
                (0usize..64).prop_map(Op::Resize),
            ]
        }

        proptest! {
            #[test]
            fn matches_std_vec(ops in proptest::collection::vec(op(), 0..200)) {
                let mut ours: SlotVec<i32> = SlotVec::new();
                let mut model: Vec<i32> = Vec::new();
                for op in ops {
                    match op {
                        Op::Push(x) => {
                            ours.push_back(x);
                            model.push(x);
                        }
                        Op::Pop => {
                            prop_assert_eq!(ours.pop_back(), model.pop());
                        }
                        Op::Insert(i, x) => {
                            let i = i % (model.len() + 1);
                            let p = ours.insert(ours.position(i), x);
                            model.insert(i, x);
                            prop_assert_eq!(p.index(), i);
                        }
                        Op::Erase(i) => {
                            if !model.is_empty() {
                                let i = i % model.len();
                                ours.erase(ours.position(i));
                                model.remove(i);
                            }
                        }
                        Op::Reserve(n) => {
                            let before = ours.capacity();
                            ours.reserve(n);
                            prop_assert_eq!(ours.capacity(), before.max(n));
                        }
                        Op::Resize(n) => {
                            ours.resize(n);
                            model.resize(n, 0);
                        }
                    }
                    prop_assert!(ours.len() <= ours.capacity());
                    prop_assert_eq!(ours.as_slice(), model.as_slice());
                }
            }

            #[test]
            fn capacity_changes_only_when_full(values in proptest::collection::vec(any::<u8>(), 1..100)) {
                let mut v = SlotVec::new();
                for x in values {
                    let (len, cap) = (v.len(), v.capacity());
                    v.push_back(x);
                    if len < cap {
                        prop_assert_eq!(v.capacity(), cap);
                    } else {
                        prop_assert_eq!(v.capacity(), (2 * cap).max(len + 1));
                    }
                }
            }

            #[test]
            fn clone_from_matches_source(
                target in proptest::collection::vec(any::<i16>(), 0..20),
                extra_cap in 0usize..20,
                source in proptest::collection::vec(any::<i16>(), 0..40),
            ) {
                let mut ours: SlotVec<i16> = SlotVec::with_capacity(target.len() + extra_cap);
                ours.extend(target);
                let source: SlotVec<i16> = source.into();
                let cap_before = ours.capacity();
                ours.clone_from(&source);
                prop_assert_eq!(&ours, &source);
                if source.len() <= cap_before {
                    prop_assert_eq!(ours.capacity(), cap_before);
                }
            }
        }
    }
}
