//! Raw, uninitialised element storage.
//!
//! A [`RawBlock`] owns one contiguous heap allocation sized for exactly
//! `capacity` values of `T`. It knows nothing about which slots hold live
//! values: constructing, dropping and tracking elements is the job of
//! [`SlotVec`](crate::vector::SlotVec). Dropping a block releases the memory
//! and never runs element destructors.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::ptr::NonNull;

use crate::error::StorageError;

/// An exclusively owned block of `capacity` uninitialised slots.
///
/// The block is move-only: it does not implement `Clone`, because copying
/// it would duplicate storage that may hold live values without any notion
/// of how to copy them.
///
/// An empty block (capacity 0) owns no allocation and holds a dangling
/// pointer. Blocks of zero-sized `T` never allocate either, but still report
/// the capacity they were created with.
pub struct RawBlock<T> {
    ptr: NonNull<T>,
    capacity: usize,
    _marker: PhantomData<T>,
}

// SAFETY: a RawBlock is a unique owner of its allocation, exactly like a
// Box<[MaybeUninit<T>]>, so it may cross threads whenever T may.
unsafe impl<T: Send> Send for RawBlock<T> {}
// SAFETY: shared access only hands out shared views of the slots.
unsafe impl<T: Sync> Sync for RawBlock<T> {}

impl<T> RawBlock<T> {
    /// An empty block that owns no memory.
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
            _marker: PhantomData,
        }
    }

    /// Allocate a block of exactly `capacity` uninitialised slots.
    ///
    /// # Panics
    ///
    /// Panics with `capacity overflow` if the byte size of the block does not
    /// fit in `isize::MAX`. Allocator failure is routed to
    /// [`std::alloc::handle_alloc_error`].
    pub fn allocate(capacity: usize) -> Self {
        match Self::try_allocate(capacity) {
            Ok(block) => block,
            Err(StorageError::CapacityOverflow { .. }) => capacity_overflow(),
            Err(StorageError::AllocationFailed { .. }) => match Layout::array::<T>(capacity) {
                Ok(layout) => alloc::handle_alloc_error(layout),
                Err(_) => capacity_overflow(),
            },
        }
    }

    /// Fallible twin of [`allocate`](Self::allocate).
    pub fn try_allocate(capacity: usize) -> Result<Self, StorageError> {
        if capacity == 0 {
            return Ok(Self::new());
        }
        let layout = Layout::array::<T>(capacity)
            .map_err(|_| StorageError::CapacityOverflow {
                requested: capacity,
            })?;
        if layout.size() == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                capacity,
                _marker: PhantomData,
            });
        }
        // SAFETY: the layout has a non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw.cast::<T>()).ok_or(StorageError::AllocationFailed {
            bytes: layout.size(),
            align: layout.align(),
        })?;
        Ok(Self {
            ptr,
            capacity,
            _marker: PhantomData,
        })
    }

    /// Release the allocation.
    ///
    /// Equivalent to dropping the block. Live values still sitting in the
    /// slots are leaked, not dropped; the caller must have dropped or moved
    /// them out beforehand.
    pub fn deallocate(self) {
        drop(self);
    }

    /// Number of slots in the block.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the block owns a heap allocation.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.capacity != 0 && mem::size_of::<T>() != 0
    }

    /// Bytes of element storage owned by the block.
    pub fn memory_bytes(&self) -> usize {
        self.capacity * mem::size_of::<T>()
    }

    /// Pointer to the first slot.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Mutable pointer to the first slot.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Address of slot `index`.
    ///
    /// `index == capacity` is allowed and yields the one-past-the-end
    /// address, which may be compared against but never dereferenced.
    #[inline]
    pub fn offset(&self, index: usize) -> *const T {
        debug_assert!(
            index <= self.capacity,
            "slot offset {index} past end of block with capacity {}",
            self.capacity
        );
        self.as_ptr().wrapping_add(index)
    }

    /// Mutable address of slot `index`. Same contract as [`offset`](Self::offset).
    #[inline]
    pub fn offset_mut(&mut self, index: usize) -> *mut T {
        debug_assert!(
            index <= self.capacity,
            "slot offset {index} past end of block with capacity {}",
            self.capacity
        );
        self.as_mut_ptr().wrapping_add(index)
    }

    /// Shared view of slot `index`.
    ///
    /// # Safety
    ///
    /// `index` must be less than [`capacity`](Self::capacity). The bound is
    /// only checked in debug builds.
    #[inline]
    pub unsafe fn slot(&self, index: usize) -> &MaybeUninit<T> {
        debug_assert!(
            index < self.capacity,
            "slot {index} out of range for capacity {}",
            self.capacity
        );
        // SAFETY: index < capacity per the caller, so the slot lies inside
        // the allocation; MaybeUninit<T> has the layout of T.
        unsafe { &*self.offset(index).cast::<MaybeUninit<T>>() }
    }

    /// Mutable view of slot `index`.
    ///
    /// # Safety
    ///
    /// Same as [`slot`](Self::slot).
    #[inline]
    pub unsafe fn slot_mut(&mut self, index: usize) -> &mut MaybeUninit<T> {
        debug_assert!(
            index < self.capacity,
            "slot {index} out of range for capacity {}",
            self.capacity
        );
        // SAFETY: as in `slot`; `&mut self` guarantees exclusivity.
        unsafe { &mut *self.offset_mut(index).cast::<MaybeUninit<T>>() }
    }

    /// Exchange allocations and capacities with `other`.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }
}

impl<T> Default for RawBlock<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for RawBlock<T> {
    fn drop(&mut self) {
        if !self.is_allocated() {
            return;
        }
        // SAFETY: the same size and alignment were accepted by
        // Layout::array when the block was allocated.
        let layout = unsafe {
            Layout::from_size_align_unchecked(
                mem::size_of::<T>() * self.capacity,
                mem::align_of::<T>(),
            )
        };
        // SAFETY: ptr came from alloc::alloc with this exact layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout) };
    }
}

impl<T> fmt::Debug for RawBlock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBlock")
            .field("capacity", &self.capacity)
            .field("allocated", &self.is_allocated())
            .finish()
    }
}

#[cold]
#[inline(never)]
pub(crate) fn capacity_overflow() -> ! {
    panic!("capacity overflow");
}
