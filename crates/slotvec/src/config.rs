//! Capacity growth parameters.

/// The capacity growth rule shared by every appending and inserting
/// operation.
///
/// When an append or insert finds the array full, the new capacity is
/// `max(GROWTH_FACTOR * capacity, required)`, where `required` is the
/// length after the operation. Starting from an empty array this gives the
/// sequence `0 → 1 → 2 → 4 → 8 …`.
///
/// This type carries no state; all values are associated constants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrowthPolicy;

impl GrowthPolicy {
    /// Multiplier applied to the current capacity when growing.
    pub const GROWTH_FACTOR: usize = 2;

    /// Smallest capacity a growing array ends up with.
    pub const MIN_NON_ZERO_CAPACITY: usize = 1;

    /// Capacity to allocate when `capacity` slots are not enough to hold
    /// `required` elements.
    ///
    /// Returns `None` if the multiplication overflows `usize`.
    pub fn next_capacity(capacity: usize, required: usize) -> Option<usize> {
        let doubled = capacity.checked_mul(Self::GROWTH_FACTOR)?;
        Some(doubled.max(required).max(Self::MIN_NON_ZERO_CAPACITY))
    }
}
