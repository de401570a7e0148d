//! Wraparound arithmetic over physical slot indices.
//!
//! Slot `capacity - 1` is the last physical slot, not a past-the-end marker.

/// Physical slot reached by walking `addend` slots right of `index`.
///
/// Both operands stay below `capacity`, which is below `usize::MAX / 2`, so
/// the sum cannot overflow.
#[inline]
pub fn wrap_add(index: usize, addend: usize, capacity: usize) -> usize {
    debug_assert!(index < capacity);
    debug_assert!(addend <= capacity);
    (index + addend) % capacity
}

/// One slot to the right, wrapping from the last slot to the first.
#[inline]
pub fn step_right(index: usize, capacity: usize) -> usize {
    debug_assert!(index < capacity);
    if index == capacity - 1 {
        0
    } else {
        index + 1
    }
}

/// One slot to the left, wrapping from the first slot to the last.
#[inline]
pub fn step_left(index: usize, capacity: usize) -> usize {
    debug_assert!(index < capacity);
    if index == 0 {
        capacity - 1
    } else {
        index - 1
    }
}
