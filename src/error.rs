//! Error values for `RingBuffer` construction and checked access.

use thiserror::Error;

/// Errors raised by `RingBuffer` construction and checked access.
///
/// Construction errors mean no buffer came into existence. Access errors
/// leave the buffer untouched.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A capacity of zero was requested.
    #[error("ring buffer: invalid capacity 0 requested")]
    InvalidCapacity,

    /// The capacity is at or above `usize::MAX / 2`, where wraparound
    /// offsets could overflow.
    #[error("ring buffer: capacity {capacity} exceeds the limit usize::MAX / 2")]
    CapacityOverflowRisk {
        /// The rejected capacity.
        capacity: usize,
    },

    /// The element type is zero-sized.
    #[error("ring buffer: cannot allocate storage for a zero-sized type")]
    UnsupportedType,

    /// The allocator could not provide storage.
    #[error("ring buffer: failed to allocate storage for {capacity} elements")]
    AllocationFailure {
        /// The capacity the allocation was sized for.
        capacity: usize,
    },

    /// A logical index was not below the current length.
    #[error("ring buffer index out of bounds in {op}: the len is {len} but the index is {index}")]
    IndexOutOfRange {
        /// Name of the operation that performed the check.
        op: &'static str,
        /// The requested logical index.
        index: usize,
        /// The length at the time of the call.
        len: usize,
    },
}

/// Result alias for fallible `RingBuffer` operations.
pub type Result<T> = core::result::Result<T, Error>;
