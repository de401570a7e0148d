//! A heap-allocated circular buffer with a fixed capacity.
//!
//! The buffer owns one allocation sized for exactly `capacity` elements and
//! never reallocates. Pushing and popping at either end is `O(1)`, and so is
//! indexing by logical position. Elements are not required to be copyable or
//! default-constructible: a slot only holds a value while it is part of the
//! logical range.
//!
//! When the buffer is full, pushing overwrites: `push_back` evicts the front
//! element and `push_front` evicts the back element. This makes it a natural
//! fit for sliding windows and history buffers.
//!
//! # Feature Flags
//! The **ringdeque** crate has the following cargo feature flags:
//!
//! - `std`
//!   - Optional, enabled by default
//!   - Use libstd; without it the crate only needs `core` and `alloc`
//!
//! # Usage
//!
//! First, add the following to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! ringdeque = "0.1"
//! ```
//!
//! To use it in a `#![no_std]` crate:
//!
//! ```toml
//! [dependencies]
//! ringdeque = { version = "0.1", default-features = false }
//! ```
//!
//! # Examples
//! ```
//! use ringdeque::RingBuffer;
//!
//! let mut history = RingBuffer::new(3)?;
//! history.push_back(1);
//! history.push_back(2);
//! history.push_back(3);
//! history.push_back(4);
//!
//! assert_eq!(history.len(), 3);
//! assert_eq!(history.front(), Ok(&2));
//! assert_eq!(history.back(), Ok(&4));
//! # Ok::<(), ringdeque::Error>(())
//! ```
//!
//! # Both ends
//! ```
//! use ringdeque::RingBuffer;
//!
//! let mut ring = RingBuffer::new(10)?;
//! for i in 0..5 {
//!     ring.push_front(2 * i);
//!     ring.push_back(2 * i + 1);
//! }
//!
//! let order: Vec<_> = ring.iter().copied().collect();
//! assert_eq!(order, vec![8, 6, 4, 2, 0, 1, 3, 5, 7, 9]);
//! # Ok::<(), ringdeque::Error>(())
//! ```
//!
//! # Cursors
//! ```
//! use ringdeque::RingBuffer;
//!
//! let mut ring = RingBuffer::new(4)?;
//! ring.extend(vec![10, 20]);
//!
//! let mut cursor = ring.begin();
//! assert_eq!(cursor.get(), Ok(&10));
//! cursor.move_next();
//! cursor.move_next();
//! assert!(cursor == ring.end());
//! assert!(cursor.get().is_err());
//! # Ok::<(), ringdeque::Error>(())
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![deny(missing_docs)]

extern crate alloc;

use core::alloc::Layout;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::mem;
use core::ops::{Index, IndexMut};
use core::ptr::{self, NonNull};

use log::{debug, trace};

mod allocator;
mod cursor;
pub mod error;
mod utils;

pub use allocator::{Global, RawAlloc};
pub use cursor::{Cursor, CursorMut, IntoIter, Iter, IterMut};
pub use error::{Error, Result};
use utils::{step_left, step_right, wrap_add};

/// A fixed capacity ring buffer on the heap.
///
/// The "default" usage of this type as a queue is to use `push_back` to add to
/// the queue, and `pop_front` to remove from the queue. `extend` pushes onto
/// the back in this manner, and iterating over `RingBuffer` goes front to
/// back.
///
/// # Overwriting
///
/// Pushing into a full buffer is not an error. `push_back` destroys the front
/// element to make room and `push_front` destroys the back element; the length
/// stays at `capacity()`.
///
/// # Layout
///
/// `begin` is the physical slot of the front element and `last` the physical
/// slot of the back element (inclusive, not past-the-end). For a non-empty
/// buffer, stepping right from `begin` `len - 1` times lands on `last`, and
/// exactly the slots on that walk hold live values.
pub struct RingBuffer<T, A: RawAlloc = Global> {
    ptr: NonNull<T>,
    layout: Layout,
    capacity: usize,
    len: usize,
    begin: usize,
    last: usize,
    alloc: A,
    marker: PhantomData<T>,
}

unsafe impl<T: Send, A: RawAlloc + Send> Send for RingBuffer<T, A> {}
unsafe impl<T: Sync, A: RawAlloc + Sync> Sync for RingBuffer<T, A> {}

impl<T> RingBuffer<T> {
    /// Creates an empty `RingBuffer` with room for `capacity` elements, using
    /// the global allocator.
    ///
    /// # Errors
    ///
    /// See [`with_capacity_in`](RingBuffer::with_capacity_in).
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::{Error, RingBuffer};
    ///
    /// let ring: RingBuffer<u32> = RingBuffer::new(8)?;
    /// assert_eq!(ring.capacity(), 8);
    /// assert_eq!(ring.len(), 0);
    ///
    /// assert_eq!(RingBuffer::<u32>::new(0).err(), Some(Error::InvalidCapacity));
    /// # Ok::<(), ringdeque::Error>(())
    /// ```
    #[inline]
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_capacity_in(capacity, Global)
    }
}

impl<T, A: RawAlloc> RingBuffer<T, A> {
    /// Creates an empty `RingBuffer` with room for `capacity` elements, taking
    /// its storage from `alloc`.
    ///
    /// The storage is allocated once, here, and no element is constructed.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCapacity`] if `capacity` is zero.
    /// - [`Error::CapacityOverflowRisk`] if `capacity >= usize::MAX / 2`.
    /// - [`Error::UnsupportedType`] if `T` is zero-sized.
    /// - [`Error::AllocationFailure`] if `alloc` cannot provide the storage.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self> {
        let layout = Self::storage_layout(capacity).map_err(|err| {
            debug!("ring buffer construction rejected: {}", err);
            err
        })?;

        let ptr = match alloc.allocate(layout) {
            Some(ptr) => ptr.cast::<T>(),
            None => {
                let err = Error::AllocationFailure { capacity };
                debug!("{}", err);
                return Err(err);
            }
        };
        trace!(
            "allocated ring buffer storage: {} slots, {} bytes",
            capacity,
            layout.size()
        );

        Ok(RingBuffer {
            ptr,
            layout,
            capacity,
            len: 0,
            begin: 0,
            last: 0,
            alloc,
            marker: PhantomData,
        })
    }

    fn storage_layout(capacity: usize) -> Result<Layout> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity);
        }
        if capacity >= usize::MAX / 2 {
            return Err(Error::CapacityOverflowRisk { capacity });
        }
        if mem::size_of::<T>() == 0 {
            return Err(Error::UnsupportedType);
        }
        Layout::array::<T>(capacity).map_err(|_| Error::AllocationFailure { capacity })
    }

    #[inline]
    fn slot_ptr(&self, slot: usize) -> *mut T {
        debug_assert!(slot < self.capacity);
        unsafe { self.ptr.as_ptr().add(slot) }
    }

    /// Physical slot of the element at logical `index`.
    #[inline]
    fn physical(&self, index: usize) -> usize {
        wrap_add(self.begin, index, self.capacity)
    }

    #[inline]
    unsafe fn buffer_read(&mut self, slot: usize) -> T {
        ptr::read(self.slot_ptr(slot))
    }

    #[inline]
    unsafe fn buffer_write(&mut self, slot: usize, element: T) {
        ptr::write(self.slot_ptr(slot), element);
    }

    #[inline]
    pub(crate) fn checked(&self, index: usize, op: &'static str) -> Result<usize> {
        if index < self.len {
            Ok(self.physical(index))
        } else {
            Err(Error::IndexOutOfRange {
                op,
                index,
                len: self.len,
            })
        }
    }

    #[inline]
    pub(crate) fn checked_ref(&self, index: usize, op: &'static str) -> Result<&T> {
        let slot = self.checked(index, op)?;
        Ok(unsafe { &*self.slot_ptr(slot) })
    }

    #[inline]
    pub(crate) fn checked_mut(&mut self, index: usize, op: &'static str) -> Result<&mut T> {
        let slot = self.checked(index, op)?;
        Ok(unsafe { &mut *self.slot_ptr(slot) })
    }

    #[inline]
    fn back_index(&self) -> usize {
        if self.len == 0 {
            0
        } else {
            self.len - 1
        }
    }

    /// Returns the maximum number of elements the buffer holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of elements in the buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut v = RingBuffer::new(4)?;
    /// assert_eq!(v.len(), 0);
    /// v.push_back(1);
    /// assert_eq!(v.len(), 1);
    /// # Ok::<(), ringdeque::Error>(())
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Same as [`len`](RingBuffer::len).
    #[inline]
    pub fn size(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if the next push will overwrite an element.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Returns the allocator backing this buffer.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Adds an element to the back of the buffer.
    ///
    /// If the buffer is full, the front element is dropped to make room.
    ///
    /// # Examples
    ///
    /// ```text
    /// [_, _, _] <-(+)- 1 => [1, _, _]
    /// [1, _, _] <-(+)- 2 => [1, 2, _]
    /// [1, 2, _] <-(+)- 3 => [1, 2, 3]
    /// [1, 2, 3] <-(+)- 4 => [2, 3, 4]
    /// ```
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut ring = RingBuffer::new(3)?;
    /// ring.extend(1..=4);
    /// assert_eq!(ring.front(), Ok(&2));
    /// assert_eq!(ring.back(), Ok(&4));
    /// # Ok::<(), ringdeque::Error>(())
    /// ```
    pub fn push_back(&mut self, element: T) {
        if self.len == 0 {
            self.begin = self.last;
            unsafe { self.buffer_write(self.last, element) };
            self.len = 1;
            return;
        }

        self.last = step_right(self.last, self.capacity);
        if self.len == self.capacity {
            // the new last slot is the one holding the front element
            let evicted = unsafe { self.buffer_read(self.begin) };
            self.begin = step_right(self.begin, self.capacity);
            unsafe { self.buffer_write(self.last, element) };
            trace!("ring buffer full, evicted front element");
            drop(evicted);
        } else {
            unsafe { self.buffer_write(self.last, element) };
            self.len += 1;
        }
    }

    /// Constructs an element from `make` and adds it to the back.
    ///
    /// `make` runs before the buffer is touched, so a panic inside it leaves
    /// the buffer unchanged.
    #[inline]
    pub fn emplace_back<F>(&mut self, make: F)
    where
        F: FnOnce() -> T,
    {
        let element = make();
        self.push_back(element);
    }

    /// Adds an element to the front of the buffer.
    ///
    /// If the buffer is full, the back element is dropped to make room.
    ///
    /// # Examples
    ///
    /// ```text
    /// 1 -(+)-> [_, _, _] => [1, _, _]
    /// 2 -(+)-> [1, _, _] => [2, 1, _]
    /// 3 -(+)-> [2, 1, _] => [3, 2, 1]
    /// 4 -(+)-> [3, 2, 1] => [4, 3, 2]
    /// ```
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut ring = RingBuffer::new(3)?;
    /// for i in 1..=4 {
    ///     ring.push_front(i);
    /// }
    /// assert_eq!(ring.front(), Ok(&4));
    /// assert_eq!(ring.back(), Ok(&2));
    /// # Ok::<(), ringdeque::Error>(())
    /// ```
    pub fn push_front(&mut self, element: T) {
        if self.len == 0 {
            self.last = self.begin;
            unsafe { self.buffer_write(self.begin, element) };
            self.len = 1;
            return;
        }

        self.begin = step_left(self.begin, self.capacity);
        if self.len == self.capacity {
            // the new begin slot is the one holding the back element
            let evicted = unsafe { self.buffer_read(self.last) };
            self.last = step_left(self.last, self.capacity);
            unsafe { self.buffer_write(self.begin, element) };
            trace!("ring buffer full, evicted back element");
            drop(evicted);
        } else {
            unsafe { self.buffer_write(self.begin, element) };
            self.len += 1;
        }
    }

    /// Constructs an element from `make` and adds it to the front.
    #[inline]
    pub fn emplace_front<F>(&mut self, make: F)
    where
        F: FnOnce() -> T,
    {
        let element = make();
        self.push_front(element);
    }

    /// Drops the front element.
    ///
    /// Returns `false`, and does nothing, if the buffer is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut ring = RingBuffer::new(3)?;
    /// assert!(!ring.pop_front());
    /// ring.push_back(1);
    /// ring.push_back(2);
    /// assert!(ring.pop_front());
    /// assert_eq!(ring.front(), Ok(&2));
    /// # Ok::<(), ringdeque::Error>(())
    /// ```
    pub fn pop_front(&mut self) -> bool {
        if self.len == 0 {
            return false;
        }
        let slot = self.begin;
        self.begin = step_right(slot, self.capacity);
        self.len -= 1;
        unsafe { ptr::drop_in_place(self.slot_ptr(slot)) };
        true
    }

    /// Drops the back element.
    ///
    /// Returns `false`, and does nothing, if the buffer is empty.
    pub fn pop_back(&mut self) -> bool {
        if self.len == 0 {
            return false;
        }
        let slot = self.last;
        self.last = step_left(slot, self.capacity);
        self.len -= 1;
        unsafe { ptr::drop_in_place(self.slot_ptr(slot)) };
        true
    }

    /// Removes the front element and returns it, or `None` if the buffer is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut ring = RingBuffer::new(2)?;
    /// ring.push_back(String::from("a"));
    /// assert_eq!(ring.take_front().as_deref(), Some("a"));
    /// assert_eq!(ring.take_front(), None);
    /// # Ok::<(), ringdeque::Error>(())
    /// ```
    pub fn take_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let slot = self.begin;
        self.begin = step_right(slot, self.capacity);
        self.len -= 1;
        unsafe { Some(self.buffer_read(slot)) }
    }

    /// Removes the back element and returns it, or `None` if the buffer is
    /// empty.
    pub fn take_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let slot = self.last;
        self.last = step_left(slot, self.capacity);
        self.len -= 1;
        unsafe { Some(self.buffer_read(slot)) }
    }

    /// Returns the element at logical `index`, counting from the front.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index >= len()`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut ring = RingBuffer::new(4)?;
    /// ring.extend(vec![3, 4, 5]);
    /// assert_eq!(ring.at(1), Ok(&4));
    /// assert!(ring.at(3).is_err());
    /// # Ok::<(), ringdeque::Error>(())
    /// ```
    #[inline]
    pub fn at(&self, index: usize) -> Result<&T> {
        self.checked_ref(index, "at")
    }

    /// Mutable version of [`at`](RingBuffer::at).
    #[inline]
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        self.checked_mut(index, "at_mut")
    }

    /// Retrieves an element by logical index, or `None` if it is out of range.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.checked_ref(index, "get").ok()
    }

    /// Retrieves an element mutably by logical index, or `None` if it is out
    /// of range.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.checked_mut(index, "get_mut").ok()
    }

    /// Returns the front element.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if the buffer is empty.
    #[inline]
    pub fn front(&self) -> Result<&T> {
        self.checked_ref(0, "front")
    }

    /// Mutable version of [`front`](RingBuffer::front).
    #[inline]
    pub fn front_mut(&mut self) -> Result<&mut T> {
        self.checked_mut(0, "front_mut")
    }

    /// Returns the back element.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if the buffer is empty.
    #[inline]
    pub fn back(&self) -> Result<&T> {
        self.checked_ref(self.back_index(), "back")
    }

    /// Mutable version of [`back`](RingBuffer::back).
    #[inline]
    pub fn back_mut(&mut self) -> Result<&mut T> {
        let index = self.back_index();
        self.checked_mut(index, "back_mut")
    }

    /// Drops every element, front to back, and rewinds both cursors to the
    /// first slot. The storage is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut v = RingBuffer::new(4)?;
    /// v.push_back(1);
    /// v.clear();
    /// assert!(v.is_empty());
    /// assert_eq!(v.capacity(), 4);
    /// # Ok::<(), ringdeque::Error>(())
    /// ```
    pub fn clear(&mut self) {
        if mem::needs_drop::<T>() {
            while self.pop_front() {}
        } else {
            self.len = 0;
        }
        self.begin = 0;
        self.last = 0;
    }

    /// Returns a read-only cursor at the front element.
    #[inline]
    pub fn begin(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, 0)
    }

    /// Returns a read-only cursor one past the back element.
    ///
    /// It does not dereference.
    #[inline]
    pub fn end(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, self.len)
    }

    /// Returns a mutable cursor at the front element.
    #[inline]
    pub fn begin_mut(&mut self) -> CursorMut<'_, T, A> {
        CursorMut::new(self, 0)
    }

    /// Returns a mutable cursor one past the back element.
    #[inline]
    pub fn end_mut(&mut self) -> CursorMut<'_, T, A> {
        let len = self.len;
        CursorMut::new(self, len)
    }

    /// Returns a front-to-back iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut ring = RingBuffer::new(4)?;
    /// ring.push_back(5);
    /// ring.push_back(3);
    /// ring.push_back(4);
    /// let b: &[_] = &[&5, &3, &4];
    /// let c: Vec<&i32> = ring.iter().collect();
    /// assert_eq!(&c[..], b);
    /// # Ok::<(), ringdeque::Error>(())
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<'_, T, A> {
        Iter::new(self)
    }

    /// Returns a front-to-back iterator that returns mutable references.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut ring = RingBuffer::new(4)?;
    /// ring.extend(vec![5, 3, 4]);
    /// for num in ring.iter_mut() {
    ///     *num -= 2;
    /// }
    /// assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
    /// # Ok::<(), ringdeque::Error>(())
    /// ```
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.ptr, self.capacity, self.begin, self.len)
    }
}

impl<T: Clone, A: RawAlloc + Clone> RingBuffer<T, A> {
    /// Copies the buffer into fresh storage from a clone of its allocator.
    ///
    /// Elements are cloned front to back and pushed onto the back of the
    /// copy, so the copy starts at the first physical slot whatever the
    /// layout of `self`. If an element's `clone` panics, the partial copy is
    /// dropped and its storage released.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] if the allocator cannot provide storage.
    pub fn try_clone(&self) -> Result<Self> {
        let mut copy = Self::with_capacity_in(self.capacity, self.alloc.clone())?;
        for element in self.iter() {
            copy.push_back(element.clone());
        }
        Ok(copy)
    }
}

impl<T: Clone, A: RawAlloc + Clone> Clone for RingBuffer<T, A> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(_) => alloc::alloc::handle_alloc_error(self.layout),
        }
    }
}

impl<T, A: RawAlloc> Drop for RingBuffer<T, A> {
    fn drop(&mut self) {
        self.clear();
        unsafe { self.alloc.deallocate(self.ptr.cast(), self.layout) };
        trace!("released ring buffer storage: {} slots", self.capacity);
    }
}

impl<T: PartialEq, A: RawAlloc, B: RawAlloc> PartialEq<RingBuffer<T, B>> for RingBuffer<T, A> {
    fn eq(&self, other: &RingBuffer<T, B>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, A: RawAlloc> Eq for RingBuffer<T, A> {}

#[cfg(test)]
impl<T: PartialEq, A: RawAlloc> PartialEq<Vec<T>> for RingBuffer<T, A> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(l, r)| l == r)
    }
}

impl<T: Hash, A: RawAlloc> Hash for RingBuffer<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T, A: RawAlloc> Index<usize> for RingBuffer<T, A> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        match self.checked_ref(index, "index") {
            Ok(element) => element,
            Err(err) => panic!("{}", err),
        }
    }
}

impl<T, A: RawAlloc> IndexMut<usize> for RingBuffer<T, A> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        match self.checked_mut(index, "index_mut") {
            Ok(element) => element,
            Err(err) => panic!("{}", err),
        }
    }
}

/// Extend the `RingBuffer` with an iterator.
///
/// Every element is pushed onto the back; once the buffer is full the oldest
/// elements are overwritten.
impl<T, A: RawAlloc> Extend<T> for RingBuffer<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.push_back(element);
        }
    }
}

impl<T, A: RawAlloc> IntoIterator for RingBuffer<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a RingBuffer<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a mut RingBuffer<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: fmt::Debug, A: RawAlloc> fmt::Debug for RingBuffer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::allocator::testing::{Counting, Refusing};
    use super::*;
    use std::cell::Cell;
    use std::collections::hash_map::DefaultHasher;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Bump<'a>(&'a Cell<i32>);

    impl<'a> Drop for Bump<'a> {
        fn drop(&mut self) {
            let n = self.0.get();
            self.0.set(n + 1);
        }
    }

    #[test]
    fn fresh_buffers_are_empty() {
        #[allow(dead_code)]
        struct Mixed {
            x: f64,
            y: i32,
            z: f32,
        }

        let a = RingBuffer::<i32>::new(1).unwrap();
        assert_eq!((a.len(), a.capacity()), (0, 1));
        let b = RingBuffer::<bool>::new(10).unwrap();
        assert_eq!((b.size(), b.capacity()), (0, 10));
        let c = RingBuffer::<f64>::new(1000).unwrap();
        assert_eq!((c.len(), c.capacity()), (0, 1000));
        let d = RingBuffer::<Mixed>::new(10000).unwrap();
        assert_eq!((d.len(), d.capacity()), (0, 10000));
        assert!(d.is_empty());
        assert!(!d.is_full());
    }

    #[test]
    fn construction_errors() {
        assert_eq!(RingBuffer::<u8>::new(0).err(), Some(Error::InvalidCapacity));
        assert_eq!(
            RingBuffer::<u8>::new(usize::MAX / 2).err(),
            Some(Error::CapacityOverflowRisk { capacity: usize::MAX / 2 })
        );
        assert_eq!(
            RingBuffer::<u8>::new(usize::MAX).err(),
            Some(Error::CapacityOverflowRisk { capacity: usize::MAX })
        );
        assert_eq!(RingBuffer::<()>::new(4).err(), Some(Error::UnsupportedType));
        assert_eq!(
            RingBuffer::<u8, _>::with_capacity_in(4, Refusing).err(),
            Some(Error::AllocationFailure { capacity: 4 })
        );
        // the layout itself cannot be described
        assert_eq!(
            RingBuffer::<u64>::new(usize::MAX / 4).err(),
            Some(Error::AllocationFailure { capacity: usize::MAX / 4 })
        );
    }

    #[test]
    fn no_default_constructor_needed() {
        #[allow(dead_code)]
        struct Opaque {
            _x: i32,
        }
        let ring = RingBuffer::<Opaque>::new(10).unwrap();
        assert!(ring.is_empty());
    }

    #[test]
    fn push_back_then_at() {
        let mut ring = RingBuffer::new(3).unwrap();

        ring.push_back(0);
        assert_eq!(ring.at(0), Ok(&0));
        for i in 1..4 {
            assert!(ring.at(i).is_err());
        }

        ring.push_back(1);
        ring.push_back(2);
        assert_eq!(ring, vec![0, 1, 2]);
        assert_eq!(
            ring.at(3),
            Err(Error::IndexOutOfRange { op: "at", index: 3, len: 3 })
        );

        ring.push_back(3);
        assert_eq!(ring, vec![1, 2, 3]);
        assert!(ring.at(3).is_err());
    }

    #[test]
    fn push_front_then_at() {
        let mut ring = RingBuffer::new(3).unwrap();

        ring.push_front(0);
        assert_eq!(ring, vec![0]);
        ring.push_front(1);
        assert_eq!(ring, vec![1, 0]);
        ring.push_front(2);
        assert_eq!(ring, vec![2, 1, 0]);
        ring.push_front(3);
        assert_eq!(ring, vec![3, 2, 1]);
        assert!(ring.at(3).is_err());
    }

    #[test]
    fn overflow_evicts_oldest() {
        let capacity = 5;
        let mut back = RingBuffer::new(capacity).unwrap();
        let mut front = RingBuffer::new(capacity).unwrap();
        for i in 0..=capacity {
            back.push_back(i);
            front.push_front(i);
        }
        assert_eq!(back, (1..=capacity).collect::<Vec<_>>());
        assert_eq!(front, (1..=capacity).rev().collect::<Vec<_>>());
        assert!(back.is_full());
        assert_eq!(front.len(), capacity);
    }

    #[test]
    fn interleaved_ends() {
        let mut ring = RingBuffer::new(10).unwrap();
        for i in 0..5 {
            ring.push_front(2 * i);
            ring.push_back(2 * i + 1);
        }
        assert_eq!(ring, vec![8, 6, 4, 2, 0, 1, 3, 5, 7, 9]);

        // one more on each end wraps both cursors past each other's old spots
        ring.push_front(10);
        assert_eq!(ring, vec![10, 8, 6, 4, 2, 0, 1, 3, 5, 7]);
        ring.push_back(11);
        assert_eq!(ring, vec![8, 6, 4, 2, 0, 1, 3, 5, 7, 11]);
    }

    #[test]
    fn capacity_one() {
        let mut ring = RingBuffer::new(1).unwrap();
        ring.push_back('a');
        ring.push_back('b');
        assert_eq!(ring, vec!['b']);
        ring.push_front('c');
        assert_eq!(ring, vec!['c']);
        assert!(ring.pop_back());
        assert!(!ring.pop_front());
        ring.push_front('d');
        assert_eq!(ring.front(), Ok(&'d'));
        assert_eq!(ring.back(), Ok(&'d'));
    }

    #[test]
    fn pop_empty() {
        let mut ring = RingBuffer::<i32>::new(3).unwrap();
        assert!(!ring.pop_front());
        assert!(!ring.pop_back());
        assert_eq!(ring.len(), 0);

        ring.push_back(1);
        assert!(ring.pop_front());
        assert!(ring.is_empty());
        assert!(!ring.pop_front());
        assert!(!ring.pop_back());
        assert_eq!(ring.take_front(), None);
        assert_eq!(ring.take_back(), None);
    }

    #[test]
    fn refill_after_draining() {
        let mut ring = RingBuffer::new(4).unwrap();
        ring.extend(0..3);
        assert!(ring.pop_front());
        assert!(ring.pop_front());
        assert!(ring.pop_front());

        // the cursors were left mid-storage
        ring.push_back(7);
        assert_eq!(ring.front(), Ok(&7));
        assert_eq!(ring.back(), Ok(&7));
        ring.push_front(6);
        assert_eq!(ring, vec![6, 7]);

        assert!(ring.pop_back());
        assert!(ring.pop_back());
        ring.push_front(5);
        ring.push_back(8);
        assert_eq!(ring, vec![5, 8]);
    }

    #[test]
    fn front_and_back() {
        let mut ring = RingBuffer::new(3).unwrap();
        assert_eq!(
            ring.front(),
            Err(Error::IndexOutOfRange { op: "front", index: 0, len: 0 })
        );
        assert_eq!(
            ring.back(),
            Err(Error::IndexOutOfRange { op: "back", index: 0, len: 0 })
        );

        ring.push_back(1);
        assert_eq!((ring.front(), ring.back()), (Ok(&1), Ok(&1)));
        ring.push_back(2);
        assert_eq!((ring.front(), ring.back()), (Ok(&1), Ok(&2)));
        ring.push_back(3);
        assert_eq!((ring.front(), ring.back()), (Ok(&1), Ok(&3)));
        ring.push_back(4);
        assert_eq!((ring.front(), ring.back()), (Ok(&2), Ok(&4)));

        *ring.front_mut().unwrap() = 20;
        *ring.back_mut().unwrap() = 40;
        *ring.at_mut(1).unwrap() = 30;
        assert_eq!(ring, vec![20, 30, 40]);
    }

    #[test]
    fn index() {
        let mut ring = RingBuffer::new(4).unwrap();
        ring.push_back(1);
        ring.push_back(2);
        ring.push_back(3);
        assert_eq!(ring[0], 1);
        // pop_front 1 <- [2, 3]
        assert!(ring.pop_front());
        assert_eq!(ring[0], 2);
        assert_eq!(ring.len(), 2);
        // push_front 0 -> [0, 2, 3]
        ring.push_front(0);
        assert_eq!(ring[0], 0);
        // [0, 2] -> 3 pop_back
        assert_eq!(ring.take_back(), Some(3));
        assert_eq!(ring[1], 2);
        ring[1] = 9;
        assert_eq!(ring.get(1), Some(&9));
        assert_eq!(ring.get(2), None);
        assert_eq!(ring.get_mut(2), None);
    }

    #[test]
    #[should_panic(expected = "out of bounds in index")]
    fn index_overflow() {
        let mut ring = RingBuffer::new(4).unwrap();
        ring.push_back(1);
        ring.push_back(2);
        let _ = ring[2];
    }

    #[test]
    fn failed_access_leaves_state() {
        let mut ring = RingBuffer::new(2).unwrap();
        ring.push_back(1);
        assert!(ring.at(5).is_err());
        assert!(ring.at_mut(1).is_err());
        assert_eq!(ring, vec![1]);
    }

    #[test]
    fn clear_keeps_storage() {
        let mut ring = RingBuffer::new(3).unwrap();
        ring.extend(0..5);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), 3);
        assert!(ring.front().is_err());
        ring.push_back(10);
        ring.push_front(9);
        assert_eq!(ring, vec![9, 10]);
    }

    #[test]
    fn drop_counts() {
        let flag = &Cell::new(0);

        {
            let mut ring = RingBuffer::new(128).unwrap();
            ring.push_back(Bump(flag));
            ring.push_back(Bump(flag));
        }
        assert_eq!(flag.get(), 2);

        flag.set(0);
        {
            let mut ring = RingBuffer::new(4).unwrap();
            ring.push_back(vec![Bump(flag)]);
            ring.push_back(vec![Bump(flag), Bump(flag)]);
            ring.push_back(vec![]);
            ring.push_back(vec![Bump(flag)]);
            assert_eq!(flag.get(), 0);
            assert!(ring.pop_back());
            assert_eq!(flag.get(), 1);
            assert!(ring.pop_back());
            assert_eq!(flag.get(), 1);
            drop(ring.take_front());
            assert_eq!(flag.get(), 2);
        }
        assert_eq!(flag.get(), 4);
    }

    #[test]
    fn emplace_drops_each_element_once() {
        let flag = &Cell::new(0);
        let capacity = 2;
        let extra = 3;

        let mut ring = RingBuffer::new(capacity).unwrap();
        for _ in 0..capacity + extra {
            ring.emplace_back(|| Bump(flag));
        }
        assert_eq!(flag.get(), extra as i32);

        ring.emplace_front(|| Bump(flag));
        assert_eq!(flag.get(), extra as i32 + 1);

        ring.clear();
        assert_eq!(flag.get(), (capacity + extra + 1) as i32);
        drop(ring);
        assert_eq!(flag.get(), (capacity + extra + 1) as i32);
    }

    #[test]
    fn destruction_drops_remaining() {
        let flag = &Cell::new(0);
        {
            let mut ring = RingBuffer::new(3).unwrap();
            for _ in 0..7 {
                ring.push_front(Bump(flag));
            }
            assert_eq!(flag.get(), 4);
        }
        assert_eq!(flag.get(), 7);
    }

    #[test]
    fn storage_released_once() {
        let counting = Counting::default();
        {
            let mut ring = RingBuffer::with_capacity_in(4, &counting).unwrap();
            ring.extend(0..9);
            assert_eq!(counting.allocations.get(), 1);

            let copy = ring.clone();
            assert_eq!(counting.live(), 2);
            drop(ring);
            assert_eq!(counting.live(), 1);
            assert_eq!(copy, vec![5, 6, 7, 8]);
        }
        assert_eq!(counting.allocations.get(), 2);
        assert_eq!(counting.live(), 0);
    }

    #[test]
    fn clone_is_independent() {
        let mut ring = RingBuffer::new(10).unwrap();
        for i in 0..5 {
            ring.push_front(2 * i);
            ring.push_back(2 * i + 1);
        }

        let copy = ring.clone();
        assert_eq!(ring, copy);
        assert_eq!(copy.capacity(), 10);

        ring.push_back(100);
        assert!(ring.pop_front());
        assert!(ring.pop_front());
        assert_eq!(copy, vec![8, 6, 4, 2, 0, 1, 3, 5, 7, 9]);
        assert_ne!(ring, copy);
    }

    #[test]
    fn clone_odd_sized_elements() {
        #[derive(Clone, Debug, PartialEq)]
        struct Triple(u8, u8, u8);

        let mut ring = RingBuffer::new(10).unwrap();
        for i in 0..5u8 {
            let even = 2 * i;
            let odd = even + 1;
            ring.push_front(Triple(even, even, even));
            ring.push_back(Triple(odd, odd, odd));
        }
        let copy = ring.try_clone().unwrap();
        assert!(ring.iter().eq(copy.iter()));
    }

    #[test]
    fn clone_failure_is_reported() {
        // hands out one block, then refuses
        #[derive(Clone, Copy)]
        struct Once;

        static GIVEN: AtomicBool = AtomicBool::new(false);
        unsafe impl RawAlloc for Once {
            fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
                if GIVEN.swap(true, Ordering::SeqCst) {
                    None
                } else {
                    Global.allocate(layout)
                }
            }

            unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
                Global.deallocate(ptr, layout)
            }
        }

        let mut ring = RingBuffer::with_capacity_in(3, Once).unwrap();
        ring.push_back(1);
        assert_eq!(
            ring.try_clone().err(),
            Some(Error::AllocationFailure { capacity: 3 })
        );
        assert_eq!(ring, vec![1]);
    }

    #[test]
    fn partial_equal_ignores_layout() {
        let mut a = RingBuffer::new(4).unwrap();
        let mut b = RingBuffer::new(6).unwrap();
        a.extend(0..6);
        b.push_front(3);
        b.push_front(2);
        b.push_back(4);
        b.push_back(5);
        assert_eq!(a, b);

        let hash = |ring: &RingBuffer<i32>| {
            let mut hasher = DefaultHasher::new();
            ring.hash(&mut hasher);
            hasher.finish()
        };
        assert_eq!(hash(&a), hash(&b));

        b.push_back(6);
        assert_ne!(a, b);
    }

    #[test]
    fn fmt() {
        let mut ring = RingBuffer::new(3).unwrap();
        ring.extend(0..4);
        assert_eq!(format!("{:?}", ring), "[1, 2, 3]");
    }

    #[test]
    fn into_iter_by_value() {
        let flag = &Cell::new(0);
        let mut ring = RingBuffer::new(4).unwrap();
        for _ in 0..4 {
            ring.push_back(Bump(flag));
        }
        let mut iter = ring.into_iter();
        assert_eq!(iter.len(), 4);
        drop(iter.next());
        drop(iter.next_back());
        assert_eq!(flag.get(), 2);
        drop(iter);
        assert_eq!(flag.get(), 4);
    }
}
