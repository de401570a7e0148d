//! Positional cursors and iterators over a `RingBuffer`.
//!
//! Every type here addresses elements by logical index (0 is the front) and
//! goes through the buffer to find the physical slot; none of them owns
//! storage.

use core::cmp;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

use crate::allocator::{Global, RawAlloc};
use crate::error::Result;
use crate::utils::wrap_add;
use crate::RingBuffer;

/// A read-only cursor at a logical position of a `RingBuffer`.
///
/// Valid positions run from 0 (the front) to `len()` (one past the back).
/// Moving never leaves that range: `move_next` stops at `len()` and
/// `move_prev` stops at 0. Only positions below `len()` dereference.
///
/// Two cursors are equal when they point into the same buffer at the same
/// position.
///
/// # Examples
///
/// ```
/// use ringdeque::RingBuffer;
///
/// let mut ring = RingBuffer::new(3)?;
/// ring.push_back(1);
///
/// let mut cursor = ring.begin();
/// assert_eq!(cursor.get(), Ok(&1));
///
/// cursor.move_next();
/// assert!(cursor == ring.end());
/// assert!(cursor.get().is_err());
///
/// // already past the back
/// cursor.move_next();
/// assert!(cursor == ring.end());
///
/// cursor.move_prev();
/// assert!(cursor == ring.begin());
/// # Ok::<(), ringdeque::Error>(())
/// ```
pub struct Cursor<'a, T: 'a, A: RawAlloc + 'a = Global> {
    ring: &'a RingBuffer<T, A>,
    index: usize,
}

impl<'a, T, A: RawAlloc> Cursor<'a, T, A> {
    #[inline]
    pub(crate) fn new(ring: &'a RingBuffer<T, A>, index: usize) -> Self {
        Cursor { ring, index }
    }

    /// The logical index the cursor points at.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Steps toward the back, stopping one past the back element.
    #[inline]
    pub fn move_next(&mut self) {
        self.index = cmp::min(self.ring.len(), self.index + 1);
    }

    /// Steps toward the front, stopping at the front element.
    #[inline]
    pub fn move_prev(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// Returns the element under the cursor.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`](crate::Error::IndexOutOfRange) at the end
    /// position.
    #[inline]
    pub fn get(&self) -> Result<&'a T> {
        self.ring.checked_ref(self.index, "Cursor::get")
    }
}

impl<'a, T, A: RawAlloc> Clone for Cursor<'a, T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T, A: RawAlloc> Copy for Cursor<'a, T, A> {}

impl<'a, T, A: RawAlloc> PartialEq for Cursor<'a, T, A> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.ring, other.ring) && self.index == other.index
    }
}

impl<'a, T, A: RawAlloc> Eq for Cursor<'a, T, A> {}

impl<'a, T, A: RawAlloc> fmt::Debug for Cursor<'a, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("index", &self.index)
            .field("len", &self.ring.len())
            .finish()
    }
}

/// A cursor that can also modify the element it points at.
///
/// Moves the same way as [`Cursor`]. The buffer is mutably borrowed for the
/// cursor's lifetime, so it cannot be pushed to or popped from meanwhile.
///
/// # Examples
///
/// ```
/// use ringdeque::RingBuffer;
///
/// let mut ring = RingBuffer::new(4)?;
/// ring.extend(vec![1, 2, 3]);
///
/// let mut cursor = ring.begin_mut();
/// while let Ok(value) = cursor.get_mut() {
///     *value *= 10;
///     cursor.move_next();
/// }
/// assert_eq!(cursor.index(), 3);
/// assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![10, 20, 30]);
/// # Ok::<(), ringdeque::Error>(())
/// ```
pub struct CursorMut<'a, T: 'a, A: RawAlloc + 'a = Global> {
    ring: &'a mut RingBuffer<T, A>,
    index: usize,
}

impl<'a, T, A: RawAlloc> CursorMut<'a, T, A> {
    #[inline]
    pub(crate) fn new(ring: &'a mut RingBuffer<T, A>, index: usize) -> Self {
        CursorMut { ring, index }
    }

    /// The logical index the cursor points at.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Steps toward the back, stopping one past the back element.
    #[inline]
    pub fn move_next(&mut self) {
        self.index = cmp::min(self.ring.len(), self.index + 1);
    }

    /// Steps toward the front, stopping at the front element.
    #[inline]
    pub fn move_prev(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// Returns the element under the cursor.
    #[inline]
    pub fn get(&self) -> Result<&T> {
        self.ring.checked_ref(self.index, "CursorMut::get")
    }

    /// Returns the element under the cursor mutably.
    #[inline]
    pub fn get_mut(&mut self) -> Result<&mut T> {
        self.ring.checked_mut(self.index, "CursorMut::get_mut")
    }

    /// A read-only cursor at the same position.
    #[inline]
    pub fn as_cursor(&self) -> Cursor<'_, T, A> {
        Cursor::new(self.ring, self.index)
    }
}

impl<'a, T, A: RawAlloc> PartialEq for CursorMut<'a, T, A> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(&*self.ring, &*other.ring) && self.index == other.index
    }
}

impl<'a, T, A: RawAlloc> fmt::Debug for CursorMut<'a, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorMut")
            .field("index", &self.index)
            .field("len", &self.ring.len())
            .finish()
    }
}

/// `RingBuffer` iterator
#[must_use = "iterator adaptors are lazy and do nothing unless consumed"]
pub struct Iter<'a, T: 'a, A: RawAlloc + 'a = Global> {
    ring: &'a RingBuffer<T, A>,
    front: usize,
    back: usize,
}

impl<'a, T, A: RawAlloc> Iter<'a, T, A> {
    #[inline]
    pub(crate) fn new(ring: &'a RingBuffer<T, A>) -> Self {
        Iter {
            ring,
            front: 0,
            back: ring.len(),
        }
    }
}

impl<'a, T, A: RawAlloc> Clone for Iter<'a, T, A> {
    fn clone(&self) -> Self {
        Iter {
            ring: self.ring,
            front: self.front,
            back: self.back,
        }
    }
}

impl<'a, T, A: RawAlloc> Iterator for Iter<'a, T, A> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        let element = self.ring.get(self.front)?;
        self.front += 1;
        Some(element)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<'a, T, A: RawAlloc> DoubleEndedIterator for Iter<'a, T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        self.ring.get(self.back)
    }
}

impl<'a, T, A: RawAlloc> ExactSizeIterator for Iter<'a, T, A> {}

impl<'a, T, A: RawAlloc> FusedIterator for Iter<'a, T, A> {}

/// `RingBuffer` mutable iterator
#[must_use = "iterator adaptors are lazy and do nothing unless consumed"]
pub struct IterMut<'a, T: 'a> {
    ring: NonNull<T>,
    capacity: usize,
    begin: usize,
    front: usize,
    back: usize,
    marker: PhantomData<&'a mut T>,
}

unsafe impl<'a, T: Send> Send for IterMut<'a, T> {}
unsafe impl<'a, T: Sync> Sync for IterMut<'a, T> {}

impl<'a, T> IterMut<'a, T> {
    /// `ring` must hold `len` live elements starting at slot `begin`, and
    /// stay mutably borrowed for `'a`.
    #[inline]
    pub(crate) fn new(ring: NonNull<T>, capacity: usize, begin: usize, len: usize) -> Self {
        IterMut {
            ring,
            capacity,
            begin,
            front: 0,
            back: len,
            marker: PhantomData,
        }
    }

    #[inline]
    unsafe fn element(&mut self, index: usize) -> &'a mut T {
        let slot = wrap_add(self.begin, index, self.capacity);
        &mut *self.ring.as_ptr().add(slot)
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.front == self.back {
            return None;
        }
        let index = self.front;
        self.front += 1;
        // each logical index is handed out at most once
        unsafe { Some(self.element(index)) }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        let index = self.back;
        unsafe { Some(self.element(index)) }
    }
}

impl<'a, T> ExactSizeIterator for IterMut<'a, T> {}

impl<'a, T> FusedIterator for IterMut<'a, T> {}

/// By-value `RingBuffer` iterator
#[must_use = "iterator adaptors are lazy and do nothing unless consumed"]
pub struct IntoIter<T, A: RawAlloc = Global> {
    inner: RingBuffer<T, A>,
}

impl<T, A: RawAlloc> IntoIter<T, A> {
    #[inline]
    pub(crate) fn new(inner: RingBuffer<T, A>) -> Self {
        IntoIter { inner }
    }
}

impl<T, A: RawAlloc> Iterator for IntoIter<T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.inner.take_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.inner.len();
        (len, Some(len))
    }
}

impl<T, A: RawAlloc> DoubleEndedIterator for IntoIter<T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.inner.take_back()
    }
}

impl<T, A: RawAlloc> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: RawAlloc> FusedIterator for IntoIter<T, A> {}
