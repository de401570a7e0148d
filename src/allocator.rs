//! Raw storage providers for `RingBuffer`.

use alloc::alloc as global;
use core::alloc::Layout;
use core::ptr::NonNull;

/// Source of the one raw allocation backing a `RingBuffer`.
///
/// The buffer requests a single block at construction and returns it exactly
/// once when dropped. Nothing is constructed in the block by the allocator.
///
/// # Safety
///
/// A pointer returned by `allocate` must be valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and stay valid until it
/// is passed back to `deallocate` with the same layout.
pub unsafe trait RawAlloc {
    /// Allocates a block for `layout`, or returns `None` on failure.
    ///
    /// `layout` never has a zero size.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Releases a block previously returned by `allocate`.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this allocator (or a clone of it)
    /// called with the same `layout`, and must not have been released yet.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The global allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Global;

unsafe impl RawAlloc for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        debug_assert!(layout.size() != 0);
        NonNull::new(unsafe { global::alloc(layout) })
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        global::dealloc(ptr.as_ptr(), layout)
    }
}

unsafe impl<'a, A: RawAlloc + ?Sized> RawAlloc for &'a A {
    #[inline]
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        (**self).deallocate(ptr, layout)
    }
}
