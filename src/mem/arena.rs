//! The fixed block of memory that is partitioned by the buddy allocator.

use super::{Error, Result};
use alloc::alloc::{alloc_zeroed, dealloc, Layout};
use core::ptr::NonNull;

/// A contiguous region of `size` bytes, aligned to `size`.
///
/// Because the base is aligned to the arena size, every block that is
/// aligned relative to the arena base is also aligned in absolute terms.
pub struct Arena {
    base: NonNull<u8>,
    layout: Layout,
}

impl Arena {
    /// Allocate a new zeroed arena of `size` bytes.
    ///
    /// `size` must be a power of two.
    pub fn new(size: usize) -> Result<Self> {
        let layout = Layout::from_size_align(size, size).map_err(|_| Error::ArenaUnavailable)?;

        // SAFETY
        // `size` is a non-zero power of two, so the layout has non-zero size.
        let ptr = unsafe { alloc_zeroed(layout) };
        let base = NonNull::new(ptr).ok_or(Error::ArenaUnavailable)?;

        log::debug!("Reserved arena of {} at {:p}", crate::unit::bytes(size), base);
        Ok(Self { base, layout })
    }

    /// Return the pointer to the first byte of this arena.
    #[inline]
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    /// Return the number of bytes inside this arena.
    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        // SAFETY
        // `base` was allocated in `new` using exactly this layout.
        unsafe { dealloc(self.base.as_ptr(), self.layout) }
    }
}

// The arena exclusively owns its memory.
unsafe impl Send for Arena {}
