//! Conversions between page indices, addresses and buddies.
//!
//! Under power-of-two partitioning a block and its buddy differ in exactly
//! one bit of their offset from the arena base, the bit of their shared order.
//! So the buddy is found with a single `XOR` and no links between buddies.

use core::ptr::NonNull;

/// Maps addresses inside an arena to page indices and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressTranslator {
    base: usize,
    page_order: usize,
    page_count: usize,
}

impl AddressTranslator {
    /// Create a translator for an arena starting at `base` that consists
    /// of `page_count` pages of `1 << page_order` bytes.
    pub const fn new(base: usize, page_order: usize, page_count: usize) -> Self {
        Self {
            base,
            page_order,
            page_count,
        }
    }

    /// The number of bytes inside a single page.
    #[inline]
    pub const fn page_size(&self) -> usize {
        1 << self.page_order
    }

    /// `(address - base) / page_size`
    ///
    /// Does not check whether the address is inside the arena,
    /// use [`checked_page_index`](Self::checked_page_index) for untrusted addresses.
    #[inline]
    pub const fn page_index(&self, addr: usize) -> usize {
        (addr - self.base) >> self.page_order
    }

    /// Return the page index for `addr`, if `addr` is inside the arena
    /// and lies exactly on a page boundary.
    pub fn checked_page_index(&self, addr: usize) -> Option<usize> {
        let offset = addr.checked_sub(self.base)?;
        if offset & (self.page_size() - 1) != 0 {
            return None;
        }

        let idx = offset >> self.page_order;
        if idx < self.page_count {
            Some(idx)
        } else {
            None
        }
    }

    /// `base + idx * page_size`
    #[inline]
    pub const fn address_of(&self, idx: usize) -> usize {
        self.base + (idx << self.page_order)
    }

    /// Same as [`address_of`](Self::address_of), but returns a pointer.
    #[inline]
    pub fn pointer_of(&self, idx: usize) -> NonNull<u8> {
        let addr = self.address_of(idx);
        debug_assert!(idx < self.page_count, "page index out of bounds");

        // SAFETY
        // The base of the arena is not null and every page
        // of the arena lies after it.
        unsafe { NonNull::new_unchecked(addr as *mut u8) }
    }

    /// `base + ((addr - base) ^ (1 << order))`
    #[inline]
    pub const fn buddy_address(&self, addr: usize, order: usize) -> usize {
        self.base + ((addr - self.base) ^ (1 << order))
    }

    /// The page index of the buddy for the block of `order` that starts at page `idx`.
    #[inline]
    pub const fn buddy_index(&self, idx: usize, order: usize) -> usize {
        idx ^ (1 << (order - self.page_order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: usize = 0x10_0000;

    fn translator() -> AddressTranslator {
        AddressTranslator::new(BASE, 12, 4)
    }

    #[test]
    fn index_and_address_are_inverse() {
        let t = translator();
        for idx in 0..4 {
            assert_eq!(t.page_index(t.address_of(idx)), idx);
        }
        assert_eq!(t.address_of(3), BASE + 3 * 4096);
    }

    #[test]
    fn checked_index_rejects_foreign_addresses() {
        let t = translator();
        assert_eq!(t.checked_page_index(BASE), Some(0));
        assert_eq!(t.checked_page_index(BASE + 2 * 4096), Some(2));
        assert_eq!(t.checked_page_index(BASE - 4096), None);
        assert_eq!(t.checked_page_index(BASE + 4 * 4096), None);
        assert_eq!(t.checked_page_index(BASE + 8), None);
    }

    #[test]
    fn buddies_differ_in_the_order_bit() {
        let t = translator();
        assert_eq!(t.buddy_address(BASE, 12), BASE + 4096);
        assert_eq!(t.buddy_address(BASE + 4096, 12), BASE);
        assert_eq!(t.buddy_address(BASE, 13), BASE + 8192);
        assert_eq!(t.buddy_address(BASE + 3 * 4096, 12), BASE + 2 * 4096);
    }

    #[test]
    fn buddy_index_matches_buddy_address() {
        let t = translator();
        for idx in 0..4 {
            for order in 12..14 {
                let by_addr = t.page_index(t.buddy_address(t.address_of(idx), order));
                assert_eq!(t.buddy_index(idx, order), by_addr);
            }
        }
    }
}
