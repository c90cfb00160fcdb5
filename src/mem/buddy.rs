//! Implementation of a Buddy Allocator that partitions one fixed arena
//! into power-of-two sized blocks.

use super::{
    addr::AddressTranslator, arena::Arena, linked_list::FreeAreas, page::PageTable, size_for_order,
    AllocStats, Error, FreeStatus, Result, DEFAULT_MAX_ORDER, DEFAULT_MIN_ORDER,
};
use crate::unit;
use alloc::string::{String, ToString};
use core::{cmp, mem, ptr::NonNull};

/// The central structure that is responsible for allocating memory
/// using the buddy algorithm.
///
/// The arena is `1 << MAX_ORDER` bytes large and split into pages of
/// `1 << MIN_ORDER` bytes. Every block handed out is `1 << order` bytes
/// for some order in `MIN_ORDER..=MAX_ORDER`, and aligned to its size.
pub struct BuddyAllocator<
    const MIN_ORDER: usize = { DEFAULT_MIN_ORDER },
    const MAX_ORDER: usize = { DEFAULT_MAX_ORDER },
> {
    arena: Arena,
    translator: AddressTranslator,
    pages: PageTable,
    orders: FreeAreas,
    stats: AllocStats,
}

impl<const MIN_ORDER: usize, const MAX_ORDER: usize> BuddyAllocator<MIN_ORDER, MAX_ORDER> {
    /// The size of a single page, which is also the size of the smallest block.
    pub const PAGE_SIZE: usize = 1 << MIN_ORDER;

    /// The size of the whole arena.
    pub const ARENA_SIZE: usize = 1 << MAX_ORDER;

    /// The number of pages inside the arena.
    pub const PAGE_COUNT: usize = 1 << (MAX_ORDER - MIN_ORDER);

    const VALID_ORDERS: () = assert!(
        MIN_ORDER <= MAX_ORDER
            && MAX_ORDER < usize::BITS as usize - 1
            && (1 << MIN_ORDER) >= mem::size_of::<usize>(),
        "invalid order range for buddy allocator"
    );

    /// Create a new buddy allocator that owns a freshly allocated arena.
    ///
    /// The allocator is already [initialized](Self::init).
    pub fn new() -> Result<Self> {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_ORDERS;

        let arena = Arena::new(Self::ARENA_SIZE)?;
        let translator = AddressTranslator::new(
            arena.base().as_ptr() as usize,
            MIN_ORDER,
            Self::PAGE_COUNT,
        );

        let mut this = Self {
            arena,
            translator,
            pages: PageTable::new(Self::PAGE_COUNT),
            orders: FreeAreas::new(MIN_ORDER, MAX_ORDER),
            stats: AllocStats::with_name("Buddy Allocator"),
        };
        this.init();

        Ok(this)
    }

    /// Reset the allocator so the whole arena is a single free block
    /// of `MAX_ORDER`.
    ///
    /// Every block that was handed out before becomes invalid.
    pub fn init(&mut self) {
        self.pages.reset();
        self.orders.reset();
        self.orders.insert(&mut self.pages, MAX_ORDER, 0);

        self.stats.allocated = 0;
        self.stats.free = Self::ARENA_SIZE;
        self.stats.total = Self::ARENA_SIZE;

        log::debug!(
            "Initialized buddy allocator with {} pages of {}",
            Self::PAGE_COUNT,
            unit::bytes(Self::PAGE_SIZE)
        );
    }

    /// Calculates the smallest order whose blocks can hold `size` bytes.
    ///
    /// A `size` of zero is served by a block of `MIN_ORDER`.
    pub fn order_for_size(size: usize) -> Result<usize> {
        if size > Self::ARENA_SIZE {
            log::debug!(
                "Rejected request of {} bytes, the arena only holds {}",
                size,
                unit::bytes(Self::ARENA_SIZE)
            );
            return Err(Error::OversizeRequest);
        }

        let order = size.max(1).next_power_of_two().trailing_zeros() as usize;
        Ok(cmp::max(order, MIN_ORDER))
    }

    /// Allocates a block that is large enough to hold `size` bytes.
    ///
    /// The returned slice covers the whole block, which is `size` rounded up
    /// to the next power of two, but at least one page.
    pub fn allocate(&mut self, size: usize) -> Result<NonNull<[u8]>> {
        let order = Self::order_for_size(size)?;
        let idx = self.take_block(order)?;

        let block_size = size_for_order(order);
        self.stats.allocated += block_size;
        self.stats.free -= block_size;

        let ptr = self.translator.pointer_of(idx);
        log::debug!(
            "Allocated block of {} at {:p} for {} bytes",
            unit::bytes(block_size),
            ptr,
            size
        );

        Ok(NonNull::slice_from_raw_parts(ptr, block_size))
    }

    /// Same as [`allocate`](Self::allocate), but every byte of the
    /// returned block is zero.
    pub fn allocate_zeroed(&mut self, size: usize) -> Result<NonNull<[u8]>> {
        let block = self.allocate(size)?;

        // SAFETY
        // The block was just allocated from our arena and is exclusively ours.
        unsafe { core::ptr::write_bytes(block.cast::<u8>().as_ptr(), 0, block.len()) };

        Ok(block)
    }

    /// Allocates `count` contiguous pages.
    ///
    /// `count` is rounded up to the next power of two.
    pub fn allocate_pages(&mut self, count: usize) -> Result<NonNull<[u8]>> {
        if count == 0 {
            return Err(Error::AllocateZeroPages);
        }

        let size = match count.checked_mul(Self::PAGE_SIZE) {
            Some(size) => size,
            None => {
                log::debug!("Rejected request of {} pages, the size overflows", count);
                return Err(Error::OversizeRequest);
            }
        };
        self.allocate(size)
    }

    /// Detach a free block of exactly `order` from the free lists, splitting
    /// a larger block if necessary, and mark it as allocated.
    ///
    /// Returns the page index of the block.
    fn take_block(&mut self, order: usize) -> Result<usize> {
        let found = (order..=MAX_ORDER)
            .find(|&order| !self.orders.is_empty(order))
            .ok_or(Error::OutOfMemory)?;
        let idx = self
            .orders
            .pop(&mut self.pages, found)
            .ok_or(Error::OutOfMemory)?;

        // now walk down the orders from top to bottom, so we can split
        // multiple orders if necessary
        for target_order in (order..found).rev() {
            // this is how the block looks like before the split:
            //
            // +-- `idx`
            // v
            // +--------------------------------+
            // |       `target_order + 1`       |
            // +--------------------------------+
            //
            // and after the split:
            //
            // +-- `idx`, keeps being split or is returned
            // v
            // +---------------------------------+
            // |    left half   |   right half   |
            // +---------------------------------+
            //                  ^
            //                  +--- `buddy`, goes into the `target_order` free list
            let buddy = idx + (1 << (target_order - MIN_ORDER));
            self.orders.insert(&mut self.pages, target_order, buddy);

            log::trace!(
                "Split order {} block at page {}, buddy at page {}",
                target_order + 1,
                idx,
                buddy
            );
        }

        self.pages[idx].mark_allocated(order);
        Ok(idx)
    }

    /// Frees the block that starts at `ptr` and merges it with its
    /// buddies as long as they are free.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFree`] without changing any state if `ptr`
    /// is not the start of a block that is currently allocated from `self`.
    /// This also catches double frees.
    pub fn free(&mut self, ptr: NonNull<u8>) -> Result<()> {
        let mut idx = match self.allocated_head(ptr) {
            Some(idx) => idx,
            None => {
                log::warn!("Rejected free of {:p}, it is not an allocated block", ptr);
                return Err(Error::InvalidFree);
            }
        };

        let mut order = self.pages[idx].order;
        let block_size = size_for_order(order);
        self.stats.allocated -= block_size;
        self.stats.free += block_size;
        self.pages[idx].unassign();

        while order < MAX_ORDER {
            // this is a trick to find the other buddy, if we have one of the buddies.
            let buddy = self.translator.buddy_index(idx, order);
            let record = &self.pages[buddy];
            if !record.is_free_head() || record.order != order {
                break;
            }

            self.orders.remove(&mut self.pages, order, buddy);
            self.pages[buddy].unassign();

            log::trace!(
                "Merged order {} buddies at pages {} and {}",
                order,
                idx,
                buddy
            );

            // the merged block always starts at the lower buddy
            idx = cmp::min(idx, buddy);
            order += 1;
        }

        self.orders.insert(&mut self.pages, order, idx);
        log::debug!(
            "Freed block of {} at {:p}, now part of an order {} block",
            unit::bytes(block_size),
            ptr,
            order
        );

        Ok(())
    }

    /// Returns the size of the allocated block that starts at `ptr`,
    /// or `None` if no allocated block starts there.
    pub fn block_size(&self, ptr: NonNull<u8>) -> Option<usize> {
        self.allocated_head(ptr)
            .map(|idx| size_for_order(self.pages[idx].order))
    }

    /// Check if `ptr` points somewhere into the arena of this allocator.
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        let base = self.arena.base().as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        (base..base + self.arena.size()).contains(&addr)
    }

    /// Resolve `ptr` to the page index of an allocated block head.
    fn allocated_head(&self, ptr: NonNull<u8>) -> Option<usize> {
        let idx = self.translator.checked_page_index(ptr.as_ptr() as usize)?;
        if self.pages[idx].is_allocated_head() {
            Some(idx)
        } else {
            None
        }
    }

    /// Returns the number of free blocks for every order.
    pub fn status(&self) -> FreeStatus {
        let counts = self
            .orders
            .orders()
            .map(|order| self.orders.list(order).iter(&self.pages).count())
            .collect();
        FreeStatus::new(MIN_ORDER, counts)
    }

    /// Returns the free block count of every order as a single line of
    /// `"<count>:<size>K "` entries.
    pub fn dump_status(&self) -> String {
        self.status().to_string()
    }

    /// Returns a copy of the stats at the moment for this allocator.
    pub fn stats(&self) -> AllocStats {
        self.stats.clone()
    }

    /// Returns the pointer to the first byte of the arena.
    pub fn arena_base(&self) -> NonNull<u8> {
        self.arena.base()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    type Small = BuddyAllocator<12, 14>;

    /// Walk the page table and free lists, and check that they agree.
    fn check_invariants<const MIN: usize, const MAX: usize>(alloc: &BuddyAllocator<MIN, MAX>) {
        let mut covered = 0;

        for order in alloc.orders.orders() {
            let entries = alloc.orders.list(order).iter(&alloc.pages).collect::<Vec<_>>();
            assert_eq!(entries.len(), alloc.orders.len(order));

            for idx in entries {
                let record = &alloc.pages[idx];
                assert!(record.is_free_head(), "page {} in list is not a free head", idx);
                assert_eq!(record.order, order);
                assert_eq!(idx % (1 << (order - MIN)), 0, "misaligned free block");

                if order < MAX {
                    let buddy = &alloc.pages[alloc.translator.buddy_index(idx, order)];
                    assert!(
                        !(buddy.is_free_head() && buddy.order == order),
                        "free buddies of order {} were not merged",
                        order
                    );
                }
                covered += size_for_order(order);
            }
        }

        let allocated = alloc
            .pages
            .iter()
            .filter(|record| record.is_allocated_head())
            .map(|record| size_for_order(record.order))
            .sum::<usize>();

        assert_eq!(covered, alloc.stats.free);
        assert_eq!(allocated, alloc.stats.allocated);
        assert_eq!(covered + allocated, BuddyAllocator::<MIN, MAX>::ARENA_SIZE);
    }

    #[test]
    fn order_for_size_rounds_up() {
        assert_eq!(Small::order_for_size(0), Ok(12));
        assert_eq!(Small::order_for_size(1), Ok(12));
        assert_eq!(Small::order_for_size(4096), Ok(12));
        assert_eq!(Small::order_for_size(4097), Ok(13));
        assert_eq!(Small::order_for_size(16384), Ok(14));
        assert_eq!(Small::order_for_size(16385), Err(Error::OversizeRequest));
    }

    #[test]
    fn split_leaves_one_buddy_per_level() {
        let mut alloc = Small::new().unwrap();
        let block = alloc.allocate(1).unwrap();

        assert_eq!(block.cast::<u8>(), alloc.arena_base());
        assert_eq!(alloc.orders.len(12), 1);
        assert_eq!(alloc.orders.len(13), 1);
        assert_eq!(alloc.orders.len(14), 0);
        assert!(alloc.pages[0].is_allocated_head());
        assert!(alloc.pages[1].is_free_head());
        assert!(alloc.pages[2].is_free_head());
        assert!(alloc.pages[3].flags.is_empty());
        check_invariants(&alloc);
    }

    #[test]
    fn merge_is_maximal() {
        let mut alloc = Small::new().unwrap();
        let blocks = (0..4)
            .map(|_| alloc.allocate(4096).unwrap().cast::<u8>())
            .collect::<Vec<_>>();
        check_invariants(&alloc);

        for ptr in [blocks[1], blocks[2], blocks[0]].iter() {
            alloc.free(*ptr).unwrap();
            check_invariants(&alloc);
        }
        assert_eq!(alloc.orders.len(13), 1);
        assert_eq!(alloc.orders.len(12), 1);

        alloc.free(blocks[3]).unwrap();
        check_invariants(&alloc);
        assert_eq!(alloc.orders.len(14), 1);
        assert!(alloc.pages[0].is_free_head());
        assert!(alloc.pages.iter().skip(1).all(|r| r.flags.is_empty()));
    }

    #[test]
    fn rejected_free_changes_nothing() {
        let mut alloc = Small::new().unwrap();
        let block = alloc.allocate(8192).unwrap().cast::<u8>();
        let before = alloc.status();

        let interior = NonNull::new(block.as_ptr().wrapping_add(4096)).unwrap();
        assert_eq!(alloc.free(interior), Err(Error::InvalidFree));
        assert_eq!(alloc.status(), before);
        check_invariants(&alloc);
    }

    #[test]
    fn stats_track_blocks() {
        let mut alloc = Small::new().unwrap();
        let block = alloc.allocate(5000).unwrap();

        let stats = alloc.stats();
        assert_eq!(stats.allocated, 8192);
        assert_eq!(stats.free, 8192);
        assert_eq!(stats.total, 16384);

        alloc.free(block.cast()).unwrap();
        assert_eq!(alloc.stats().allocated, 0);
        assert_eq!(alloc.stats().free, 16384);
    }

    #[test]
    fn init_forgets_allocations() {
        let mut alloc = Small::new().unwrap();
        let block = alloc.allocate(4096).unwrap().cast::<u8>();
        alloc.allocate(4096).unwrap();

        alloc.init();
        check_invariants(&alloc);
        assert_eq!(alloc.dump_status(), "0:4K 0:8K 1:16K \n");
        assert_eq!(alloc.free(block), Err(Error::InvalidFree));
    }
}
