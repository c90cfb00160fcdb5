//! Per-page metadata.

use alloc::{boxed::Box, vec::Vec};
use bitflags::bitflags;
use core::ops::{Index, IndexMut};

bitflags! {
    /// The state of a single page record.
    ///
    /// A record without any flags is an interior page of some larger block.
    pub struct PageFlags: u8 {
        /// This page is the first page of a block, and `order` is valid.
        const HEAD = 1 << 0;
        /// The block headed by this page is free and linked into a free list.
        const FREE = 1 << 1;
    }
}

/// Position of a page record inside its free list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Link {
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

/// Metadata for one page of the arena.
#[derive(Debug, Clone)]
pub struct PageRecord {
    index: usize,
    /// The order of the block headed at this page.
    pub order: usize,
    pub flags: PageFlags,
    pub link: Link,
}

impl PageRecord {
    /// Create a new unassigned record with the given index.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            order: 0,
            flags: PageFlags::empty(),
            link: Link::default(),
        }
    }

    /// The fixed position of this record inside the page table.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if this page heads a free block.
    #[inline]
    pub fn is_free_head(&self) -> bool {
        self.flags.contains(PageFlags::HEAD | PageFlags::FREE)
    }

    /// Check if this page heads an allocated block.
    #[inline]
    pub fn is_allocated_head(&self) -> bool {
        self.flags == PageFlags::HEAD
    }

    /// Mark this page as the head of a free block of `order`.
    pub fn mark_free(&mut self, order: usize) {
        self.order = order;
        self.flags = PageFlags::HEAD | PageFlags::FREE;
    }

    /// Mark this page as the head of an allocated block of `order`.
    pub fn mark_allocated(&mut self, order: usize) {
        self.order = order;
        self.flags = PageFlags::HEAD;
    }

    /// Turn this page into an interior page of some other block.
    pub fn unassign(&mut self) {
        self.order = 0;
        self.flags = PageFlags::empty();
        self.link = Link::default();
    }
}

/// One [`PageRecord`] for every page of the arena.
pub struct PageTable {
    records: Box<[PageRecord]>,
}

impl PageTable {
    /// Create a table of `count` unassigned records.
    pub fn new(count: usize) -> Self {
        let records = (0..count).map(PageRecord::new).collect::<Vec<_>>();
        Self {
            records: records.into_boxed_slice(),
        }
    }

    /// Reset every record to the unassigned state.
    pub fn reset(&mut self) {
        self.records.iter_mut().for_each(PageRecord::unassign);
    }

    /// Return the number of records inside this table.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if this table has no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Return the record at `idx`, if it exists.
    pub fn get(&self, idx: usize) -> Option<&PageRecord> {
        self.records.get(idx)
    }

    /// Return an iterator over all records.
    pub fn iter(&self) -> core::slice::Iter<'_, PageRecord> {
        self.records.iter()
    }
}

impl Index<usize> for PageTable {
    type Output = PageRecord;

    fn index(&self, idx: usize) -> &PageRecord {
        &self.records[idx]
    }
}

impl IndexMut<usize> for PageTable {
    fn index_mut(&mut self, idx: usize) -> &mut PageRecord {
        &mut self.records[idx]
    }
}
