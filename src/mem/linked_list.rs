//! Free lists used in the buddy allocator.
//!
//! The links of every list are stored inside the [`PageRecord`]s of the
//! page table, so a list itself only stores its head. This makes pushing,
//! popping and removing an arbitrary entry `O(1)`.
//!
//! [`PageRecord`]: super::page::PageRecord

use super::page::{Link, PageTable};
use alloc::{boxed::Box, vec};
use core::ops::Range;

/// Doubly linked list of page indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreeList {
    head: Option<usize>,
    len: usize,
}

impl FreeList {
    /// Create a new, empty `FreeList`.
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    /// Returns whether this list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns the number of entries in this list.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Push the page `idx` to the front of the list.
    ///
    /// The page must not be linked into any list.
    pub fn push(&mut self, pages: &mut PageTable, idx: usize) {
        pages[idx].link = Link {
            prev: None,
            next: self.head,
        };

        if let Some(head) = self.head {
            pages[head].link.prev = Some(idx);
        }

        self.head = Some(idx);
        self.len += 1;
    }

    /// Removes the first entry from this list.
    pub fn pop(&mut self, pages: &mut PageTable) -> Option<usize> {
        let idx = self.head?;
        self.remove(pages, idx);
        Some(idx)
    }

    /// Unlink the page `idx` from this list.
    ///
    /// The page must be an entry of this list.
    pub fn remove(&mut self, pages: &mut PageTable, idx: usize) {
        let Link { prev, next } = pages[idx].link;

        match prev {
            Some(prev) => pages[prev].link.next = next,
            None => {
                debug_assert_eq!(self.head, Some(idx), "page is not part of this list");
                self.head = next;
            }
        }

        if let Some(next) = next {
            pages[next].link.prev = prev;
        }

        pages[idx].link = Link::default();
        self.len -= 1;
    }

    /// Returns an iterator over the page indices of this list.
    pub fn iter<'pages>(&self, pages: &'pages PageTable) -> Iter<'pages> {
        Iter {
            next: self.head,
            pages,
        }
    }
}

pub struct Iter<'pages> {
    next: Option<usize>,
    pages: &'pages PageTable,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        self.next = self.pages[idx].link.next;
        Some(idx)
    }
}

/// One [`FreeList`] for every order in `min_order..=max_order`.
#[derive(Debug, Clone)]
pub struct FreeAreas {
    min_order: usize,
    lists: Box<[FreeList]>,
}

impl FreeAreas {
    /// Create empty free lists for every order in `min_order..=max_order`.
    pub fn new(min_order: usize, max_order: usize) -> Self {
        Self {
            min_order,
            lists: vec![FreeList::new(); max_order - min_order + 1].into_boxed_slice(),
        }
    }

    /// Forget every entry of every list.
    ///
    /// This does not touch the links stored inside the page table.
    pub fn reset(&mut self) {
        self.lists.iter_mut().for_each(|list| *list = FreeList::new());
    }

    /// The range of orders that have a free list.
    pub fn orders(&self) -> Range<usize> {
        self.min_order..self.min_order + self.lists.len()
    }

    /// Mark the page `idx` as the head of a free block of `order` and
    /// link it into the list of that order.
    pub fn insert(&mut self, pages: &mut PageTable, order: usize, idx: usize) {
        pages[idx].mark_free(order);
        self.list_mut(order).push(pages, idx);
    }

    /// Unlink the page `idx` from the list of `order`.
    ///
    /// The state flags of the page are left for the caller to update.
    pub fn remove(&mut self, pages: &mut PageTable, order: usize, idx: usize) {
        self.list_mut(order).remove(pages, idx);
    }

    /// Detach the first entry of the list of `order`.
    pub fn pop(&mut self, pages: &mut PageTable, order: usize) -> Option<usize> {
        self.list_mut(order).pop(pages)
    }

    /// Check if the list of `order` has no entries.
    pub fn is_empty(&self, order: usize) -> bool {
        self.list(order).is_empty()
    }

    /// Return the number of free blocks of `order`.
    pub fn len(&self, order: usize) -> usize {
        self.list(order).len()
    }

    /// Return the list for `order`.
    pub fn list(&self, order: usize) -> &FreeList {
        &self.lists[order - self.min_order]
    }

    fn list_mut(&mut self, order: usize) -> &mut FreeList {
        &mut self.lists[order - self.min_order]
    }
}
