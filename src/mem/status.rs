//! Read-only report of the free lists.

use super::size_for_order;
use crate::unit;
use alloc::vec::Vec;
use core::{fmt, ops::Range};

/// The number of free blocks for every order of an allocator.
///
/// The [`Display`](fmt::Display) implementation prints one
/// `"<count>:<size>K "` entry per order, followed by a newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeStatus {
    min_order: usize,
    counts: Vec<usize>,
}

impl FreeStatus {
    /// Create a status from the free block counts, starting at `min_order`.
    pub fn new(min_order: usize, counts: Vec<usize>) -> Self {
        Self { min_order, counts }
    }

    /// The range of orders covered by this report.
    pub fn orders(&self) -> Range<usize> {
        self.min_order..self.min_order + self.counts.len()
    }

    /// The number of free blocks of `order`, or `0` if the order is not covered.
    pub fn count(&self, order: usize) -> usize {
        order
            .checked_sub(self.min_order)
            .and_then(|idx| self.counts.get(idx))
            .copied()
            .unwrap_or(0)
    }

    /// Return an iterator of `(order, count)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.orders().zip(self.counts.iter().copied())
    }

    /// The sum of the sizes of all free blocks.
    pub fn free_bytes(&self) -> usize {
        self.iter()
            .map(|(order, count)| count * size_for_order(order))
            .sum()
    }
}

impl fmt::Display for FreeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.iter().try_for_each(|(order, count)| {
            write!(f, "{}:{}K ", count, unit::kib(size_for_order(order)))
        })?;
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn display_matches_dump_format() {
        let status = FreeStatus::new(12, vec![0, 2, 1]);
        assert_eq!(status.to_string(), "0:4K 2:8K 1:16K \n");
    }

    #[test]
    fn count_outside_the_range_is_zero() {
        let status = FreeStatus::new(12, vec![3, 0, 1]);
        assert_eq!(status.count(12), 3);
        assert_eq!(status.count(14), 1);
        assert_eq!(status.count(11), 0);
        assert_eq!(status.count(15), 0);
        assert_eq!(status.free_bytes(), 3 * 4096 + 16384);
    }

    #[test]
    fn empty_status_has_no_orders() {
        let status = FreeStatus::new(0, Vec::new());
        assert_eq!(status.orders(), 0..0);
        assert_eq!(status.count(0), 0);
        assert_eq!(status.free_bytes(), 0);
        assert_eq!(status.to_string(), "\n");
    }
}
