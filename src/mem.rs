//! Implementation of the buddy memory system.

pub mod addr;
pub mod arena;
pub mod buddy;
pub mod linked_list;
pub mod page;
pub mod status;

pub use buddy::BuddyAllocator;
pub use linked_list::{FreeAreas, FreeList};
pub use status::FreeStatus;

use crate::unit;
use core::fmt;
use displaydoc_lite::displaydoc;

/// The default minimum order. Blocks of this order are one page, `4KiB`.
pub const DEFAULT_MIN_ORDER: usize = 12;

/// The default maximum order (inclusive). The arena is one block of this
/// order, `1MiB`.
pub const DEFAULT_MAX_ORDER: usize = 20;

/// Result for every memory allocation operation.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Calculates the number of bytes inside a block of the given `order`.
pub const fn size_for_order(order: usize) -> usize {
    1 << order
}

displaydoc! {
    /// Any error that can happen while allocating or freeing memory.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Error {
        /// requested more bytes than the whole arena can hold
        OversizeRequest,
        /// tried to allocate, but no free block is large enough
        OutOfMemory,
        /// tried to free an address that does not start an allocated block
        InvalidFree,
        /// tried to allocate zero pages using `allocate_pages`
        AllocateZeroPages,
        /// the backing memory for the arena could not be allocated
        ArenaUnavailable,
    }
}

/// Statistics for a memory allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocStats {
    /// The name of the allocator that collected these stats.
    pub name: &'static str,
    /// The number of bytes that are handed out in allocated blocks.
    pub allocated: usize,
    /// The number of bytes that are left for allocation.
    pub free: usize,
    /// The total number of bytes that this allocator manages.
    pub total: usize,
}

impl AllocStats {
    /// Create a new [`AllocStats`] instance for the given allocator name.
    pub const fn with_name(name: &'static str) -> Self {
        Self {
            name,
            allocated: 0,
            free: 0,
            total: 0,
        }
    }
}

impl fmt::Display for AllocStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        self.name.chars().try_for_each(|_| write!(f, "~"))?;
        writeln!(f, "\nAllocated: {}", unit::bytes(self.allocated))?;
        writeln!(f, "Free:      {}", unit::bytes(self.free))?;
        writeln!(f, "Total:     {}", unit::bytes(self.total))?;
        self.name.chars().try_for_each(|_| write!(f, "~"))?;
        writeln!(f)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_come_from_docs() {
        assert_eq!(
            Error::OversizeRequest.to_string().trim(),
            "requested more bytes than the whole arena can hold"
        );
        assert_eq!(
            Error::InvalidFree.to_string().trim(),
            "tried to free an address that does not start an allocated block"
        );
    }

    #[test]
    fn stats_display_is_framed_by_the_name() {
        let stats = AllocStats {
            name: "Buddy",
            allocated: 4096,
            free: 12288,
            total: 16384,
        };

        let text = stats.to_string();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Buddy");
        assert_eq!(lines[1], "~~~~~");
        assert_eq!(lines[2], "Allocated: 4.00 KiB");
        assert_eq!(lines[3], "Free:      12.00 KiB");
        assert_eq!(lines[4], "Total:     16.00 KiB");
        assert_eq!(lines[5], "~~~~~");
    }
}
