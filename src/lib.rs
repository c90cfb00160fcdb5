//! A fixed-arena buddy allocator.
//!
//! The allocator owns one contiguous arena of `1 << MAX_ORDER` bytes and
//! hands out blocks of `1 << order` bytes, for orders in
//! `MIN_ORDER..=MAX_ORDER`. Larger free blocks are split on demand, and
//! freed blocks are merged with their buddy for as long as the buddy is free.
//!
//! ```text
//!   order 14  +---------------------------------------------------+
//!             |                        16K                        |
//!             +---------------------------------------------------+
//!   order 13  |           8K            |           8K            |
//!             +-------------------------+-------------------------+
//!   order 12  |     4K     |     4K     |     4K     |     4K     |
//!             +------------+------------+------------+------------+
//! ```
//!
//! The allocator is not synchronized. Wrap it in a lock to share it
//! between threads.
//!
//! ```
//! use buddy_arena::BuddyAllocator;
//!
//! let mut alloc = BuddyAllocator::<12, 14>::new().unwrap();
//! let block = alloc.allocate(5000).unwrap();
//! assert_eq!(block.len(), 8192);
//! assert_eq!(alloc.dump_status(), "0:4K 1:8K 0:16K \n");
//!
//! alloc.free(block.cast()).unwrap();
//! assert_eq!(alloc.dump_status(), "0:4K 0:8K 1:16K \n");
//! ```

#![deny(rust_2018_idioms, rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod mem;
pub mod unit;

pub use mem::{AllocStats, BuddyAllocator, Error, FreeStatus, Result};
