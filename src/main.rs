#![deny(rust_2018_idioms)]

mod logger;

use buddy_arena::{unit::KIB, BuddyAllocator, Error};
use owo_colors::OwoColorize;

fn main() {
    logger::init_logging();

    if let Err(err) = demo() {
        log::error!("Failed to run the allocator: {}", err.red());
        std::process::exit(1);
    }
}

/// Allocate a few blocks of different sizes from a default sized arena,
/// and report the free lists before and after freeing them again.
fn demo() -> Result<(), Error> {
    let mut alloc: BuddyAllocator = BuddyAllocator::new()?;
    log::info!("{} buddy allocator", "Initialized".green());
    log::info!("\n{}", alloc.stats());
    print!("{}", alloc.dump_status());

    let sizes = [1, 4 * KIB, 5000, 64 * KIB, 300 * KIB];
    let blocks = sizes
        .iter()
        .map(|&size| alloc.allocate(size))
        .collect::<Result<Vec<_>, _>>()?;

    log::info!("\n{}", alloc.stats());
    print!("{}", alloc.dump_status());

    blocks
        .into_iter()
        .rev()
        .try_for_each(|block| alloc.free(block.cast()))?;

    log::info!("\n{}", alloc.stats());
    print!("{}", alloc.dump_status());

    Ok(())
}
