//! Utilities for working with raw byte units.

use core::fmt;

/// `1 KiB`
pub const KIB: usize = 1 << 10;
/// `1 MiB`
pub const MIB: usize = 1 << 20;
/// `1 GiB`
pub const GIB: usize = 1 << 30;

/// Wrapper around a raw byte count that pretty-prints
/// it using the [`Display`](core::fmt::Display) implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteUnit(pub usize);

impl fmt::Display for ByteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.0 as f64;

        match self.0 {
            n if n < KIB => write!(f, "{} B", n),
            n if n < MIB => write!(f, "{:.2} KiB", count / KIB as f64),
            n if n < GIB => write!(f, "{:.2} MiB", count / MIB as f64),
            _ => write!(f, "{:.2} GiB", count / GIB as f64),
        }
    }
}

/// Wrap `count` so it is displayed with the largest fitting unit.
pub fn bytes(count: usize) -> ByteUnit {
    ByteUnit(count)
}

/// Return the number of whole KiB in `count` bytes.
pub const fn kib(count: usize) -> usize {
    count / KIB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_largest_fitting_unit() {
        assert_eq!(bytes(512).to_string(), "512 B");
        assert_eq!(bytes(4 * KIB).to_string(), "4.00 KiB");
        assert_eq!(bytes(MIB + MIB / 2).to_string(), "1.50 MiB");
        assert_eq!(bytes(2 * GIB).to_string(), "2.00 GiB");
    }

    #[test]
    fn kib_truncates() {
        assert_eq!(kib(4096), 4);
        assert_eq!(kib(MIB), 1024);
        assert_eq!(kib(1023), 0);
    }
}
