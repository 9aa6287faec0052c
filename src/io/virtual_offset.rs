//! BGZF virtual file offsets.
//!
//! A virtual offset locates a byte in the *decompressed* stream of a BGZF
//! file without decompressing from the start:
//! - **Compressed offset** (high 48 bits): position of the containing block in the file
//! - **Uncompressed offset** (low 16 bits): position within the decompressed block
//!
//! The index layer treats these as opaque, totally ordered values. Ordering
//! of virtual offsets matches the order of records in the file.

use std::fmt;

/// Virtual file offset in BGZF format.
///
/// # Example
///
/// ```
/// use pairdex::io::VirtualOffset;
///
/// let offset = VirtualOffset::new(1024, 512);
/// assert_eq!(offset.compressed_offset(), 1024);
/// assert_eq!(offset.uncompressed_offset(), 512);
/// assert!(offset < VirtualOffset::new(1025, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VirtualOffset(u64);

impl VirtualOffset {
    /// Largest representable offset, used as "unset" while building.
    pub const MAX: VirtualOffset = VirtualOffset(u64::MAX);

    /// Create a new virtual offset from compressed and uncompressed components.
    ///
    /// # Arguments
    ///
    /// * `compressed` - Byte offset of the block in the compressed file (< 2^48)
    /// * `uncompressed` - Byte offset within the decompressed block
    pub fn new(compressed: u64, uncompressed: u16) -> Self {
        VirtualOffset((compressed << 16) | (uncompressed as u64))
    }

    /// Create from raw 64-bit value.
    pub fn from_raw(value: u64) -> Self {
        VirtualOffset(value)
    }

    /// Get raw 64-bit value.
    pub fn as_raw(self) -> u64 {
        self.0
    }

    /// Get compressed file offset (high 48 bits).
    pub fn compressed_offset(self) -> u64 {
        self.0 >> 16
    }

    /// Get uncompressed offset within block (low 16 bits).
    pub fn uncompressed_offset(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

impl fmt::Display for VirtualOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.compressed_offset(), self.uncompressed_offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_offset() {
        let offset = VirtualOffset::new(1024, 512);
        assert_eq!(offset.compressed_offset(), 1024);
        assert_eq!(offset.uncompressed_offset(), 512);
        assert_eq!(offset.as_raw(), (1024 << 16) | 512);
    }

    #[test]
    fn test_virtual_offset_ordering() {
        let off1 = VirtualOffset::new(1000, 100);
        let off2 = VirtualOffset::new(1000, 200);
        let off3 = VirtualOffset::new(2000, 0);

        assert!(off1 < off2);
        assert!(off2 < off3);
        assert!(off3 < VirtualOffset::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(VirtualOffset::new(7, 3).to_string(), "7:3");
    }
}
