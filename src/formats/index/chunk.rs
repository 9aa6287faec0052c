//! Chunks: spans of the compressed file holding candidate records.

use crate::io::VirtualOffset;

/// Half-open range of virtual offsets `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Chunk {
    /// Offset of the first byte of the first record
    pub start: VirtualOffset,
    /// Offset just past the last record
    pub end: VirtualOffset,
}

impl Chunk {
    /// Create a chunk
    pub fn new(start: VirtualOffset, end: VirtualOffset) -> Self {
        Chunk { start, end }
    }

    /// Drop everything before `bound`; `None` if nothing remains
    pub fn clamp_start(self, bound: VirtualOffset) -> Option<Chunk> {
        if self.end <= bound {
            None
        } else {
            Some(Chunk {
                start: self.start.max(bound),
                end: self.end,
            })
        }
    }
}

/// Sort chunks and merge overlapping or adjacent ones.
///
/// Reading the merged list visits every byte of the input chunks exactly
/// once, in file order.
pub fn merge_chunks(mut chunks: Vec<Chunk>) -> Vec<Chunk> {
    chunks.sort_unstable();

    let mut merged: Vec<Chunk> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        match merged.last_mut() {
            Some(current) if chunk.start <= current.end => {
                current.end = current.end.max(chunk.end);
            }
            _ => merged.push(chunk),
        }
    }
    merged
}
