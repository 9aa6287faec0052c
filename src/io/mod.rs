//! I/O module: BGZF container access and indexed region reading
//!
//! - [`compression`]: seekable BGZF reader, parallel BGZF writer
//! - [`virtual_offset`]: BGZF virtual file offsets
//! - [`indexed`]: query handle over a data file and its sidecar index

pub mod compression;
pub mod indexed;
pub mod virtual_offset;

pub use compression::{is_bgzf, BgzfWriter, SeekableBgzfReader, BGZF_BLOCK_SIZE, PARALLEL_BLOCK_COUNT};
pub use indexed::{IndexedReader, Records};
pub use virtual_offset::VirtualOffset;
