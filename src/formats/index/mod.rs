//! Binned interval index for BGZF-compressed delimited files
//!
//! This module provides the index that enables random access to 1D
//! (`chr:start-end`) and 2D (`chr1:s-e|chr2:s-e`) regions:
//!
//! - [`bins`]: hierarchical binning and composite 2D bins
//! - [`chunk`]: virtual offset ranges and chunk merging
//! - [`bin_index`]: the index structure and its sidecar encoding
//! - [`builder`]: one-pass index construction
//!
//! # Overview
//!
//! Every data line is assigned to the smallest bin containing its interval
//! (for 2D data, the pair of per-axis bins). A query gathers the chunks of
//! every bin that can overlap it, discards chunks the linear index proves
//! are too early in the file, and merges the rest into a short list of
//! file ranges to read.
//!
//! # Example
//!
//! ```no_run
//! use pairdex::formats::index::{sidecar_path, BinIndex, IndexBuilder};
//!
//! # fn main() -> pairdex::Result<()> {
//! IndexBuilder::new().build("annotations.bed.gz")?;
//!
//! let index = BinIndex::from_path(sidecar_path("annotations.bed.gz"))?;
//! let chunks = index.chunks(&"chr1:1000000-2000000".parse()?)?;
//! println!("Found {} chunks for region", chunks.len());
//! # Ok(())
//! # }
//! ```

pub mod bin_index;
pub mod bins;
pub mod builder;
pub mod chunk;

pub use bin_index::{BinIndex, IndexEntry, SequenceKey};
pub use builder::{build_from_reader, build_index, sidecar_path, BuildStatus, IndexBuilder};
pub use chunk::{merge_chunks, Chunk};
