//! pairdex: region index for block-compressed, delimited genomic files
//!
//! # Overview
//!
//! pairdex builds a compact sidecar index for a BGZF-compressed text file
//! whose lines carry one interval (BED, GFF, SAM, VCF, ...) or a pair of
//! intervals (4DN pairs, Hi-C merged_nodups), then answers region queries
//! by reading only the compressed blocks that can hold matches.
//!
//! ## Key Features
//!
//! - **1D and 2D**: `chr1:1-1000` and `chr1:1-1000|chr2:5000-6000` queries
//! - **One pass**: indexing streams the file once, sorted or not
//! - **Exact**: every candidate line is re-checked, results are in file order
//! - **Shareable**: one immutable index, many independent query sessions
//!
//! ## Quick Start
//!
//! ```no_run
//! use pairdex::{IndexBuilder, IndexedReader};
//!
//! # fn main() -> pairdex::Result<()> {
//! // Preset inferred from the ".pairs.gz" suffix
//! IndexBuilder::new().build("contacts.pairs.gz")?;
//!
//! let mut reader = IndexedReader::open("contacts.pairs.gz")?;
//! for line in reader.query("chr1:1,000,000-2,000,000|chr2")? {
//!     let line = line?;
//!     // Process one matching line at a time
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`formats`]: column layouts, presets, region strings, the index itself
//! - [`io`]: BGZF access and the query handle
//! - [`error`]: error taxonomy

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod formats;
pub mod io;

// Re-export commonly used types
pub use error::{PairdexError, Result};
pub use formats::index::{build_index, BinIndex, BuildStatus, IndexBuilder, SequenceKey};
pub use formats::{Axis, ExplicitColumns, FormatConfig, Preset, RegionQuery, Role};
pub use io::{IndexedReader, Records, VirtualOffset};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
