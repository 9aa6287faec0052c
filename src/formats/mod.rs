//! Delimited genomic formats and their index.
//!
//! - [`preset`]: column layouts ([`FormatConfig`]) and built-in [`Preset`]s
//! - [`region`]: query strings ([`RegionQuery`])
//! - [`primitives`]: intervals, line parsing, SAM CIGAR spans
//! - [`index`]: binned index, builder and sidecar encoding
//!
//! Every parser works on one line at a time and returns `Result`; nothing
//! in this module panics on malformed input.

pub mod index;
pub mod preset;
pub mod primitives;
pub mod region;

pub use preset::{
    Axis, AxisColumns, CoordinateSystem, ExplicitColumns, FormatConfig, Preset, RecordKind, Role,
};
pub use region::{Region, RegionQuery};
