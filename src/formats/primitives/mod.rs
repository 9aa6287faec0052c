//! Shared primitives for delimited genomic formats.
//!
//! - [`genomic`]: 0-based half-open [`Interval`]
//! - [`record`]: coordinate extraction from one line
//! - [`cigar`]: SAM reference span
//!
//! # Example
//!
//! ```
//! use pairdex::formats::primitives::{parse_record, Interval};
//! use pairdex::formats::Preset;
//!
//! let coords = parse_record(b"chr1\t100\t200", &Preset::Bed.config())?;
//! assert_eq!(coords.interval1, Interval::new(100, 200)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use thiserror::Error;

pub mod cigar;
pub mod genomic;
pub mod record;

// Re-exports
pub use genomic::Interval;
pub use record::{parse_record, RecordCoords};

/// Errors that can occur when parsing one data line.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Too few delimited fields.
    #[error("Invalid number of fields: expected at least {expected}, got {actual}")]
    FieldCount {
        /// Minimum number of fields
        expected: usize,
        /// Actual number of fields found
        actual: usize,
    },

    /// Invalid field value.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid genomic interval (start >= end).
    #[error("Invalid genomic interval: start {start} >= end {end}")]
    InvalidInterval {
        /// Start position
        start: u64,
        /// End position
        end: u64,
    },

    /// Coordinate beyond the indexable range.
    #[error("Coordinate {value} exceeds the indexable range")]
    OutOfRange {
        /// Offending coordinate
        value: u64,
    },

    /// Malformed SAM CIGAR string.
    #[error("Invalid CIGAR: {0}")]
    InvalidCigar(String),

    /// Sequence name empty or not UTF-8.
    #[error("Invalid sequence name")]
    InvalidName,
}

/// Result type for format operations.
pub type Result<T> = std::result::Result<T, FormatError>;
