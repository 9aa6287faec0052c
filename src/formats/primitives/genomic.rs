//! Genomic coordinate intervals.
//!
//! All intervals use **0-based, half-open** coordinates `[start, end)`:
//! - Start position is inclusive (0-based)
//! - End position is exclusive
//! - Length = end - start
//!
//! Input conventions (1-based GFF/SAM/VCF/pairs, 0-based BED) are converted
//! to this form once, when a line is parsed.
//!
//! # Examples
//!
//! ```
//! use pairdex::formats::primitives::Interval;
//!
//! let a = Interval::new(100, 200)?;
//! let b = Interval::new(150, 250)?;
//! assert!(a.overlaps(&b));
//! assert!(b.overlaps(&a)); // Symmetric
//!
//! // Half-open: touching intervals do not overlap
//! let c = Interval::new(200, 300)?;
//! assert!(!a.overlaps(&c));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::formats::index::bins::MAX_COORDINATE;
use crate::formats::primitives::{FormatError, Result};
use std::fmt;

/// A half-open interval on one sequence.
///
/// # Invariants
///
/// - `start < end` (enforced by constructors)
/// - `end <= MAX_COORDINATE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    /// Start position (0-based, inclusive)
    pub start: u64,
    /// End position (0-based, exclusive)
    pub end: u64,
}

impl Interval {
    /// Creates a new interval.
    ///
    /// # Errors
    ///
    /// - [`FormatError::InvalidInterval`] if `start >= end`
    /// - [`FormatError::OutOfRange`] if `end` exceeds the indexable range
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start >= end {
            return Err(FormatError::InvalidInterval { start, end });
        }
        if end > MAX_COORDINATE {
            return Err(FormatError::OutOfRange { value: end });
        }
        Ok(Interval { start, end })
    }

    /// Interval covering a record's coordinates, with zero-length and
    /// point records widened to one base.
    ///
    /// `end` of `None` (no end column) is a point at `start`.
    pub fn from_record(start: u64, end: Option<u64>) -> Result<Self> {
        let end = match end {
            Some(end) if end > start => end,
            _ => start.saturating_add(1),
        };
        Interval::new(start, end)
    }

    /// The whole indexable axis
    pub const fn full() -> Self {
        Interval {
            start: 0,
            end: MAX_COORDINATE,
        }
    }

    /// Returns the length of this interval.
    #[inline]
    pub fn length(&self) -> u64 {
        self.end - self.start
    }

    /// Whether the two intervals share at least one position
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty() {
        assert!(Interval::new(10, 10).is_err());
        assert!(Interval::new(11, 10).is_err());
        assert!(Interval::new(0, MAX_COORDINATE + 1).is_err());
        assert_eq!(Interval::new(10, 11).unwrap().length(), 1);
    }

    #[test]
    fn test_from_record_widens_points() {
        assert_eq!(Interval::from_record(99, None).unwrap(), Interval::new(99, 100).unwrap());
        assert_eq!(
            Interval::from_record(99, Some(99)).unwrap(),
            Interval::new(99, 100).unwrap()
        );
        assert_eq!(
            Interval::from_record(99, Some(150)).unwrap(),
            Interval::new(99, 150).unwrap()
        );
    }

    #[test]
    fn test_overlaps() {
        let a = Interval::new(100, 200).unwrap();
        assert!(a.overlaps(&Interval::new(199, 300).unwrap()));
        assert!(!a.overlaps(&Interval::new(200, 300).unwrap()));
        assert!(!a.overlaps(&Interval::new(0, 100).unwrap()));
        assert!(a.overlaps(&Interval::full()));
    }
}
