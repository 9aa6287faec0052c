//! Hierarchical binning scheme.
//!
//! Each axis is divided into a tree of bins: level 0 is one bin spanning the
//! whole axis, and every level below splits each bin into 8. The finest level
//! has 16 Kbp bins (`MIN_SHIFT = 14`) and the tree is `DEPTH = 6` levels deep
//! below the root, so one axis addresses `2^32` positions with 299,593 bins.
//!
//! An interval is assigned to the smallest bin that wholly contains it
//! ([`reg2bin`]). Every interval overlapping a query lives in one of the bins
//! returned by [`reg2bins`].
//!
//! Two-dimensional data uses composite bins: `bin1 * BIN_COUNT + bin2`.

use crate::formats::primitives::Interval;

/// Bit width of the finest bins (and of linear index windows)
pub const MIN_SHIFT: u32 = 14;

/// Number of levels below the root bin
pub const DEPTH: u32 = 6;

/// Exclusive upper bound of indexable coordinates
pub const MAX_COORDINATE: u64 = 1 << (MIN_SHIFT + 3 * DEPTH);

/// Number of bins on one axis
pub const BIN_COUNT: u64 = ((1 << (3 * (DEPTH + 1))) - 1) / 7;

/// Width of a linear index window
pub const LINEAR_WINDOW: u64 = 1 << MIN_SHIFT;

/// First bin number at `level`
#[inline]
const fn level_offset(level: u32) -> u64 {
    ((1 << (3 * level)) - 1) / 7
}

/// Bit shift of bin boundaries at `level`
#[inline]
const fn level_shift(level: u32) -> u32 {
    MIN_SHIFT + 3 * (DEPTH - level)
}

/// Smallest bin wholly containing `[beg, end)`.
///
/// # Example
///
/// ```
/// use pairdex::formats::index::bins::{reg2bin, BIN_COUNT};
///
/// // Within one 16 Kbp window: a leaf bin
/// let leaf = reg2bin(100, 200);
/// assert!(leaf >= 37449 && leaf < BIN_COUNT);
///
/// // Spanning the whole axis: the root
/// assert_eq!(reg2bin(0, 1 << 32), 0);
/// ```
pub fn reg2bin(beg: u64, end: u64) -> u64 {
    let end = end.max(beg + 1) - 1;
    for level in (1..=DEPTH).rev() {
        let shift = level_shift(level);
        if beg >> shift == end >> shift {
            return level_offset(level) + (beg >> shift);
        }
    }
    0
}

/// Every bin that may hold an interval overlapping `[beg, end)`, by level.
pub fn reg2bins(beg: u64, end: u64) -> Vec<u64> {
    let end = end.max(beg + 1) - 1;
    let mut bins = Vec::with_capacity(reg2bins_len(beg, end + 1) as usize);
    for level in 0..=DEPTH {
        let shift = level_shift(level);
        let offset = level_offset(level);
        bins.extend(offset + (beg >> shift)..=offset + (end >> shift));
    }
    bins
}

/// Number of bins [`reg2bins`] would return, without materialising them
pub fn reg2bins_len(beg: u64, end: u64) -> u64 {
    let end = end.max(beg + 1) - 1;
    (0..=DEPTH)
        .map(|level| {
            let shift = level_shift(level);
            (end >> shift) - (beg >> shift) + 1
        })
        .sum()
}

/// Level of a bin number
pub fn bin_level(bin: u64) -> u32 {
    (1..=DEPTH)
        .rev()
        .find(|&level| bin >= level_offset(level))
        .unwrap_or(0)
}

/// Coordinate span `[start, end)` covered by a bin
pub fn bin_span(bin: u64) -> Interval {
    let level = bin_level(bin);
    let shift = level_shift(level);
    let start = (bin - level_offset(level)) << shift;
    Interval {
        start,
        end: start + (1 << shift),
    }
}

/// Whether a bin's span intersects `interval`
#[inline]
pub fn bin_overlaps(bin: u64, interval: &Interval) -> bool {
    bin_span(bin).overlaps(interval)
}

/// Combine per-axis bins into one 2D bin number
#[inline]
pub fn composite(bin1: u64, bin2: u64) -> u64 {
    bin1 * BIN_COUNT + bin2
}

/// Split a 2D bin number into per-axis bins
#[inline]
pub fn split_composite(bin: u64) -> (u64, u64) {
    (bin / BIN_COUNT, bin % BIN_COUNT)
}

/// Linear index window containing `pos`
#[inline]
pub fn window(pos: u64) -> usize {
    (pos >> MIN_SHIFT) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_constants() {
        assert_eq!(BIN_COUNT, 299_593);
        assert_eq!(MAX_COORDINATE, 1 << 32);
        assert_eq!(level_offset(DEPTH), 37_449);
    }

    #[test]
    fn test_reg2bin_levels() {
        assert_eq!(reg2bin(0, 1), level_offset(DEPTH));
        assert_eq!(reg2bin(16_384, 16_385), level_offset(DEPTH) + 1);
        // Crosses a leaf boundary: one level up
        assert_eq!(reg2bin(16_383, 16_385), level_offset(DEPTH - 1));
        assert_eq!(reg2bin(0, MAX_COORDINATE), 0);
    }

    #[test]
    fn test_reg2bins_small_region() {
        let bins = reg2bins(1000, 2000);
        assert_eq!(bins.len(), (DEPTH + 1) as usize);
        assert_eq!(bins[0], 0);
        for pair in bins.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(reg2bins_len(1000, 2000), bins.len() as u64);
    }

    #[test]
    fn test_full_axis_covers_every_bin() {
        assert_eq!(reg2bins_len(0, MAX_COORDINATE), BIN_COUNT);
    }

    #[test]
    fn test_bin_span() {
        assert_eq!(bin_span(0), Interval::full());
        let leaf = level_offset(DEPTH) + 3;
        assert_eq!(
            bin_span(leaf),
            Interval {
                start: 3 * LINEAR_WINDOW,
                end: 4 * LINEAR_WINDOW
            }
        );
    }

    #[test]
    fn test_composite_round_trip() {
        let c = composite(4681, 37_450);
        assert_eq!(split_composite(c), (4681, 37_450));
    }

    proptest! {
        #[test]
        fn prop_assigned_bin_contains_interval(beg in 0u64..(MAX_COORDINATE - 1), len in 1u64..5_000_000) {
            let end = (beg + len).min(MAX_COORDINATE);
            let span = bin_span(reg2bin(beg, end));
            prop_assert!(span.start <= beg && end <= span.end);
        }

        #[test]
        fn prop_overlapping_record_bin_is_candidate(
            rec_beg in 0u64..10_000_000, rec_len in 1u64..200_000,
            q_beg in 0u64..10_000_000, q_len in 1u64..200_000,
        ) {
            let record = Interval { start: rec_beg, end: rec_beg + rec_len };
            let query = Interval { start: q_beg, end: q_beg + q_len };
            if record.overlaps(&query) {
                let bin = reg2bin(record.start, record.end);
                prop_assert!(reg2bins(query.start, query.end).contains(&bin));
                prop_assert!(bin_overlaps(bin, &query));
            }
        }
    }
}
