//! Region query strings.
//!
//! Grammar (1-based, inclusive):
//!
//! ```text
//! query  := region | region '|' region
//! region := name | name ':' start | name ':' start '-' | name ':' start '-' end
//! ```
//!
//! Commas inside numbers are ignored (`chr1:1,000,000-2,000,000`). A missing
//! start or end extends to that end of the axis. Names may themselves contain
//! `:`; only a numeric-looking suffix after the last `:` is read as a range.

use crate::error::{PairdexError, Result};
use crate::formats::index::bins::MAX_COORDINATE;
use crate::formats::primitives::Interval;
use std::fmt;
use std::str::FromStr;

/// One axis of a query: sequence name plus 0-based half-open interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Sequence name
    pub name: String,
    /// Queried interval; `None` when the range starts past the end of the
    /// indexable axis, so nothing can match
    pub interval: Option<Interval>,
}

impl Region {
    /// Region covering all of `name`
    pub fn whole(name: impl Into<String>) -> Self {
        Region {
            name: name.into(),
            interval: Some(Interval::full()),
        }
    }

    /// Whether `interval` on this region's sequence falls inside the queried range
    pub fn overlaps(&self, interval: &Interval) -> bool {
        self.interval.map_or(false, |q| q.overlaps(interval))
    }

    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (name, range) = match text.rsplit_once(':') {
            Some((name, range)) if looks_like_range(range) => (name, Some(range)),
            _ => (text, None),
        };
        if name.is_empty() {
            return None;
        }

        let interval = match range {
            Some(range) => parse_range(range)?,
            None => Some(Interval::full()),
        };
        Some(Region {
            name: name.to_string(),
            interval,
        })
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.interval {
            Some(iv) => write!(f, "{}:{}-{}", self.name, iv.start + 1, iv.end),
            None => write!(f, "{}:{}-", self.name, MAX_COORDINATE + 1),
        }
    }
}

fn looks_like_range(range: &str) -> bool {
    range
        .chars()
        .all(|c| c.is_ascii_digit() || c == ',' || c == '-')
}

/// 1-based inclusive `start[-[end]]` to a 0-based half-open interval.
///
/// `None` if malformed; `Some(None)` if well formed but starting past the
/// end of the axis. Ends beyond the axis are clamped.
fn parse_range(range: &str) -> Option<Option<Interval>> {
    let range: String = range.chars().filter(|&c| c != ',').collect();
    if range.is_empty() {
        return Some(Some(Interval::full()));
    }

    let (start, end) = match range.split_once('-') {
        Some((start, end)) => (start, Some(end)),
        None => (range.as_str(), None),
    };

    let begin = if start.is_empty() {
        0
    } else {
        start.parse::<u64>().ok()?.saturating_sub(1)
    };
    let end = match end {
        Some(end) if !end.is_empty() => end.parse::<u64>().ok()?,
        _ => u64::MAX,
    };

    if begin >= end {
        return None;
    }
    if begin >= MAX_COORDINATE {
        return Some(None);
    }
    Interval::new(begin, end.min(MAX_COORDINATE)).ok().map(Some)
}

/// A parsed one- or two-dimensional query
///
/// # Example
///
/// ```
/// use pairdex::formats::RegionQuery;
///
/// let query: RegionQuery = "chr1:1,001-2,000|chrX".parse()?;
/// let (first, second) = match &query {
///     RegionQuery::Pair(a, b) => (a, b),
///     RegionQuery::Single(_) => unreachable!(),
/// };
/// assert_eq!(first.interval.map(|iv| (iv.start, iv.end)), Some((1000, 2000)));
/// assert_eq!(second.name, "chrX");
/// assert_eq!(query.key(), "chr1|chrX");
/// # Ok::<(), pairdex::PairdexError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionQuery {
    /// `name:start-end`
    Single(Region),
    /// `name1:start-end|name2:start-end`
    Pair(Region, Region),
}

impl RegionQuery {
    /// Whether the query names two axes
    pub fn is_two_dimensional(&self) -> bool {
        matches!(self, RegionQuery::Pair(..))
    }

    /// Axis 1 region
    pub fn first(&self) -> &Region {
        match self {
            RegionQuery::Single(r) | RegionQuery::Pair(r, _) => r,
        }
    }

    /// Axis 2 region, if any
    pub fn second(&self) -> Option<&Region> {
        match self {
            RegionQuery::Single(_) => None,
            RegionQuery::Pair(_, r) => Some(r),
        }
    }

    /// Textual sequence key (`name` or `name1|name2`)
    pub fn key(&self) -> String {
        match self {
            RegionQuery::Single(r) => r.name.clone(),
            RegionQuery::Pair(a, b) => format!("{}|{}", a.name, b.name),
        }
    }

    /// The same query with its axes swapped; `None` for one-dimensional queries
    pub fn flipped(&self) -> Option<RegionQuery> {
        match self {
            RegionQuery::Single(_) => None,
            RegionQuery::Pair(a, b) => Some(RegionQuery::Pair(b.clone(), a.clone())),
        }
    }
}

impl FromStr for RegionQuery {
    type Err = PairdexError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || PairdexError::MalformedQuery(s.to_string());

        let mut parts = s.split('|');
        let first = parts.next().and_then(Region::parse).ok_or_else(malformed)?;
        let query = match parts.next() {
            None => RegionQuery::Single(first),
            Some(second) => {
                let second = Region::parse(second).ok_or_else(malformed)?;
                RegionQuery::Pair(first, second)
            }
        };
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(query)
    }
}

impl fmt::Display for RegionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionQuery::Single(r) => write!(f, "{}", r),
            RegionQuery::Pair(a, b) => write!(f, "{}|{}", a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(s: &str) -> Region {
        match s.parse::<RegionQuery>().unwrap() {
            RegionQuery::Single(r) => r,
            other => panic!("expected 1D query, got {:?}", other),
        }
    }

    #[test]
    fn test_full_range() {
        let r = single("chr1:100-200");
        assert_eq!(r.name, "chr1");
        assert_eq!(r.interval, Some(Interval::new(99, 200).unwrap()));
    }

    #[test]
    fn test_open_ranges() {
        assert_eq!(single("chr1").interval, Some(Interval::full()));
        assert_eq!(
            single("chr1:100").interval,
            Some(Interval::new(99, MAX_COORDINATE).unwrap())
        );
        assert_eq!(
            single("chr1:100-").interval,
            Some(Interval::new(99, MAX_COORDINATE).unwrap())
        );
        assert_eq!(single("chr1:-50").interval, Some(Interval::new(0, 50).unwrap()));
        assert_eq!(single("chr1:0-10").interval, Some(Interval::new(0, 10).unwrap()));
    }

    #[test]
    fn test_commas_stripped() {
        let r = single("chr1:1,000,001-2,000,000");
        assert_eq!(r.interval, Some(Interval::new(1_000_000, 2_000_000).unwrap()));
    }

    #[test]
    fn test_name_with_colon() {
        // A numeric suffix is always a range
        let r = single("HLA-A*01:01");
        assert_eq!(r.name, "HLA-A*01");
        assert_eq!(r.interval, Some(Interval::new(0, MAX_COORDINATE).unwrap()));

        let r = single("HLA:A:x");
        assert_eq!(r.name, "HLA:A:x");
        assert_eq!(r.interval, Some(Interval::full()));
    }

    #[test]
    fn test_pair() {
        let q: RegionQuery = "chr1:10-20|chr2:30-40".parse().unwrap();
        assert!(q.is_two_dimensional());
        assert_eq!(q.key(), "chr1|chr2");
        assert_eq!(q.second().unwrap().interval, Some(Interval::new(29, 40).unwrap()));

        let flipped = q.flipped().unwrap();
        assert_eq!(flipped.key(), "chr2|chr1");
        assert_eq!(flipped.first().interval, Some(Interval::new(29, 40).unwrap()));
    }

    #[test]
    fn test_malformed() {
        for bad in ["", ":1-10", "chr1:20-10", "chr1:1-2-3", "a|b|c", "chr1|", "chr1:10-5|chr2"] {
            assert!(
                matches!(bad.parse::<RegionQuery>(), Err(PairdexError::MalformedQuery(_))),
                "{:?} should be malformed",
                bad
            );
        }
    }

    #[test]
    fn test_range_past_axis_end() {
        // Ends are clamped to the axis
        let r = single("chr1:4,294,967,000-9,000,000,000");
        assert_eq!(r.interval, Some(Interval::new(4_294_966_999, MAX_COORDINATE).unwrap()));

        // Well formed but wholly beyond the axis: parses, covers nothing
        let r = single("chr1:5000000000-6000000000");
        assert_eq!(r.interval, None);
        assert!(!r.overlaps(&Interval::new(0, MAX_COORDINATE).unwrap()));
        assert_eq!(r.to_string(), "chr1:4294967297-");
        assert_eq!(single(&r.to_string()).interval, None);

        assert!(matches!(
            "chr1:6000000000-5000000000".parse::<RegionQuery>(),
            Err(PairdexError::MalformedQuery(_))
        ));
    }

    #[test]
    fn test_display_is_one_based() {
        assert_eq!(single("chr1:100-200").to_string(), "chr1:100-200");
    }
}
