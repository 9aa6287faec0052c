//! Coordinate extraction from one delimited line.
//!
//! [`parse_record`] applies a [`FormatConfig`] to a line and returns the
//! sequence name(s) and 0-based half-open interval(s) it covers. The builder
//! calls it for every data line; the query engine calls it again on each
//! candidate line for the exact overlap test.

use crate::formats::preset::{AxisColumns, CoordinateSystem, FormatConfig, RecordKind};
use crate::formats::primitives::cigar;
use crate::formats::primitives::{FormatError, Interval, Result};

/// Coordinates of one data line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordCoords<'a> {
    /// Axis 1 sequence name
    pub name1: &'a str,
    /// Axis 1 interval
    pub interval1: Interval,
    /// Axis 2 name and interval, for two-dimensional layouts
    pub second: Option<(&'a str, Interval)>,
}

/// Extract the coordinates of `line` under `config`.
///
/// # Errors
///
/// Returns a [`FormatError`] when the line has too few fields, a coordinate
/// is not a non-negative integer, a name is not UTF-8, or a SAM CIGAR is
/// malformed. Line numbers are attached by the caller.
///
/// # Example
///
/// ```
/// use pairdex::formats::primitives::{parse_record, Interval};
/// use pairdex::formats::Preset;
///
/// let config = Preset::Pairs.config();
/// let coords = parse_record(b"r1\tchr1\t100\tchr2\t500\t+\t-", &config)?;
/// assert_eq!(coords.name1, "chr1");
/// assert_eq!(coords.interval1, Interval::new(99, 100)?);
/// assert_eq!(coords.second, Some(("chr2", Interval::new(499, 500)?)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse_record<'a>(line: &'a [u8], config: &FormatConfig) -> Result<RecordCoords<'a>> {
    let fields: Vec<&[u8]> = line.split(|&b| b == config.delimiter).collect();
    let expected = config.min_fields();
    if fields.len() < expected {
        return Err(FormatError::FieldCount {
            expected,
            actual: fields.len(),
        });
    }

    let (name1, start1, end1) = axis_fields(&fields, &config.axis1, config.coordinates)?;
    let end1 = match config.kind {
        RecordKind::Generic => end1,
        RecordKind::Sam => sam_end(&fields, start1)?,
        RecordKind::Vcf => vcf_end(&fields, start1)?,
    };
    let interval1 = Interval::from_record(start1, end1)?;

    let second = match &config.axis2 {
        Some(axis2) => {
            let (name2, start2, end2) = axis_fields(&fields, axis2, config.coordinates)?;
            Some((name2, Interval::from_record(start2, end2)?))
        }
        None => None,
    };

    Ok(RecordCoords {
        name1,
        interval1,
        second,
    })
}

/// Name, 0-based start and exclusive end (if a column gives one) of one axis
fn axis_fields<'a>(
    fields: &[&'a [u8]],
    columns: &AxisColumns,
    coordinates: CoordinateSystem,
) -> Result<(&'a str, u64, Option<u64>)> {
    let name = std::str::from_utf8(fields[columns.name]).map_err(|_| FormatError::InvalidName)?;
    // NUL terminates names in the sidecar's name table
    if name.is_empty() || name.contains('\0') {
        return Err(FormatError::InvalidName);
    }

    let start = parse_position(fields[columns.start], "start")?;
    let start = match coordinates {
        CoordinateSystem::OneBased => start.saturating_sub(1),
        CoordinateSystem::ZeroBased => start,
    };

    // A 1-based closed end and a 0-based half-open end are the same number
    let end = columns
        .end
        .map(|col| parse_position(fields[col], "end"))
        .transpose()?;

    Ok((name, start, end))
}

fn sam_end(fields: &[&[u8]], start: u64) -> Result<Option<u64>> {
    let span = cigar::reference_length(fields[5])?;
    offset_end(start, span)
}

fn vcf_end(fields: &[&[u8]], start: u64) -> Result<Option<u64>> {
    let info_end = match fields.get(7) {
        Some(info) => info_end(info)?,
        None => None,
    };
    if info_end.is_some() {
        return Ok(info_end);
    }
    let ref_len = fields[3].len() as u64;
    offset_end(start, ref_len)
}

/// `start + span`, or a point when `span` is zero
fn offset_end(start: u64, span: u64) -> Result<Option<u64>> {
    if span == 0 {
        return Ok(None);
    }
    start
        .checked_add(span)
        .map(Some)
        .ok_or(FormatError::OutOfRange { value: start })
}

/// Value of an `END=` key in a VCF INFO column
fn info_end(info: &[u8]) -> Result<Option<u64>> {
    info.split(|&b| b == b';')
        .find_map(|entry| entry.strip_prefix(b"END="))
        .map(|value| parse_position(value, "INFO END"))
        .transpose()
}

fn parse_position(field: &[u8], label: &'static str) -> Result<u64> {
    std::str::from_utf8(field)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| FormatError::InvalidField {
            field: label.to_string(),
            reason: format!("not a non-negative integer: '{}'", String::from_utf8_lossy(field)),
        })
}
