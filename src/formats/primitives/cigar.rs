//! Text CIGAR parsing for SAM records.
//!
//! Only the reference span matters for indexing: the number of reference
//! bases an alignment covers, which fixes the end coordinate of a SAM line.
//!
//! # Operations
//!
//! - M, D, N, =, X consume the reference
//! - I, S, H, P do not

use crate::formats::primitives::{FormatError, Result};

/// CIGAR operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    /// Match or mismatch (M)
    Match(u32),
    /// Insertion to reference (I)
    Insertion(u32),
    /// Deletion from reference (D)
    Deletion(u32),
    /// Skipped region from reference (N)
    RefSkip(u32),
    /// Soft clipping (S)
    SoftClip(u32),
    /// Hard clipping (H)
    HardClip(u32),
    /// Padding (P)
    Padding(u32),
    /// Sequence match (=)
    SeqMatch(u32),
    /// Sequence mismatch (X)
    SeqMismatch(u32),
}

impl CigarOp {
    fn from_parts(op: u8, len: u32) -> Option<Self> {
        Some(match op {
            b'M' => CigarOp::Match(len),
            b'I' => CigarOp::Insertion(len),
            b'D' => CigarOp::Deletion(len),
            b'N' => CigarOp::RefSkip(len),
            b'S' => CigarOp::SoftClip(len),
            b'H' => CigarOp::HardClip(len),
            b'P' => CigarOp::Padding(len),
            b'=' => CigarOp::SeqMatch(len),
            b'X' => CigarOp::SeqMismatch(len),
            _ => return None,
        })
    }

    /// Get the operation length.
    pub fn length(&self) -> u32 {
        match *self {
            CigarOp::Match(len)
            | CigarOp::Insertion(len)
            | CigarOp::Deletion(len)
            | CigarOp::RefSkip(len)
            | CigarOp::SoftClip(len)
            | CigarOp::HardClip(len)
            | CigarOp::Padding(len)
            | CigarOp::SeqMatch(len)
            | CigarOp::SeqMismatch(len) => len,
        }
    }

    /// Whether this operation advances along the reference
    pub fn consumes_reference(&self) -> bool {
        matches!(
            self,
            CigarOp::Match(_)
                | CigarOp::Deletion(_)
                | CigarOp::RefSkip(_)
                | CigarOp::SeqMatch(_)
                | CigarOp::SeqMismatch(_)
        )
    }
}

/// Parse a text CIGAR string such as `10M2I30M`.
///
/// `*` (unavailable) parses to an empty list.
///
/// # Errors
///
/// [`FormatError::InvalidCigar`] on an unknown operation, a missing length,
/// or a trailing length without an operation.
///
/// # Example
///
/// ```
/// use pairdex::formats::primitives::cigar::{parse_cigar, CigarOp};
///
/// let ops = parse_cigar(b"5S20M")?;
/// assert_eq!(ops, vec![CigarOp::SoftClip(5), CigarOp::Match(20)]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse_cigar(text: &[u8]) -> Result<Vec<CigarOp>> {
    let invalid = || FormatError::InvalidCigar(String::from_utf8_lossy(text).into_owned());

    if text == b"*" {
        return Ok(Vec::new());
    }

    let mut ops = Vec::new();
    let mut len: Option<u32> = None;
    for &byte in text {
        if byte.is_ascii_digit() {
            let digit = u32::from(byte - b'0');
            let next = len
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(invalid)?;
            len = Some(next);
        } else {
            let op_len = len.take().ok_or_else(invalid)?;
            ops.push(CigarOp::from_parts(byte, op_len).ok_or_else(invalid)?);
        }
    }
    if len.is_some() {
        return Err(invalid());
    }
    Ok(ops)
}

/// Number of reference bases covered by a text CIGAR
pub fn reference_length(text: &[u8]) -> Result<u64> {
    Ok(parse_cigar(text)?
        .iter()
        .filter(|op| op.consumes_reference())
        .map(|op| u64::from(op.length()))
        .sum())
}
