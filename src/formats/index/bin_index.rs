//! The in-memory index and its sidecar encoding.
//!
//! A [`BinIndex`] maps each sequence key to an [`IndexEntry`]:
//! - **Bins**: bin number → chunks of records assigned to that bin
//! - **Linear index** (per axis): 16 Kbp window → lowest offset of any
//!   record ending in or after that window
//!
//! # Sidecar layout
//!
//! The sidecar is a BGZF file whose decompressed payload is little-endian:
//!
//! ```text
//! magic       [u8; 4]   "PDX\x01"
//! version     u32
//! config      i32 × 11  kind, coords, name1, start1, end1, name2, start2,
//!                       end2, delimiter, meta_char, skip_lines  (-1 = none)
//! records     u64
//! n_keys      i32
//! l_nm        i32, then l_nm bytes of NUL-terminated key names
//! per key:
//!   n_bin     i32
//!   per bin:  bin u64, n_chunk i32, n_chunk × (start u64, end u64)
//!   n_intv1   i32, n_intv1 × u64
//!   n_intv2   i32, n_intv2 × u64   (0 for 1D data)
//! crc32       u32 over everything above
//! ```

use crate::error::{PairdexError, Result};
use crate::formats::index::bins::{
    self, bin_overlaps, composite, reg2bin, reg2bins, reg2bins_len, split_composite, window,
    BIN_COUNT, MAX_COORDINATE,
};
use crate::formats::index::chunk::{merge_chunks, Chunk};
use crate::formats::preset::{AxisColumns, CoordinateSystem, FormatConfig, RecordKind};
use crate::formats::primitives::Interval;
use crate::formats::region::RegionQuery;
use crate::io::{BgzfWriter, VirtualOffset};
use flate2::read::MultiGzDecoder;
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Leading bytes of every sidecar payload
pub const MAGIC: &[u8; 4] = b"PDX\x01";

/// Current sidecar payload version
pub const FORMAT_VERSION: u32 = 1;

/// Largest linear index any key can need
const MAX_WINDOWS: usize = (MAX_COORDINATE >> bins::MIN_SHIFT) as usize;

/// Identity of one indexed sequence or sequence pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SequenceKey {
    /// One-dimensional data
    Single(String),
    /// Two-dimensional data: axis 1 name, axis 2 name
    Pair(String, String),
}

impl SequenceKey {
    /// Axis 1 sequence name
    pub fn first(&self) -> &str {
        match self {
            SequenceKey::Single(name) | SequenceKey::Pair(name, _) => name,
        }
    }

    /// Axis 2 sequence name
    pub fn second(&self) -> Option<&str> {
        match self {
            SequenceKey::Single(_) => None,
            SequenceKey::Pair(_, name) => Some(name),
        }
    }

    fn from_text(text: &str, two_dimensional: bool) -> Option<Self> {
        if two_dimensional {
            let (first, second) = text.split_once('|')?;
            Some(SequenceKey::Pair(first.to_string(), second.to_string()))
        } else {
            Some(SequenceKey::Single(text.to_string()))
        }
    }
}

impl fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceKey::Single(name) => f.write_str(name),
            SequenceKey::Pair(a, b) => write!(f, "{}|{}", a, b),
        }
    }
}

/// Bins and linear indices of one sequence key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexEntry {
    /// Bin number → chunks, ordered by bin
    pub bins: BTreeMap<u64, Vec<Chunk>>,
    /// Axis 1 linear index
    pub linear1: Vec<VirtualOffset>,
    /// Axis 2 linear index (empty for 1D data)
    pub linear2: Vec<VirtualOffset>,
}

impl IndexEntry {
    /// Record one line spanning `chunk`
    pub(crate) fn add(&mut self, interval1: Interval, interval2: Option<Interval>, chunk: Chunk) {
        let bin1 = reg2bin(interval1.start, interval1.end);
        let bin = match interval2 {
            Some(iv2) => composite(bin1, reg2bin(iv2.start, iv2.end)),
            None => bin1,
        };

        let chunks = self.bins.entry(bin).or_default();
        match chunks.last_mut() {
            Some(last) if last.end == chunk.start => last.end = chunk.end,
            _ => chunks.push(chunk),
        }

        mark_window(&mut self.linear1, &interval1, chunk.start);
        if let Some(iv2) = interval2 {
            mark_window(&mut self.linear2, &iv2, chunk.start);
        }
    }

    /// Turn per-window minima into suffix minima
    pub(crate) fn finish(&mut self) {
        suffix_min(&mut self.linear1);
        suffix_min(&mut self.linear2);
    }

    /// Lowest offset any record overlapping a query starting at `start` can have.
    ///
    /// `None` means no record ends at or after `start`.
    fn lower_bound(linear: &[VirtualOffset], start: u64) -> Option<VirtualOffset> {
        linear.get(window(start)).copied()
    }

    fn candidate_bins(&self, iv1: &Interval, iv2: Option<&Interval>) -> Vec<u64> {
        let populated = self.bins.len() as u64;
        match iv2 {
            None => {
                if reg2bins_len(iv1.start, iv1.end) <= populated {
                    reg2bins(iv1.start, iv1.end)
                        .into_iter()
                        .filter(|bin| self.bins.contains_key(bin))
                        .collect()
                } else {
                    self.bins
                        .keys()
                        .copied()
                        .filter(|&bin| bin_overlaps(bin, iv1))
                        .collect()
                }
            }
            Some(iv2) => {
                let probes = reg2bins_len(iv1.start, iv1.end)
                    .saturating_mul(reg2bins_len(iv2.start, iv2.end));
                if probes <= populated {
                    let bins2 = reg2bins(iv2.start, iv2.end);
                    reg2bins(iv1.start, iv1.end)
                        .into_iter()
                        .flat_map(|b1| bins2.iter().map(move |&b2| composite(b1, b2)))
                        .filter(|bin| self.bins.contains_key(bin))
                        .collect()
                } else {
                    self.bins
                        .keys()
                        .copied()
                        .filter(|&bin| {
                            let (b1, b2) = split_composite(bin);
                            bin_overlaps(b1, iv1) && bin_overlaps(b2, iv2)
                        })
                        .collect()
                }
            }
        }
    }

    /// Chunks that may hold records overlapping the query, unmerged
    fn collect_chunks(&self, iv1: &Interval, iv2: Option<&Interval>, out: &mut Vec<Chunk>) {
        let Some(mut bound) = Self::lower_bound(&self.linear1, iv1.start) else {
            return;
        };
        if let Some(iv2) = iv2 {
            match Self::lower_bound(&self.linear2, iv2.start) {
                Some(bound2) => bound = bound.max(bound2),
                None => return,
            }
        }

        for bin in self.candidate_bins(iv1, iv2) {
            if let Some(chunks) = self.bins.get(&bin) {
                out.extend(chunks.iter().filter_map(|c| c.clamp_start(bound)));
            }
        }
    }
}

fn mark_window(linear: &mut Vec<VirtualOffset>, interval: &Interval, offset: VirtualOffset) {
    let last = window(interval.end - 1);
    if linear.len() <= last {
        linear.resize(last + 1, VirtualOffset::MAX);
    }
    if offset < linear[last] {
        linear[last] = offset;
    }
}

fn suffix_min(linear: &mut [VirtualOffset]) {
    let mut min = VirtualOffset::MAX;
    for slot in linear.iter_mut().rev() {
        min = min.min(*slot);
        *slot = min;
    }
}

/// Index over one data file
///
/// # Example
///
/// ```no_run
/// use pairdex::formats::index::BinIndex;
///
/// # fn main() -> pairdex::Result<()> {
/// let index = BinIndex::from_path("contacts.pairs.gz.pdx")?;
/// let chunks = index.chunks(&"chr1:1-1000000|chr2".parse()?)?;
/// println!("{} chunks to read", chunks.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinIndex {
    config: FormatConfig,
    keys: Vec<SequenceKey>,
    key_ids: HashMap<String, usize>,
    entries: Vec<IndexEntry>,
    record_count: u64,
}

impl BinIndex {
    pub(crate) fn new(
        config: FormatConfig,
        keys: Vec<SequenceKey>,
        entries: Vec<IndexEntry>,
        record_count: u64,
    ) -> Self {
        let key_ids = keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.to_string(), i))
            .collect();
        BinIndex {
            config,
            keys,
            key_ids,
            entries,
            record_count,
        }
    }

    /// Line layout the index was built with
    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    /// Whether keys are sequence pairs
    pub fn is_two_dimensional(&self) -> bool {
        self.config.is_two_dimensional()
    }

    /// Keys in first-seen order
    pub fn keys(&self) -> &[SequenceKey] {
        &self.keys
    }

    /// Whether the textual key (`name` or `name1|name2`) is indexed
    pub fn contains_key(&self, key: &str) -> bool {
        self.key_ids.contains_key(key)
    }

    /// Entry for a textual key
    pub fn entry(&self, key: &str) -> Option<&IndexEntry> {
        self.key_ids.get(key).map(|&i| &self.entries[i])
    }

    /// Number of data lines indexed
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Merged chunks that may hold records matching `query`, in file order.
    ///
    /// A one-dimensional query against 2D data covers every key whose axis 1
    /// name matches, over the whole of axis 2.
    ///
    /// # Errors
    ///
    /// [`PairdexError::MalformedQuery`] for a two-dimensional query against
    /// one-dimensional data.
    pub fn chunks(&self, query: &RegionQuery) -> Result<Vec<Chunk>> {
        if query.is_two_dimensional() && !self.is_two_dimensional() {
            return Err(PairdexError::MalformedQuery(format!(
                "{} (two-dimensional query on one-dimensional data)",
                query
            )));
        }

        let mut chunks = Vec::new();
        let first = query.first();
        // A range past the end of the axis covers nothing
        let Some(iv1) = first.interval else {
            return Ok(chunks);
        };

        match query.second() {
            Some(second) => {
                let Some(iv2) = second.interval else {
                    return Ok(chunks);
                };
                if let Some(entry) = self.entry(&query.key()) {
                    entry.collect_chunks(&iv1, Some(&iv2), &mut chunks);
                }
            }
            None if self.is_two_dimensional() => {
                let whole = Interval::full();
                for (key, entry) in self.keys.iter().zip(&self.entries) {
                    if key.first() == first.name {
                        entry.collect_chunks(&iv1, Some(&whole), &mut chunks);
                    }
                }
            }
            None => {
                if let Some(entry) = self.entry(&first.name) {
                    entry.collect_chunks(&iv1, None, &mut chunks);
                }
            }
        }

        let merged = merge_chunks(chunks);
        debug!("Query {} resolved to {} chunk(s)", query, merged.len());
        Ok(merged)
    }

    /// Load and validate a sidecar file.
    ///
    /// # Errors
    ///
    /// - [`PairdexError::OpenFailure`] if the file cannot be opened
    /// - [`PairdexError::CorruptIndex`] on any decoding or validation failure
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PairdexError::open(path, e))?;

        let mut payload = Vec::new();
        MultiGzDecoder::new(file)
            .read_to_end(&mut payload)
            .map_err(|e| corrupt(format!("cannot decompress {}: {}", path.display(), e)))?;

        let index = Self::decode(&payload)?;
        info!(
            "Loaded index {} ({} keys, {} records)",
            path.display(),
            index.keys.len(),
            index.record_count
        );
        Ok(index)
    }

    /// Write the sidecar as BGZF
    pub fn write_to<W: Write>(&self, writer: W) -> Result<W> {
        let mut bgzf = BgzfWriter::new(writer);
        bgzf.write_all(&self.encode())?;
        Ok(bgzf.finish()?)
    }

    /// Serialize the payload, checksum included
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        encode_config(&self.config, &mut buf);
        buf.extend_from_slice(&self.record_count.to_le_bytes());

        let mut names = Vec::new();
        for key in &self.keys {
            names.extend_from_slice(key.to_string().as_bytes());
            names.push(0);
        }
        push_len(&mut buf, self.keys.len());
        push_len(&mut buf, names.len());
        buf.extend_from_slice(&names);

        for entry in &self.entries {
            push_len(&mut buf, entry.bins.len());
            for (bin, chunks) in &entry.bins {
                buf.extend_from_slice(&bin.to_le_bytes());
                push_len(&mut buf, chunks.len());
                for chunk in chunks {
                    buf.extend_from_slice(&chunk.start.as_raw().to_le_bytes());
                    buf.extend_from_slice(&chunk.end.as_raw().to_le_bytes());
                }
            }
            for linear in [&entry.linear1, &entry.linear2] {
                push_len(&mut buf, linear.len());
                for offset in linear {
                    buf.extend_from_slice(&offset.as_raw().to_le_bytes());
                }
            }
        }

        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Parse and validate a payload produced by [`encode`](Self::encode)
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < MAGIC.len() + 4 {
            return Err(corrupt("payload too short"));
        }
        let (body, crc_bytes) = payload.split_at(payload.len() - 4);
        let stored = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
        if &body[..MAGIC.len()] != MAGIC {
            return Err(corrupt("bad magic"));
        }
        if crc32fast::hash(body) != stored {
            return Err(corrupt("checksum mismatch"));
        }

        let mut reader = &body[MAGIC.len()..];
        let version = read_u32(&mut reader)?;
        if version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported version {}", version)));
        }

        let config = decode_config(&mut reader)?;
        let two_dim = config.is_two_dimensional();
        let record_count = read_u64(&mut reader)?;

        let n_keys = read_len(&mut reader, "key count")?;
        let l_nm = read_len(&mut reader, "name block length")?;
        let names = take(&mut reader, l_nm)?;
        let keys = parse_key_names(names, two_dim)?;
        if keys.len() != n_keys {
            return Err(corrupt(format!(
                "{} key names for {} keys",
                keys.len(),
                n_keys
            )));
        }

        let max_bin = if two_dim { BIN_COUNT * BIN_COUNT } else { BIN_COUNT };
        let mut entries = Vec::with_capacity(n_keys.min(reader.len()));
        for _ in 0..n_keys {
            entries.push(decode_entry(&mut reader, max_bin, two_dim)?);
        }

        if !reader.is_empty() {
            return Err(corrupt(format!("{} trailing bytes", reader.len())));
        }

        let index = BinIndex::new(config, keys, entries, record_count);
        if index.key_ids.len() != index.keys.len() {
            return Err(corrupt("duplicate key names"));
        }
        Ok(index)
    }
}

fn corrupt(msg: impl Into<String>) -> PairdexError {
    PairdexError::CorruptIndex(msg.into())
}

fn push_len(buf: &mut Vec<u8>, len: usize) {
    buf.extend_from_slice(&(len as i32).to_le_bytes());
}

fn column_code(column: Option<usize>) -> i32 {
    column.map_or(-1, |c| c as i32)
}

fn encode_config(config: &FormatConfig, buf: &mut Vec<u8>) {
    let coords = match config.coordinates {
        CoordinateSystem::OneBased => 0,
        CoordinateSystem::ZeroBased => 1,
    };
    let axis2 = config.axis2.as_ref();
    let fields = [
        config.kind as i32,
        coords,
        config.axis1.name as i32,
        config.axis1.start as i32,
        column_code(config.axis1.end),
        column_code(axis2.map(|a| a.name)),
        column_code(axis2.map(|a| a.start)),
        column_code(axis2.and_then(|a| a.end)),
        i32::from(config.delimiter),
        i32::from(config.meta_char),
        config.skip_lines as i32,
    ];
    for field in fields {
        buf.extend_from_slice(&field.to_le_bytes());
    }
}

fn decode_config(reader: &mut &[u8]) -> Result<FormatConfig> {
    let mut fields = [0i32; 11];
    for field in fields.iter_mut() {
        *field = read_i32(reader)?;
    }
    let [kind, coords, name1, start1, end1, name2, start2, end2, delimiter, meta, skip] = fields;

    let kind = RecordKind::from_i32(kind).ok_or_else(|| corrupt(format!("unknown record kind {}", kind)))?;
    let coordinates = match coords {
        0 => CoordinateSystem::OneBased,
        1 => CoordinateSystem::ZeroBased,
        other => return Err(corrupt(format!("unknown coordinate system {}", other))),
    };

    let required = |v: i32| usize::try_from(v).map_err(|_| corrupt(format!("bad column {}", v)));
    let optional = |v: i32| -> Result<Option<usize>> {
        match v {
            -1 => Ok(None),
            v => required(v).map(Some),
        }
    };

    let axis1 = AxisColumns {
        name: required(name1)?,
        start: required(start1)?,
        end: optional(end1)?,
    };
    let axis2 = match (optional(name2)?, optional(start2)?) {
        (Some(name), Some(start)) => Some(AxisColumns {
            name,
            start,
            end: optional(end2)?,
        }),
        (None, None) if end2 == -1 => None,
        _ => return Err(corrupt("incomplete axis 2 columns")),
    };

    let byte = |v: i32| u8::try_from(v).map_err(|_| corrupt(format!("bad character code {}", v)));
    let config = FormatConfig {
        kind,
        coordinates,
        axis1,
        axis2,
        delimiter: byte(delimiter)?,
        meta_char: byte(meta)?,
        skip_lines: u32::try_from(skip).map_err(|_| corrupt(format!("bad skip count {}", skip)))?,
    };
    config.validate().map_err(corrupt)?;
    Ok(config)
}

fn decode_entry(reader: &mut &[u8], max_bin: u64, two_dim: bool) -> Result<IndexEntry> {
    let mut entry = IndexEntry::default();

    let n_bin = read_len(reader, "bin count")?;
    for _ in 0..n_bin {
        let bin = read_u64(reader)?;
        if bin >= max_bin {
            return Err(corrupt(format!("bin {} out of range", bin)));
        }
        let n_chunk = read_len(reader, "chunk count")?;
        let mut chunks = Vec::with_capacity(n_chunk.min(reader.len() / 16));
        for _ in 0..n_chunk {
            let start = VirtualOffset::from_raw(read_u64(reader)?);
            let end = VirtualOffset::from_raw(read_u64(reader)?);
            if start > end {
                return Err(corrupt(format!("inverted chunk {}-{} in bin {}", start, end, bin)));
            }
            chunks.push(Chunk::new(start, end));
        }
        if entry.bins.insert(bin, chunks).is_some() {
            return Err(corrupt(format!("bin {} listed twice", bin)));
        }
    }

    entry.linear1 = decode_linear(reader)?;
    entry.linear2 = decode_linear(reader)?;
    if !two_dim && !entry.linear2.is_empty() {
        return Err(corrupt("axis 2 linear index on one-dimensional data"));
    }
    Ok(entry)
}

fn decode_linear(reader: &mut &[u8]) -> Result<Vec<VirtualOffset>> {
    let n = read_len(reader, "linear index length")?;
    if n > MAX_WINDOWS {
        return Err(corrupt(format!("linear index of {} windows", n)));
    }
    let mut linear = Vec::with_capacity(n.min(reader.len() / 8));
    for _ in 0..n {
        linear.push(VirtualOffset::from_raw(read_u64(reader)?));
    }
    Ok(linear)
}

/// Split NUL-terminated key names
fn parse_key_names(buf: &[u8], two_dim: bool) -> Result<Vec<SequenceKey>> {
    if buf.is_empty() {
        return Ok(Vec::new());
    }
    let body = buf
        .strip_suffix(b"\0")
        .ok_or_else(|| corrupt("unterminated key name"))?;

    body.split(|&b| b == 0)
        .map(|raw| {
            let text = std::str::from_utf8(raw)
                .map_err(|e| corrupt(format!("invalid UTF-8 in key name: {}", e)))?;
            if text.is_empty() {
                return Err(corrupt("empty key name"));
            }
            SequenceKey::from_text(text, two_dim)
                .ok_or_else(|| corrupt(format!("key '{}' is not a sequence pair", text)))
        })
        .collect()
}

// Helper functions for reading binary data (little-endian)

fn take<'a>(reader: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if reader.len() < n {
        return Err(corrupt("truncated payload"));
    }
    let (head, tail) = reader.split_at(n);
    *reader = tail;
    Ok(head)
}

fn read_i32(reader: &mut &[u8]) -> Result<i32> {
    let bytes = take(reader, 4)?;
    Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_u32(reader: &mut &[u8]) -> Result<u32> {
    let bytes = take(reader, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_u64(reader: &mut &[u8]) -> Result<u64> {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(take(reader, 8)?);
    Ok(u64::from_le_bytes(buf))
}

fn read_len(reader: &mut &[u8], what: &str) -> Result<usize> {
    let value = read_i32(reader)?;
    usize::try_from(value).map_err(|_| corrupt(format!("negative {} {}", what, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::preset::Preset;

    fn offset(raw: u64) -> VirtualOffset {
        VirtualOffset::from_raw(raw)
    }

    fn iv(start: u64, end: u64) -> Interval {
        Interval::new(start, end).unwrap()
    }

    fn sample_1d() -> BinIndex {
        let mut entry = IndexEntry::default();
        entry.add(iv(100, 200), None, Chunk::new(offset(0), offset(10)));
        entry.add(iv(150, 250), None, Chunk::new(offset(10), offset(20)));
        entry.add(iv(40_000, 40_100), None, Chunk::new(offset(20), offset(30)));
        entry.finish();
        BinIndex::new(
            Preset::Bed.config(),
            vec![SequenceKey::Single("chr1".into())],
            vec![entry],
            3,
        )
    }

    #[test]
    fn test_adjacent_chunks_coalesce() {
        let index = sample_1d();
        let entry = index.entry("chr1").unwrap();
        let leaf = reg2bin(100, 200);
        assert_eq!(entry.bins[&leaf], vec![Chunk::new(offset(0), offset(20))]);
    }

    #[test]
    fn test_linear_index_suffix_min() {
        let index = sample_1d();
        let entry = index.entry("chr1").unwrap();
        // Window 1 holds no record end and inherits the minimum of window 2
        assert_eq!(entry.linear1, vec![offset(0), offset(20), offset(20)]);
    }

    #[test]
    fn test_linear_index_unsorted_input() {
        let mut entry = IndexEntry::default();
        entry.add(iv(40_000, 40_100), None, Chunk::new(offset(0), offset(10)));
        entry.add(iv(100, 200), None, Chunk::new(offset(10), offset(20)));
        entry.finish();
        // Window 0 must still admit the first record of the file
        assert_eq!(entry.linear1[0], offset(0));
        assert_eq!(entry.linear1[2], offset(0));
    }

    #[test]
    fn test_chunks_prune_by_linear_index() {
        let index = sample_1d();
        let far = index.chunks(&"chr1:40001-40050".parse().unwrap()).unwrap();
        assert_eq!(far, vec![Chunk::new(offset(20), offset(30))]);

        let beyond = index.chunks(&"chr1:100000-200000".parse().unwrap()).unwrap();
        assert!(beyond.is_empty());

        let absent = index.chunks(&"chrZ".parse().unwrap()).unwrap();
        assert!(absent.is_empty());

        let past_axis = index.chunks(&"chr1:5000000000-6000000000".parse().unwrap()).unwrap();
        assert!(past_axis.is_empty());
    }

    #[test]
    fn test_two_dimensional_query_on_1d_index() {
        let index = sample_1d();
        let err = index.chunks(&"chr1|chr2".parse().unwrap()).unwrap_err();
        assert!(matches!(err, PairdexError::MalformedQuery(_)));
    }

    #[test]
    fn test_encode_decode() {
        let index = sample_1d();
        let decoded = BinIndex::decode(&index.encode()).unwrap();
        assert_eq!(decoded, index);
    }

    #[test]
    fn test_decode_rejects_bit_flip() {
        let mut payload = sample_1d().encode();
        let mid = payload.len() / 2;
        payload[mid] ^= 0x40;
        assert!(matches!(
            BinIndex::decode(&payload),
            Err(PairdexError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_decode_rejects_truncation_and_garbage() {
        let payload = sample_1d().encode();
        for cut in [0, 3, 8, payload.len() / 2, payload.len() - 1] {
            assert!(matches!(
                BinIndex::decode(&payload[..cut]),
                Err(PairdexError::CorruptIndex(_))
            ));
        }
        assert!(matches!(
            BinIndex::decode(b"not an index at all"),
            Err(PairdexError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_pair_key_names() {
        let keys = parse_key_names(b"chr1|chr2\0chr2|chr2\0", true).unwrap();
        assert_eq!(
            keys,
            vec![
                SequenceKey::Pair("chr1".into(), "chr2".into()),
                SequenceKey::Pair("chr2".into(), "chr2".into()),
            ]
        );
        assert_eq!(keys[0].to_string(), "chr1|chr2");
        assert!(parse_key_names(b"chr1\0", true).is_err());
        assert!(parse_key_names(b"chr1", false).is_err());
        assert!(parse_key_names(b"", false).unwrap().is_empty());
    }
}
