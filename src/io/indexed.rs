//! Region queries over an indexed BGZF file.
//!
//! An [`IndexedReader`] owns its own file cursor and shares an immutable
//! [`BinIndex`]. Queries return a lazy [`Records`] iterator that reads only
//! the chunks the index selects and applies the exact overlap test to every
//! candidate line, so results contain no false positives and no duplicates,
//! in file order.
//!
//! # Example
//!
//! ```no_run
//! use pairdex::IndexedReader;
//!
//! # fn main() -> pairdex::Result<()> {
//! let mut reader = IndexedReader::open("contacts.pairs.gz")?;
//! for line in reader.query("chr1:1-5,000,000|chr2:1-5,000,000")? {
//!     let line = line?;
//!     println!("{}", String::from_utf8_lossy(&line));
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{PairdexError, Result};
use crate::formats::index::{sidecar_path, BinIndex, Chunk};
use crate::formats::preset::{Axis, Role};
use crate::formats::primitives::{parse_record, RecordCoords};
use crate::formats::region::RegionQuery;
use crate::io::SeekableBgzfReader;
use log::debug;
use std::fs::File;
use std::io::{self, Read, Seek};
use std::iter::FusedIterator;
use std::path::Path;
use std::sync::Arc;

/// Query handle over one data file and its index
pub struct IndexedReader<R> {
    index: Arc<BinIndex>,
    reader: SeekableBgzfReader<R>,
}

impl IndexedReader<File> {
    /// Open `path` and its sidecar `<path>.pdx`.
    ///
    /// # Errors
    ///
    /// - [`PairdexError::OpenFailure`] if either file is missing or unreadable
    /// - [`PairdexError::CorruptIndex`] if the sidecar fails validation
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Self::open_with_sidecar(path, sidecar_path(path))
    }

    /// Open a data file with an index stored at a custom path
    pub fn open_with_sidecar<P: AsRef<Path>, Q: AsRef<Path>>(path: P, sidecar: Q) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PairdexError::open(path, e))?;
        let index = BinIndex::from_path(sidecar)?;
        Self::with_index(Arc::new(index), file)
    }
}

impl<R: Read + Seek> IndexedReader<R> {
    /// Query session sharing an already loaded index
    pub fn with_index(index: Arc<BinIndex>, inner: R) -> Result<Self> {
        Ok(IndexedReader {
            index,
            reader: SeekableBgzfReader::new(inner)?,
        })
    }

    /// Records overlapping a region string.
    ///
    /// # Errors
    ///
    /// [`PairdexError::MalformedQuery`] if the region does not parse, or is
    /// two-dimensional while the index is not.
    pub fn query(&mut self, region: &str) -> Result<Records<'_, R>> {
        let query = region.parse::<RegionQuery>()?;
        self.query_region(query)
    }

    /// Records overlapping an already parsed region
    pub fn query_region(&mut self, query: RegionQuery) -> Result<Records<'_, R>> {
        self.records(vec![query])
    }

    /// Records for several regions, concatenated in region order.
    ///
    /// Every region is parsed before any data is read. A record matching
    /// two regions is returned once per region.
    pub fn query_batch<S: AsRef<str>>(&mut self, regions: &[S]) -> Result<Records<'_, R>> {
        let queries = regions
            .iter()
            .map(|r| r.as_ref().parse::<RegionQuery>())
            .collect::<Result<Vec<_>>>()?;
        self.records(queries)
    }

    /// Like [`query`](Self::query), but a 2D region `a|b` whose key is not
    /// indexed is answered from `b|a` (with the ranges swapped) when that
    /// key exists.
    pub fn query_autoflip(&mut self, region: &str) -> Result<Records<'_, R>> {
        let query = region.parse::<RegionQuery>()?;
        let query = match query.flipped() {
            Some(flipped)
                if !self.index.contains_key(&query.key())
                    && self.index.contains_key(&flipped.key()) =>
            {
                debug!("Flipping query {} to {}", query, flipped);
                flipped
            }
            _ => query,
        };
        self.query_region(query)
    }

    fn records(&mut self, queries: Vec<RegionQuery>) -> Result<Records<'_, R>> {
        let plans = queries
            .into_iter()
            .map(|query| -> Result<(RegionQuery, Vec<Chunk>)> {
                let chunks = self.index.chunks(&query)?;
                Ok((query, chunks))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Records {
            index: &self.index,
            reader: &mut self.reader,
            plans,
            plan: 0,
            chunk: 0,
            positioned: false,
            line: Vec::new(),
            done: false,
        })
    }
}

impl<R> IndexedReader<R> {
    /// The loaded index
    pub fn index(&self) -> &Arc<BinIndex> {
        &self.index
    }

    /// Indexed keys in first-seen order, in textual form
    pub fn sequence_keys(&self) -> Vec<String> {
        self.index.keys().iter().map(|k| k.to_string()).collect()
    }

    /// Whether a textual key (`name` or `name1|name2`) is indexed
    pub fn key_exists(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Whether the index has two axes
    pub fn is_two_dimensional(&self) -> bool {
        self.index.is_two_dimensional()
    }

    /// Number of data lines indexed
    pub fn record_count(&self) -> u64 {
        self.index.record_count()
    }

    /// 1-based column of an axis role, `None` if the axis is absent
    pub fn axis_column(&self, axis: Axis, role: Role) -> Option<usize> {
        self.index.config().column(axis, role)
    }

    /// Axis 1 sequence name column
    pub fn axis1_name_column(&self) -> Option<usize> {
        self.axis_column(Axis::First, Role::Name)
    }

    /// Axis 1 start column
    pub fn axis1_start_column(&self) -> Option<usize> {
        self.axis_column(Axis::First, Role::Start)
    }

    /// Axis 1 end column
    pub fn axis1_end_column(&self) -> Option<usize> {
        self.axis_column(Axis::First, Role::End)
    }

    /// Axis 2 sequence name column
    pub fn axis2_name_column(&self) -> Option<usize> {
        self.axis_column(Axis::Second, Role::Name)
    }

    /// Axis 2 start column
    pub fn axis2_start_column(&self) -> Option<usize> {
        self.axis_column(Axis::Second, Role::Start)
    }

    /// Axis 2 end column
    pub fn axis2_end_column(&self) -> Option<usize> {
        self.axis_column(Axis::Second, Role::End)
    }

    /// Release the file handle
    pub fn close(self) {}
}

/// Lazy sequence of matching lines, without line terminators
///
/// Yields `None` forever once exhausted or after yielding an error.
pub struct Records<'a, R> {
    index: &'a BinIndex,
    reader: &'a mut SeekableBgzfReader<R>,
    plans: Vec<(RegionQuery, Vec<Chunk>)>,
    plan: usize,
    chunk: usize,
    /// The cursor sits inside the current chunk
    positioned: bool,
    line: Vec<u8>,
    done: bool,
}

impl<R: Read + Seek> Records<'_, R> {
    fn fail(&mut self, err: PairdexError) -> Option<Result<Vec<u8>>> {
        self.done = true;
        Some(Err(err))
    }

    fn next_chunk(&mut self) {
        self.chunk += 1;
        self.positioned = false;
    }
}

impl<R: Read + Seek> Iterator for Records<'_, R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            let Some((_, chunks)) = self.plans.get(self.plan) else {
                self.done = true;
                return None;
            };
            let Some(&chunk) = chunks.get(self.chunk) else {
                self.plan += 1;
                self.chunk = 0;
                self.positioned = false;
                continue;
            };

            if !self.positioned {
                if self.reader.virtual_offset() != chunk.start {
                    if let Err(e) = self.reader.seek(chunk.start) {
                        return self.fail(seek_failure(&chunk, e));
                    }
                }
                self.positioned = true;
            }

            if self.reader.virtual_offset() >= chunk.end {
                self.next_chunk();
                continue;
            }

            match self.reader.read_record(&mut self.line) {
                Ok(0) => {
                    return self.fail(PairdexError::CorruptIndex(format!(
                        "chunk ending at {} runs past end of file",
                        chunk.end
                    )))
                }
                Ok(_) => {}
                Err(e) => return self.fail(PairdexError::from_block_read(e)),
            }

            let config = self.index.config();
            if self.line.is_empty() || self.line[0] == config.meta_char {
                continue;
            }

            let query = &self.plans[self.plan].0;
            let outcome = parse_record(&self.line, config).map(|coords| matches(query, &coords));
            match outcome {
                Ok(true) => return Some(Ok(std::mem::take(&mut self.line))),
                Ok(false) => {}
                Err(e) => {
                    let msg = format!(
                        "unparseable line in indexed chunk {}-{}: {}",
                        chunk.start, chunk.end, e
                    );
                    return self.fail(PairdexError::CorruptIndex(msg));
                }
            }
        }
    }
}

impl<R: Read + Seek> FusedIterator for Records<'_, R> {}

/// An offset outside its block comes from the index; anything else is the stream's
fn seek_failure(chunk: &Chunk, err: io::Error) -> PairdexError {
    match err.kind() {
        io::ErrorKind::InvalidInput => {
            PairdexError::CorruptIndex(format!("cannot seek to {}: {}", chunk.start, err))
        }
        _ => PairdexError::from_block_read(err),
    }
}

/// Exact overlap test of one parsed line against a query
fn matches(query: &RegionQuery, coords: &RecordCoords<'_>) -> bool {
    let first = query.first();
    if coords.name1 != first.name || !first.overlaps(&coords.interval1) {
        return false;
    }
    match (query.second(), coords.second) {
        (None, _) => true,
        (Some(q2), Some((name2, interval2))) => {
            name2 == q2.name && q2.overlaps(&interval2)
        }
        (Some(_), None) => false,
    }
}
