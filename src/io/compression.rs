//! BGZF block-compressed container support
//!
//! BGZF files are a series of independent gzip members ("blocks"), each
//! decompressing to at most 64 KB. Because every block can be inflated on its
//! own, a position in the decompressed stream can be addressed with a
//! [`VirtualOffset`] and reached with one file seek plus one block inflate.
//!
//! This module provides both directions:
//! - [`SeekableBgzfReader`]: random-access line reader (seek by virtual offset)
//! - [`BgzfWriter`]: block writer with parallel compression
//! - [`is_bgzf`]: container validation used before indexing
//!
//! # Block Structure
//!
//! Each BGZF block:
//! - Bytes 0-1: Gzip magic (31, 139)
//! - Byte 2: CM=8 (deflate)
//! - Byte 3: FLG with FEXTRA (0x04) set
//! - Bytes 4-9: MTIME, XFL, OS
//! - Bytes 10-11: XLEN (extra field length)
//! - Extra subfields, including BSIZE
//!   - SI1=66 ('B'), SI2=67 ('C')
//!   - SLEN=2 (2-byte BSIZE field)
//!   - BSIZE (little-endian u16): total block size - 1
//! - Deflate payload, CRC32, ISIZE

use crate::error::Result;
use crate::io::VirtualOffset;
use flate2::read::GzDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Number of blocks compressed together by [`BgzfWriter`]
///
/// Memory budget: 8 × 64 KB uncompressed + 8 × ~64 KB compressed, bounded
/// regardless of output size.
pub const PARALLEL_BLOCK_COUNT: usize = 8;

/// Default uncompressed payload per block written by [`BgzfWriter`]
///
/// Kept below 64 KB so that incompressible data still fits the 16-bit BSIZE.
pub const BGZF_BLOCK_SIZE: usize = 0xff00;

/// Upper bound on decompressed block size
const MAX_BLOCK_SIZE: usize = 1 << 16;

/// Fixed gzip header length before the extra field
const GZIP_FIXED_HEADER: usize = 12;

/// Standard 28-byte BGZF end-of-file marker (an empty block)
const BGZF_EOF: [u8; 28] = [
    31, 139, 8, 4, 0, 0, 0, 0, 0, 255, // Header (10 bytes)
    6, 0, 66, 67, 2, 0, 27, 0, // Extra field with BSIZE=27 (8 bytes)
    3, 0, // Empty deflate block (2 bytes)
    0, 0, 0, 0, // CRC32 (4 bytes)
    0, 0, 0, 0, // ISIZE=0 (4 bytes)
];

/// Read into `buf` until it is full or the reader is exhausted.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Find the total block size from the BC subfield of a gzip extra field.
fn bsize_from_extra(extra: &[u8]) -> Option<usize> {
    let mut pos = 0;
    while pos + 4 <= extra.len() {
        let si1 = extra[pos];
        let si2 = extra[pos + 1];
        let slen = u16::from_le_bytes([extra[pos + 2], extra[pos + 3]]) as usize;

        if si1 == 66 && si2 == 67 && slen == 2 && pos + 6 <= extra.len() {
            let bsize = u16::from_le_bytes([extra[pos + 4], extra[pos + 5]]);
            return Some(bsize as usize + 1); // BSIZE is block_size - 1
        }

        pos += 4 + slen;
    }
    None
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Read one complete compressed block from the stream.
///
/// Returns `Ok(None)` on a clean end of stream.
fn read_block<R: Read>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut header = [0u8; GZIP_FIXED_HEADER];
    let n = read_full(reader, &mut header)?;
    if n == 0 {
        return Ok(None);
    }
    if n < GZIP_FIXED_HEADER {
        return Err(invalid_data(format!(
            "Truncated BGZF header ({} of {} bytes)",
            n, GZIP_FIXED_HEADER
        )));
    }

    if header[0] != 31 || header[1] != 139 {
        return Err(invalid_data(format!(
            "Invalid gzip magic: [{}, {}]",
            header[0], header[1]
        )));
    }
    if header[3] & 0x04 == 0 {
        return Err(invalid_data(
            "Gzip member without extra field is not a BGZF block".to_string(),
        ));
    }

    let xlen = u16::from_le_bytes([header[10], header[11]]) as usize;
    let mut extra = vec![0u8; xlen];
    reader.read_exact(&mut extra)?;

    let block_size = bsize_from_extra(&extra)
        .ok_or_else(|| invalid_data("Gzip member has no BSIZE subfield".to_string()))?;

    let already_read = GZIP_FIXED_HEADER + xlen;
    if block_size < already_read + 8 {
        return Err(invalid_data(format!(
            "Invalid block size: {} < {}",
            block_size,
            already_read + 8
        )));
    }

    let mut block = Vec::with_capacity(block_size);
    block.extend_from_slice(&header);
    block.extend_from_slice(&extra);
    block.resize(block_size, 0);
    reader.read_exact(&mut block[already_read..])?;

    Ok(Some(block))
}

/// Decompress a single BGZF block (CRC is verified by the gzip decoder)
fn decompress_block(block: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(block);
    let mut decompressed = Vec::with_capacity(MAX_BLOCK_SIZE);
    decoder.read_to_end(&mut decompressed)?;
    if decompressed.len() > MAX_BLOCK_SIZE {
        return Err(invalid_data(format!(
            "BGZF block decompresses to {} bytes (max {})",
            decompressed.len(),
            MAX_BLOCK_SIZE
        )));
    }
    Ok(decompressed)
}

/// Check whether a file is a BGZF container.
///
/// Inspects only the first block header: gzip magic, deflate method,
/// FEXTRA flag, and the `BC` subfield. Plain gzip files return `false`.
///
/// # Example
///
/// ```no_run
/// use pairdex::io::is_bgzf;
///
/// # fn main() -> pairdex::Result<()> {
/// if !is_bgzf("contacts.pairs.gz")? {
///     eprintln!("compress with bgzip first");
/// }
/// # Ok(())
/// # }
/// ```
pub fn is_bgzf<P: AsRef<Path>>(path: P) -> Result<bool> {
    let mut file = File::open(path.as_ref())?;

    let mut header = [0u8; GZIP_FIXED_HEADER];
    if read_full(&mut file, &mut header)? < GZIP_FIXED_HEADER {
        return Ok(false);
    }
    if header[0] != 31 || header[1] != 139 || header[2] != 8 || header[3] & 0x04 == 0 {
        return Ok(false);
    }

    let xlen = u16::from_le_bytes([header[10], header[11]]) as usize;
    let mut extra = vec![0u8; xlen];
    if read_full(&mut file, &mut extra)? < xlen {
        return Ok(false);
    }

    Ok(bsize_from_extra(&extra).is_some())
}

/// Random-access reader over a BGZF stream.
///
/// Positions are expressed as [`VirtualOffset`]s. The reader implements
/// [`BufRead`], handing out the remainder of the current decompressed block.
///
/// When the current block is fully consumed, [`virtual_offset`] reports the
/// start of the *next* block (`(next_block, 0)`) rather than the end of the
/// current one. Offsets recorded while indexing and offsets compared while
/// querying therefore always agree.
///
/// [`virtual_offset`]: SeekableBgzfReader::virtual_offset
///
/// # Example
///
/// ```no_run
/// use pairdex::io::{SeekableBgzfReader, VirtualOffset};
/// use std::fs::File;
///
/// # fn main() -> std::io::Result<()> {
/// let mut reader = SeekableBgzfReader::new(File::open("data.bed.gz")?)?;
/// let mut line = Vec::new();
///
/// let first = reader.virtual_offset();
/// reader.read_record(&mut line)?;
///
/// // Come back later
/// reader.seek(first)?;
/// reader.read_record(&mut line)?;
/// # Ok(())
/// # }
/// ```
pub struct SeekableBgzfReader<R> {
    inner: R,
    /// Decompressed data of the current block
    block: Vec<u8>,
    /// Read position within `block`
    pos: usize,
    /// Compressed offset of the current block
    block_offset: u64,
    /// Compressed offset of the block after the current one
    next_block_offset: u64,
    /// No blocks left after the current one
    eof: bool,
}

impl SeekableBgzfReader<File> {
    /// Open a BGZF file for random access
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::new(File::open(path)?)
    }
}

impl<R: Read + Seek> SeekableBgzfReader<R> {
    /// Wrap a seekable byte stream positioned at a block boundary
    pub fn new(mut inner: R) -> io::Result<Self> {
        let start = inner.stream_position()?;
        Ok(Self {
            inner,
            block: Vec::new(),
            pos: 0,
            block_offset: start,
            next_block_offset: start,
            eof: false,
        })
    }

    /// Load the block at `next_block_offset`; the inner stream must be positioned there.
    fn load_next_block(&mut self) -> io::Result<bool> {
        self.block_offset = self.next_block_offset;
        self.pos = 0;

        match read_block(&mut self.inner)? {
            Some(compressed) => {
                self.block = decompress_block(&compressed)?;
                self.next_block_offset = self.block_offset + compressed.len() as u64;
                Ok(true)
            }
            None => {
                self.block.clear();
                self.eof = true;
                Ok(false)
            }
        }
    }

    /// Current position as a virtual offset
    pub fn virtual_offset(&self) -> VirtualOffset {
        if self.pos >= self.block.len() {
            VirtualOffset::new(self.next_block_offset, 0)
        } else {
            VirtualOffset::new(self.block_offset, self.pos as u16)
        }
    }

    /// Seek to a virtual offset.
    ///
    /// Re-uses the current block when the target lies inside it, so
    /// consecutive chunks in the same block cost no extra inflate.
    pub fn seek(&mut self, offset: VirtualOffset) -> io::Result<()> {
        let compressed = offset.compressed_offset();
        let within = offset.uncompressed_offset() as usize;

        let resident = compressed == self.block_offset && !self.block.is_empty();
        if !resident {
            self.inner.seek(SeekFrom::Start(compressed))?;
            self.next_block_offset = compressed;
            self.eof = false;
            self.load_next_block()?;
        }

        if within > self.block.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Virtual offset {} points past the end of a {}-byte block",
                    offset,
                    self.block.len()
                ),
            ));
        }

        self.pos = within;
        Ok(())
    }

    /// Read one line into `buf` (cleared first), without its line terminator.
    ///
    /// Lines may span block boundaries. Returns the number of bytes consumed
    /// from the stream, including the terminator; `0` means end of stream.
    pub fn read_record(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        buf.clear();
        let n = self.read_until(b'\n', buf)?;
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        Ok(n)
    }

    /// Get the inner reader
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> BufRead for SeekableBgzfReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        // Loop skips empty blocks (including the EOF marker)
        while self.pos >= self.block.len() {
            if self.eof || !self.load_next_block()? {
                return Ok(&[]);
            }
        }
        Ok(&self.block[self.pos..])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.block.len());
    }
}

impl<R: Read + Seek> Read for SeekableBgzfReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = {
            let available = self.fill_buf()?;
            let n = available.len().min(buf.len());
            buf[..n].copy_from_slice(&available[..n]);
            n
        };
        self.consume(n);
        Ok(n)
    }
}

/// Parallel BGZF writer
///
/// # Architecture
///
/// 1. Buffer input until [`PARALLEL_BLOCK_COUNT`] blocks are full
/// 2. Compress those blocks in parallel using rayon
/// 3. Write compressed blocks sequentially with BGZF headers
/// 4. [`finish`](BgzfWriter::finish) flushes the tail and writes the EOF marker
///
/// Output is readable by any BGZF tool (`bgzip -d`, `tabix`) and by
/// [`SeekableBgzfReader`].
///
/// # Example
///
/// ```no_run
/// use pairdex::io::BgzfWriter;
/// use std::io::Write;
///
/// # fn main() -> std::io::Result<()> {
/// let mut writer = BgzfWriter::from_path("regions.bed.gz")?;
/// writer.write_all(b"chr1\t100\t200\n")?;
/// writer.finish()?;
/// # Ok(())
/// # }
/// ```
pub struct BgzfWriter<W: Write> {
    /// Underlying writer for compressed output
    writer: W,
    /// Uncompressed bytes per block
    block_size: usize,
    /// Full blocks waiting to be compressed
    pending: Vec<Vec<u8>>,
    /// Block currently being filled
    current: Vec<u8>,
}

impl BgzfWriter<BufWriter<File>> {
    /// Create (truncate) a BGZF file
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> BgzfWriter<W> {
    /// Create a writer with the default block size
    pub fn new(writer: W) -> Self {
        Self::with_block_size(writer, BGZF_BLOCK_SIZE)
    }

    /// Create a writer with a custom uncompressed block size.
    ///
    /// Sizes are clamped to `1..=BGZF_BLOCK_SIZE`. Small blocks are useful
    /// for exercising records that straddle block boundaries.
    pub fn with_block_size(writer: W, block_size: usize) -> Self {
        let block_size = block_size.clamp(1, BGZF_BLOCK_SIZE);
        Self {
            writer,
            block_size,
            pending: Vec::with_capacity(PARALLEL_BLOCK_COUNT),
            current: Vec::with_capacity(block_size),
        }
    }

    /// Compress a single block to BGZF format
    ///
    /// Header (10 bytes): ID1=31, ID2=139, CM=8, FLG=4 (FEXTRA), MTIME=0,
    /// XFL=0, OS=255. Extra field (8 bytes): XLEN=6, 'B', 'C', SLEN=2, BSIZE.
    /// Then the raw deflate stream, CRC32 and ISIZE.
    fn compress_block(data: &[u8]) -> io::Result<Vec<u8>> {
        let mut deflate = DeflateEncoder::new(Vec::new(), Compression::default());
        deflate.write_all(data)?;
        let deflated = deflate.finish()?;

        let crc = crc32fast::hash(data);
        let isize = data.len() as u32;

        let mut block = Vec::with_capacity(deflated.len() + 26);
        block.extend_from_slice(&[31, 139, 8, 4, 0, 0, 0, 0, 0, 255]);
        block.extend_from_slice(&6u16.to_le_bytes()); // XLEN
        block.extend_from_slice(&[66, 67]);
        block.extend_from_slice(&2u16.to_le_bytes()); // SLEN

        let bsize_pos = block.len();
        block.extend_from_slice(&0u16.to_le_bytes()); // BSIZE placeholder

        block.extend_from_slice(&deflated);
        block.extend_from_slice(&crc.to_le_bytes());
        block.extend_from_slice(&isize.to_le_bytes());

        let total_size = block.len();
        if total_size > MAX_BLOCK_SIZE {
            return Err(invalid_data(format!(
                "Compressed block of {} bytes exceeds BGZF limit",
                total_size
            )));
        }
        let bsize = (total_size - 1) as u16;
        block[bsize_pos..bsize_pos + 2].copy_from_slice(&bsize.to_le_bytes());

        Ok(block)
    }

    /// Compress and write all pending blocks
    fn flush_blocks(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let compressed: Vec<_> = self
            .pending
            .par_iter()
            .map(|block| Self::compress_block(block))
            .collect::<io::Result<Vec<_>>>()?;

        for block in compressed {
            self.writer.write_all(&block)?;
        }

        self.pending.clear();
        Ok(())
    }

    /// Write the partial block, the EOF marker, and return the inner writer
    pub fn finish(mut self) -> io::Result<W> {
        if !self.current.is_empty() {
            let tail = std::mem::take(&mut self.current);
            self.pending.push(tail);
        }
        self.flush_blocks()?;

        self.writer.write_all(&BGZF_EOF)?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> Write for BgzfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut remaining = buf;

        while !remaining.is_empty() {
            let space = self.block_size - self.current.len();
            let to_copy = remaining.len().min(space);

            self.current.extend_from_slice(&remaining[..to_copy]);
            remaining = &remaining[to_copy..];

            if self.current.len() >= self.block_size {
                let block = std::mem::replace(
                    &mut self.current,
                    Vec::with_capacity(self.block_size),
                );
                self.pending.push(block);

                if self.pending.len() >= PARALLEL_BLOCK_COUNT {
                    self.flush_blocks()?;
                }
            }
        }

        Ok(buf.len())
    }

    /// Writes out complete blocks; the partially filled block stays buffered.
    fn flush(&mut self) -> io::Result<()> {
        self.flush_blocks()?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    fn bgzf_bytes(data: &[u8], block_size: usize) -> Vec<u8> {
        let mut writer = BgzfWriter::with_block_size(Vec::new(), block_size);
        writer.write_all(data).unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_round_trip_small_blocks() {
        let data: Vec<u8> = (0..5000).flat_map(|i| format!("line {}\n", i).into_bytes()).collect();
        let compressed = bgzf_bytes(&data, 100);

        let mut reader = SeekableBgzfReader::new(Cursor::new(compressed)).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_ends_with_eof_marker() {
        let compressed = bgzf_bytes(b"abc\n", 1024);
        assert!(compressed.ends_with(&BGZF_EOF));
    }

    #[test]
    fn test_read_record_strips_terminators() {
        let compressed = bgzf_bytes(b"first\r\nsecond\nthird", 4);
        let mut reader = SeekableBgzfReader::new(Cursor::new(compressed)).unwrap();
        let mut line = Vec::new();

        assert_eq!(reader.read_record(&mut line).unwrap(), 7);
        assert_eq!(line, b"first");
        assert_eq!(reader.read_record(&mut line).unwrap(), 7);
        assert_eq!(line, b"second");
        assert_eq!(reader.read_record(&mut line).unwrap(), 5);
        assert_eq!(line, b"third");
        assert_eq!(reader.read_record(&mut line).unwrap(), 0);
        assert!(line.is_empty());
    }

    #[test]
    fn test_seek_returns_to_recorded_offsets() {
        let data: Vec<u8> = (0..300).flat_map(|i| format!("record-{:04}\n", i).into_bytes()).collect();
        // 50-byte blocks force records across block boundaries
        let compressed = bgzf_bytes(&data, 50);
        let mut reader = SeekableBgzfReader::new(Cursor::new(compressed)).unwrap();

        let mut offsets = Vec::new();
        let mut line = Vec::new();
        loop {
            let offset = reader.virtual_offset();
            if reader.read_record(&mut line).unwrap() == 0 {
                break;
            }
            offsets.push((offset, line.clone()));
        }
        assert_eq!(offsets.len(), 300);

        for (offset, expected) in offsets.iter().rev().step_by(7) {
            reader.seek(*offset).unwrap();
            reader.read_record(&mut line).unwrap();
            assert_eq!(&line, expected);
        }
    }

    #[test]
    fn test_offsets_are_monotonic() {
        let data: Vec<u8> = (0..200).flat_map(|i| format!("{}\n", i).into_bytes()).collect();
        let compressed = bgzf_bytes(&data, 64);
        let mut reader = SeekableBgzfReader::new(Cursor::new(compressed)).unwrap();

        let mut line = Vec::new();
        let mut previous = reader.virtual_offset();
        while reader.read_record(&mut line).unwrap() > 0 {
            let current = reader.virtual_offset();
            assert!(current > previous);
            previous = current;
        }
    }

    #[test]
    fn test_block_end_reports_next_block() {
        // Exactly one block's worth of data: the offset after it is (next, 0)
        let compressed = bgzf_bytes(b"0123456789\n", 11);
        let mut reader = SeekableBgzfReader::new(Cursor::new(compressed.clone())).unwrap();
        let mut line = Vec::new();
        reader.read_record(&mut line).unwrap();

        let offset = reader.virtual_offset();
        assert_eq!(offset.uncompressed_offset(), 0);
        assert_eq!(offset.compressed_offset() as usize, compressed.len() - BGZF_EOF.len());
    }

    #[test]
    fn test_seek_past_block_end_is_error() {
        let compressed = bgzf_bytes(b"short\n", 1024);
        let mut reader = SeekableBgzfReader::new(Cursor::new(compressed)).unwrap();
        assert!(reader.seek(VirtualOffset::new(0, 500)).is_err());
    }

    #[test]
    fn test_plain_gzip_is_rejected() {
        use flate2::write::GzEncoder;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"not blocked\n").unwrap();
        let gz = encoder.finish().unwrap();

        let mut reader = SeekableBgzfReader::new(Cursor::new(gz)).unwrap();
        let mut line = Vec::new();
        let err = reader.read_record(&mut line).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_is_bgzf() {
        let bgzf = NamedTempFile::new().unwrap();
        std::fs::write(bgzf.path(), bgzf_bytes(b"chr1\t1\t2\n", 1024)).unwrap();
        assert!(is_bgzf(bgzf.path()).unwrap());

        let plain = NamedTempFile::new().unwrap();
        std::fs::write(plain.path(), b"chr1\t1\t2\n").unwrap();
        assert!(!is_bgzf(plain.path()).unwrap());

        let empty = NamedTempFile::new().unwrap();
        assert!(!is_bgzf(empty.path()).unwrap());
    }

    #[test]
    fn test_writer_flush_keeps_partial_block() {
        let mut writer = BgzfWriter::with_block_size(Vec::new(), 1024);
        writer.write_all(b"partial").unwrap();
        writer.flush().unwrap();
        let out = writer.finish().unwrap();

        let mut reader = SeekableBgzfReader::new(Cursor::new(out)).unwrap();
        let mut data = String::new();
        reader.read_to_string(&mut data).unwrap();
        assert_eq!(data, "partial");
    }
}
