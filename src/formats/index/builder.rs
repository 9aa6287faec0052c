//! Index construction.
//!
//! [`IndexBuilder`] scans a BGZF data file once, assigns every data line to a
//! bin, and writes the resulting [`BinIndex`] next to the data file as
//! `<data>.pdx`. Input need not be sorted; unsorted input is indexed
//! correctly but reported once at `warn` level.
//!
//! # Example
//!
//! ```no_run
//! use pairdex::formats::index::{BuildStatus, IndexBuilder};
//!
//! # fn main() -> pairdex::Result<()> {
//! match IndexBuilder::new().preset("pairs").build("contacts.pairs.gz")? {
//!     BuildStatus::Built { records, keys } => println!("{} records, {} keys", records, keys),
//!     BuildStatus::AlreadyUpToDate => println!("index is current"),
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{PairdexError, Result};
use crate::formats::index::bin_index::{BinIndex, IndexEntry, SequenceKey};
use crate::formats::index::chunk::Chunk;
use crate::formats::preset::{ExplicitColumns, FormatConfig};
use crate::formats::primitives::parse_record;
use crate::io::{is_bgzf, SeekableBgzfReader};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name suffix of sidecar indexes
pub const SIDECAR_SUFFIX: &str = ".pdx";

/// Sidecar path for a data file: `<data>.pdx`
pub fn sidecar_path<P: AsRef<Path>>(data: P) -> PathBuf {
    let mut path = data.as_ref().as_os_str().to_owned();
    path.push(SIDECAR_SUFFIX);
    PathBuf::from(path)
}

/// Outcome of [`IndexBuilder::build`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// A new sidecar was written
    Built {
        /// Data lines indexed
        records: u64,
        /// Distinct sequence keys
        keys: usize,
    },
    /// The sidecar is at least as new as the data file; nothing was done
    AlreadyUpToDate,
}

/// Configures and runs an index build
#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    preset: Option<String>,
    columns: Option<ExplicitColumns>,
    force: bool,
    sidecar: Option<PathBuf>,
}

impl IndexBuilder {
    /// Builder with preset sniffing from the file name
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a named preset
    pub fn preset(mut self, name: impl Into<String>) -> Self {
        self.preset = Some(name.into());
        self
    }

    /// Use explicit columns (overrides any preset)
    pub fn columns(mut self, columns: ExplicitColumns) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Rebuild even if the sidecar is up to date
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Write the sidecar somewhere other than `<data>.pdx`
    pub fn sidecar_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sidecar = Some(path.into());
        self
    }

    /// Index `data` and write the sidecar.
    ///
    /// The configuration is resolved first so that column and preset errors
    /// surface even when the sidecar is current.
    ///
    /// # Errors
    ///
    /// - [`PairdexError::InvalidColumns`], [`PairdexError::UnknownPreset`],
    ///   [`PairdexError::PresetUndetermined`] from configuration
    /// - [`PairdexError::OpenFailure`] if the data file cannot be opened
    /// - [`PairdexError::NotBlockCompressed`] if it is not BGZF
    /// - [`PairdexError::BuildFailure`] on a malformed line or write failure
    pub fn build<P: AsRef<Path>>(&self, data: P) -> Result<BuildStatus> {
        let data = data.as_ref();
        let config = FormatConfig::resolve(self.preset.as_deref(), self.columns.as_ref(), data)?;
        let sidecar = self.sidecar.clone().unwrap_or_else(|| sidecar_path(data));

        let data_meta = fs::metadata(data).map_err(|e| PairdexError::open(data, e))?;
        if !self.force && is_up_to_date(&data_meta, &sidecar) {
            info!("Index {} is up to date", sidecar.display());
            return Ok(BuildStatus::AlreadyUpToDate);
        }

        if !is_bgzf(data)? {
            return Err(PairdexError::NotBlockCompressed(data.to_path_buf()));
        }

        let file = File::open(data).map_err(|e| PairdexError::open(data, e))?;
        let reader = SeekableBgzfReader::new(file)?;
        let index = build_from_reader(reader, config)?;

        write_atomically(&index, &sidecar).map_err(|e| PairdexError::BuildFailure {
            line: None,
            msg: format!("cannot write {}: {}", sidecar.display(), e),
        })?;

        info!(
            "Indexed {} records in {} keys from {}",
            index.record_count(),
            index.keys().len(),
            data.display()
        );
        Ok(BuildStatus::Built {
            records: index.record_count(),
            keys: index.keys().len(),
        })
    }
}

/// Build an index with default settings; see [`IndexBuilder::build`]
pub fn build_index<P: AsRef<Path>>(
    data: P,
    preset: Option<&str>,
    columns: Option<&ExplicitColumns>,
    force: bool,
) -> Result<BuildStatus> {
    let mut builder = IndexBuilder::new().force(force);
    if let Some(preset) = preset {
        builder = builder.preset(preset);
    }
    if let Some(columns) = columns {
        builder = builder.columns(columns.clone());
    }
    builder.build(data)
}

fn is_up_to_date(data_meta: &fs::Metadata, sidecar: &Path) -> bool {
    let (Ok(data_time), Ok(index_time)) = (
        data_meta.modified(),
        fs::metadata(sidecar).and_then(|m| m.modified()),
    ) else {
        return false;
    };
    index_time >= data_time
}

fn write_atomically(index: &BinIndex, sidecar: &Path) -> Result<()> {
    let dir = sidecar
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = NamedTempFile::new_in(dir)?;
    let temp = index.write_to(temp)?;
    temp.persist(sidecar).map_err(|e| e.error)?;
    Ok(())
}

/// Tracks whether keys and starts arrive in sorted order
#[derive(Default)]
struct SortCheck {
    current: Option<(usize, u64)>,
    finished: Vec<bool>,
    warned: bool,
}

impl SortCheck {
    fn observe(&mut self, key_id: usize, start: u64, line: usize) {
        if self.warned {
            return;
        }
        let unsorted = match self.current {
            Some((prev, prev_start)) if prev == key_id => start < prev_start,
            Some((prev, _)) => {
                self.finished[prev] = true;
                self.finished.get(key_id).copied().unwrap_or(false)
            }
            None => false,
        };
        if self.finished.len() <= key_id {
            self.finished.resize(key_id + 1, false);
        }
        if unsorted {
            warn!("Input is not sorted (first seen at line {}); index remains valid", line);
            self.warned = true;
        }
        self.current = Some((key_id, start));
    }
}

/// Scan a BGZF stream and build an index in memory.
///
/// Header (`skip_lines`), comment (`meta_char`) and empty lines are skipped.
/// The first malformed data line aborts the build.
pub fn build_from_reader<R: Read + Seek>(
    mut reader: SeekableBgzfReader<R>,
    config: FormatConfig,
) -> Result<BinIndex> {
    let mut keys: Vec<SequenceKey> = Vec::new();
    let mut key_ids: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<IndexEntry> = Vec::new();
    let mut sort_check = SortCheck::default();
    let mut record_count = 0u64;

    let mut line = Vec::new();
    let mut key_text = String::new();
    let mut line_no = 0usize;

    loop {
        let start = reader.virtual_offset();
        let n = reader
            .read_record(&mut line)
            .map_err(|e| PairdexError::build_at(line_no + 1, e.to_string()))?;
        if n == 0 {
            break;
        }
        line_no += 1;

        if line_no <= config.skip_lines as usize
            || line.is_empty()
            || line[0] == config.meta_char
        {
            continue;
        }
        let end = reader.virtual_offset();

        let coords =
            parse_record(&line, &config).map_err(|e| PairdexError::build_at(line_no, e.to_string()))?;

        key_text.clear();
        key_text.push_str(coords.name1);
        if let Some((name2, _)) = coords.second {
            key_text.push('|');
            key_text.push_str(name2);
        }

        let key_id = match key_ids.get(key_text.as_str()) {
            Some(&id) => id,
            None => {
                let id = keys.len();
                keys.push(match coords.second {
                    Some((name2, _)) => SequenceKey::Pair(coords.name1.to_string(), name2.to_string()),
                    None => SequenceKey::Single(coords.name1.to_string()),
                });
                key_ids.insert(key_text.clone(), id);
                entries.push(IndexEntry::default());
                debug!("New key '{}' at line {}", key_text, line_no);
                id
            }
        };

        sort_check.observe(key_id, coords.interval1.start, line_no);
        entries[key_id].add(
            coords.interval1,
            coords.second.map(|(_, iv)| iv),
            Chunk::new(start, end),
        );
        record_count += 1;
    }

    for entry in &mut entries {
        entry.finish();
    }
    Ok(BinIndex::new(config, keys, entries, record_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::preset::Preset;
    use crate::io::BgzfWriter;
    use std::io::{Cursor, Write};

    fn bgzf(text: &str) -> SeekableBgzfReader<Cursor<Vec<u8>>> {
        let mut writer = BgzfWriter::with_block_size(Vec::new(), 64);
        writer.write_all(text.as_bytes()).unwrap();
        let bytes = writer.finish().unwrap();
        SeekableBgzfReader::new(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path("/data/a.pairs.gz"),
            PathBuf::from("/data/a.pairs.gz.pdx")
        );
    }

    #[test]
    fn test_keys_in_first_seen_order() {
        let text = "#header\nchr2\t1\t10\nchr1\t5\t20\n\nchr2\t30\t40\n";
        let index = build_from_reader(bgzf(text), Preset::Bed.config()).unwrap();
        let names: Vec<String> = index.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["chr2", "chr1"]);
        assert_eq!(index.record_count(), 3);
    }

    #[test]
    fn test_pair_keys() {
        let text = "r1\tchr1\t100\tchr2\t200\t+\t+\nr2\tchr2\t5\tchr1\t9\t-\t+\n";
        let index = build_from_reader(bgzf(text), Preset::Pairs.config()).unwrap();
        assert!(index.contains_key("chr1|chr2"));
        assert!(index.contains_key("chr2|chr1"));
        assert!(!index.contains_key("chr1"));
        assert_eq!(
            index.keys()[0],
            SequenceKey::Pair("chr1".to_string(), "chr2".to_string())
        );
    }

    #[test]
    fn test_skip_lines() {
        let config = FormatConfig {
            skip_lines: 1,
            ..Preset::Bed.config()
        };
        let index = build_from_reader(bgzf("not a record\nchr1\t1\t2\n"), config).unwrap();
        assert_eq!(index.record_count(), 1);
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let text = "chr1\t1\t10\nchr1\t5\t20\nchr1\tx\t30\n";
        let err = build_from_reader(bgzf(text), Preset::Bed.config()).unwrap_err();
        assert!(matches!(err, PairdexError::BuildFailure { line: Some(3), .. }));
    }

    #[test]
    fn test_sort_check() {
        let mut check = SortCheck::default();
        check.observe(0, 10, 1);
        check.observe(0, 20, 2);
        check.observe(1, 5, 3);
        assert!(!check.warned);
        check.observe(0, 30, 4);
        assert!(check.warned);

        let mut check = SortCheck::default();
        check.observe(0, 20, 1);
        check.observe(0, 10, 2);
        assert!(check.warned);
    }
}
