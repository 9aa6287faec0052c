//! Line layouts: which columns hold coordinates, and the built-in presets.
//!
//! A [`FormatConfig`] tells the indexer and the query engine how to pull the
//! sequence name(s) and interval(s) out of one line. Axis 2 is optional; its
//! absence makes the file one-dimensional.
//!
//! Configurations come from one of three places, in priority order:
//! 1. [`ExplicitColumns`] supplied by the caller (1-based, validated)
//! 2. A named [`Preset`]
//! 3. The data file name (suffix sniffing)
//!
//! # Example
//!
//! ```
//! use pairdex::formats::{FormatConfig, Preset};
//! use std::path::Path;
//!
//! // Inferred from the suffix
//! let config = FormatConfig::resolve(None, None, Path::new("contacts.pairs.gz"))?;
//! assert_eq!(config, Preset::Pairs.config());
//! assert!(config.is_two_dimensional());
//! # Ok::<(), pairdex::PairdexError>(())
//! ```

use crate::error::{PairdexError, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// How the end coordinate of axis 1 is obtained
///
/// Stored in the sidecar as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Start and end read from columns
    Generic = 0,
    /// SAM: end derived from the CIGAR string (column 6)
    Sam = 1,
    /// VCF: end derived from REF length (column 4) or INFO `END=`
    Vcf = 2,
}

impl RecordKind {
    pub(crate) fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(RecordKind::Generic),
            1 => Some(RecordKind::Sam),
            2 => Some(RecordKind::Vcf),
            _ => None,
        }
    }
}

/// Coordinate convention of the start column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// 1-based, closed (GFF, SAM, VCF, pairs)
    OneBased,
    /// 0-based, half-open (BED)
    ZeroBased,
}

/// Which coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Axis 1 (the only axis of 1D data)
    First,
    /// Axis 2 (2D data only)
    Second,
}

/// Which column of an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Sequence name column
    Name,
    /// Start coordinate column
    Start,
    /// End coordinate column
    End,
}

/// Column positions of one axis (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisColumns {
    /// Sequence name column
    pub name: usize,
    /// Start coordinate column
    pub start: usize,
    /// End coordinate column; `None` means the end is derived from the start
    pub end: Option<usize>,
}

impl AxisColumns {
    const fn new(name: usize, start: usize, end: Option<usize>) -> Self {
        AxisColumns { name, start, end }
    }

    fn max_column(&self) -> usize {
        self.name.max(self.start).max(self.end.unwrap_or(0))
    }
}

/// How to parse one line of a delimited data file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatConfig {
    /// End-coordinate derivation for axis 1
    pub kind: RecordKind,
    /// Start coordinate convention (both axes)
    pub coordinates: CoordinateSystem,
    /// Axis 1 columns
    pub axis1: AxisColumns,
    /// Axis 2 columns, `None` for one-dimensional data
    pub axis2: Option<AxisColumns>,
    /// Field delimiter
    pub delimiter: u8,
    /// Lines starting with this byte are never indexed
    pub meta_char: u8,
    /// Leading lines to skip unconditionally
    pub skip_lines: u32,
}

impl FormatConfig {
    /// Resolve the configuration for a data file.
    ///
    /// Explicit columns take precedence, then a preset name (an empty name
    /// counts as absent), then the file name suffix.
    ///
    /// # Errors
    ///
    /// - [`PairdexError::InvalidColumns`] if explicit columns fail validation
    /// - [`PairdexError::UnknownPreset`] if the preset name is not built in
    /// - [`PairdexError::PresetUndetermined`] if nothing matches the file name
    pub fn resolve(
        preset: Option<&str>,
        columns: Option<&ExplicitColumns>,
        path: &Path,
    ) -> Result<Self> {
        if let Some(columns) = columns {
            return columns.to_config();
        }

        match preset.map(str::trim).filter(|p| !p.is_empty()) {
            Some(name) => Ok(name.parse::<Preset>()?.config()),
            None => Preset::from_path(path)
                .map(Preset::config)
                .ok_or_else(|| PairdexError::PresetUndetermined(path.to_path_buf())),
        }
    }

    /// Whether the layout has a second axis
    pub fn is_two_dimensional(&self) -> bool {
        self.axis2.is_some()
    }

    /// Columns of one axis, `None` if the axis is absent
    pub fn axis(&self, axis: Axis) -> Option<&AxisColumns> {
        match axis {
            Axis::First => Some(&self.axis1),
            Axis::Second => self.axis2.as_ref(),
        }
    }

    /// 1-based column index, or `None` if the axis is absent.
    ///
    /// For an axis without an end column the start column is reported as the
    /// end column, since the end coordinate is derived from it.
    pub fn column(&self, axis: Axis, role: Role) -> Option<usize> {
        let columns = self.axis(axis)?;
        let zero_based = match role {
            Role::Name => columns.name,
            Role::Start => columns.start,
            Role::End => columns.end.unwrap_or(columns.start),
        };
        Some(zero_based + 1)
    }

    /// Minimum number of fields a data line must have
    pub(crate) fn min_fields(&self) -> usize {
        let mut max = self.axis1.max_column();
        if let Some(axis2) = &self.axis2 {
            max = max.max(axis2.max_column());
        }
        match self.kind {
            RecordKind::Generic => max + 1,
            RecordKind::Sam => max.max(5) + 1,
            RecordKind::Vcf => max.max(3) + 1,
        }
    }

    /// Structural sanity checks shared by explicit columns and index loading
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        let check_axis = |label: &str, axis: &AxisColumns| -> std::result::Result<(), String> {
            if axis.name == axis.start {
                return Err(format!("{} name and start share column {}", label, axis.name + 1));
            }
            match axis.end {
                Some(end) if end == axis.start => Err(format!(
                    "{} start and end share column {}",
                    label,
                    end + 1
                )),
                Some(end) if end == axis.name => Err(format!(
                    "{} name and end share column {}",
                    label,
                    end + 1
                )),
                _ => Ok(()),
            }
        };

        check_axis("axis 1", &self.axis1)?;
        if let Some(axis2) = &self.axis2 {
            check_axis("axis 2", axis2)?;
        }
        if self.delimiter == b'\n' {
            return Err("newline cannot be the field delimiter".to_string());
        }
        Ok(())
    }
}

/// Built-in layouts for well-known formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// GFF/GTF annotations
    Gff,
    /// BED intervals (0-based)
    Bed,
    /// SAM alignments
    Sam,
    /// VCF variant calls
    Vcf,
    /// PSL table (0-based)
    Psltbl,
    /// 4DN pairs (two axes)
    Pairs,
    /// Juicer merged_nodups, space-delimited (legacy two-axis layout)
    MergedNodups,
}

/// File name suffixes checked by [`Preset::from_path`]
const SUFFIXES: &[(&str, Preset)] = &[
    ("merged_nodups.txt.gz", Preset::MergedNodups),
    (".mnd.txt.gz", Preset::MergedNodups),
    (".psltbl.gz", Preset::Psltbl),
    (".pairs.gz", Preset::Pairs),
    (".gff3.gz", Preset::Gff),
    (".gff.gz", Preset::Gff),
    (".gtf.gz", Preset::Gff),
    (".bed.gz", Preset::Bed),
    (".sam.gz", Preset::Sam),
    (".vcf.gz", Preset::Vcf),
];

impl Preset {
    /// Every preset
    pub const ALL: [Preset; 7] = [
        Preset::Gff,
        Preset::Bed,
        Preset::Sam,
        Preset::Vcf,
        Preset::Psltbl,
        Preset::Pairs,
        Preset::MergedNodups,
    ];

    /// Preset name as accepted by [`FromStr`]
    pub fn name(self) -> &'static str {
        match self {
            Preset::Gff => "gff",
            Preset::Bed => "bed",
            Preset::Sam => "sam",
            Preset::Vcf => "vcf",
            Preset::Psltbl => "psltbl",
            Preset::Pairs => "pairs",
            Preset::MergedNodups => "merged_nodups",
        }
    }

    /// The fixed configuration of this preset
    pub fn config(self) -> FormatConfig {
        let one_dim = |kind, coordinates, axis1, meta_char| FormatConfig {
            kind,
            coordinates,
            axis1,
            axis2: None,
            delimiter: b'\t',
            meta_char,
            skip_lines: 0,
        };

        match self {
            Preset::Gff => one_dim(
                RecordKind::Generic,
                CoordinateSystem::OneBased,
                AxisColumns::new(0, 3, Some(4)),
                b'#',
            ),
            Preset::Bed => one_dim(
                RecordKind::Generic,
                CoordinateSystem::ZeroBased,
                AxisColumns::new(0, 1, Some(2)),
                b'#',
            ),
            Preset::Sam => one_dim(
                RecordKind::Sam,
                CoordinateSystem::OneBased,
                AxisColumns::new(2, 3, None),
                b'@',
            ),
            Preset::Vcf => one_dim(
                RecordKind::Vcf,
                CoordinateSystem::OneBased,
                AxisColumns::new(0, 1, None),
                b'#',
            ),
            Preset::Psltbl => one_dim(
                RecordKind::Generic,
                CoordinateSystem::ZeroBased,
                AxisColumns::new(14, 16, Some(17)),
                b'#',
            ),
            Preset::Pairs => FormatConfig {
                kind: RecordKind::Generic,
                coordinates: CoordinateSystem::OneBased,
                axis1: AxisColumns::new(1, 2, None),
                axis2: Some(AxisColumns::new(3, 4, None)),
                delimiter: b'\t',
                meta_char: b'#',
                skip_lines: 0,
            },
            Preset::MergedNodups => FormatConfig {
                kind: RecordKind::Generic,
                coordinates: CoordinateSystem::OneBased,
                axis1: AxisColumns::new(1, 2, None),
                axis2: Some(AxisColumns::new(5, 6, None)),
                delimiter: b' ',
                meta_char: b'#',
                skip_lines: 0,
            },
        }
    }

    /// Infer a preset from the data file name
    pub fn from_path(path: &Path) -> Option<Preset> {
        let file_name = path.file_name()?.to_str()?;
        SUFFIXES
            .iter()
            .find(|(suffix, _)| file_name.ends_with(suffix))
            .map(|&(_, preset)| preset)
    }
}

impl FromStr for Preset {
    type Err = PairdexError;

    fn from_str(s: &str) -> Result<Self> {
        Preset::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| PairdexError::UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller-supplied column layout (1-based column numbers)
///
/// # Example
///
/// ```
/// use pairdex::formats::{Axis, ExplicitColumns, FormatConfig, Role};
/// use std::path::Path;
///
/// // chr1 start1 end1 chr2 start2 end2
/// let columns = ExplicitColumns::new(1, 2, Some(3)).with_second_axis(4, 5, Some(6));
/// let config = FormatConfig::resolve(None, Some(&columns), Path::new("x.txt.gz"))?;
/// assert_eq!(config.column(Axis::Second, Role::End), Some(6));
/// # Ok::<(), pairdex::PairdexError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitColumns {
    /// Axis 1 sequence name column
    pub name1: usize,
    /// Axis 1 start column
    pub start1: usize,
    /// Axis 1 end column
    pub end1: Option<usize>,
    /// Axis 2 sequence name column
    pub name2: Option<usize>,
    /// Axis 2 start column
    pub start2: Option<usize>,
    /// Axis 2 end column
    pub end2: Option<usize>,
    /// Field delimiter
    pub delimiter: u8,
    /// Comment marker
    pub meta_char: u8,
    /// Leading lines to skip
    pub skip_lines: u32,
    /// Start coordinate convention
    pub coordinates: CoordinateSystem,
}

impl ExplicitColumns {
    /// One-dimensional layout, tab-delimited, `#` comments, 1-based starts
    pub fn new(name1: usize, start1: usize, end1: Option<usize>) -> Self {
        ExplicitColumns {
            name1,
            start1,
            end1,
            name2: None,
            start2: None,
            end2: None,
            delimiter: b'\t',
            meta_char: b'#',
            skip_lines: 0,
            coordinates: CoordinateSystem::OneBased,
        }
    }

    /// Add a second axis
    pub fn with_second_axis(mut self, name2: usize, start2: usize, end2: Option<usize>) -> Self {
        self.name2 = Some(name2);
        self.start2 = Some(start2);
        self.end2 = end2;
        self
    }

    /// Set the field delimiter
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the comment marker
    pub fn meta_char(mut self, meta_char: u8) -> Self {
        self.meta_char = meta_char;
        self
    }

    /// Set the number of leading lines to skip
    pub fn skip_lines(mut self, skip_lines: u32) -> Self {
        self.skip_lines = skip_lines;
        self
    }

    /// Treat starts as 0-based half-open
    pub fn zero_based(mut self) -> Self {
        self.coordinates = CoordinateSystem::ZeroBased;
        self
    }

    fn to_config(&self) -> Result<FormatConfig> {
        let column = |label: &str, value: usize| -> Result<usize> {
            if value == 0 {
                Err(PairdexError::InvalidColumns(format!(
                    "{} column must be >= 1",
                    label
                )))
            } else {
                Ok(value - 1)
            }
        };
        let optional = |label: &str, value: Option<usize>| -> Result<Option<usize>> {
            value.map(|v| column(label, v)).transpose()
        };

        let axis1 = AxisColumns::new(
            column("name1", self.name1)?,
            column("start1", self.start1)?,
            optional("end1", self.end1)?,
        );

        let axis2 = match (self.name2, self.start2) {
            (Some(name2), Some(start2)) => Some(AxisColumns::new(
                column("name2", name2)?,
                column("start2", start2)?,
                optional("end2", self.end2)?,
            )),
            (None, None) if self.end2.is_none() => None,
            _ => {
                return Err(PairdexError::InvalidColumns(
                    "axis 2 needs both a name and a start column".to_string(),
                ))
            }
        };

        let config = FormatConfig {
            kind: RecordKind::Generic,
            coordinates: self.coordinates,
            axis1,
            axis2,
            delimiter: self.delimiter,
            meta_char: self.meta_char,
            skip_lines: self.skip_lines,
        };
        config.validate().map_err(PairdexError::InvalidColumns)?;
        Ok(config)
    }
}
