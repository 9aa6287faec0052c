//! Error types for pairdex

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pairdex operations
pub type Result<T> = std::result::Result<T, PairdexError>;

/// Error types that can occur in pairdex
///
/// Every operation that cannot proceed returns one of these variants. An
/// empty query result is never used to signal failure.
#[derive(Debug, Error)]
pub enum PairdexError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data file or sidecar index missing or unreadable
    #[error("Cannot open {path}: {source}")]
    OpenFailure {
        /// Path that could not be opened
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Data file is not BGZF (block-compressed) and cannot be indexed
    #[error("Not a BGZF-compressed file: {0}")]
    NotBlockCompressed(PathBuf),

    /// Preset name not in the built-in table
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// No preset given and none could be inferred from the file name
    #[error("Cannot determine preset from file name: {0}")]
    PresetUndetermined(PathBuf),

    /// Explicit column specification rejected
    #[error("Invalid column specification: {0}")]
    InvalidColumns(String),

    /// Region string does not parse
    #[error("Malformed query '{0}'")]
    MalformedQuery(String),

    /// Sidecar index failed structural validation
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    /// Indexing aborted (parse or I/O error mid-scan)
    #[error("Index build failed{}: {msg}", line_suffix(.line))]
    BuildFailure {
        /// 1-based line number where the failure occurred, if known
        line: Option<usize>,
        /// Error message
        msg: String,
    },

    /// Compression/decompression error
    #[error("Compression error: {0}")]
    Compression(String),
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(l) => format!(" at line {}", l),
        None => String::new(),
    }
}

impl PairdexError {
    pub(crate) fn build_at(line: usize, msg: impl Into<String>) -> Self {
        PairdexError::BuildFailure {
            line: Some(line),
            msg: msg.into(),
        }
    }

    pub(crate) fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PairdexError::OpenFailure {
            path: path.into(),
            source,
        }
    }

    /// Classify an error raised while reading BGZF blocks
    pub(crate) fn from_block_read(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof => {
                PairdexError::Compression(err.to_string())
            }
            _ => PairdexError::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_failure_message_includes_line() {
        let err = PairdexError::build_at(42, "non-numeric start 'abc'");
        assert_eq!(
            err.to_string(),
            "Index build failed at line 42: non-numeric start 'abc'"
        );

        let err = PairdexError::BuildFailure {
            line: None,
            msg: "disk full".into(),
        };
        assert_eq!(err.to_string(), "Index build failed: disk full");
    }

    #[test]
    fn test_block_read_classification() {
        let bad = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad BSIZE");
        assert!(matches!(
            PairdexError::from_block_read(bad),
            PairdexError::Compression(_)
        ));
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(PairdexError::from_block_read(denied), PairdexError::Io(_)));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: PairdexError = io.into();
        assert!(matches!(err, PairdexError::Io(_)));
    }
}
