//! Error types for reading `.dat` measurements and exporting point clouds.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::cloud::CloudFormat;

/// The coordinate a malformed field was meant to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

/// Why a single record could not be turned into a point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineErrorKind {
    #[error("bytes are not valid {encoding}")]
    Decode { encoding: &'static str },

    #[error("expected at least two ';' separators in {text:?}")]
    MissingDelimiter { text: String },

    #[error("field {field} is not a number: {text:?}")]
    InvalidNumber { field: Axis, text: String },
}

/// A record error together with the 1-based line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct LineError {
    pub line: usize,
    #[source]
    pub kind: LineErrorKind,
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("'{}' is not a .dat file", .path.display())]
    UnsupportedExtension { path: PathBuf },

    #[error("unknown or unsupported text encoding '{label}'")]
    UnsupportedEncoding { label: String },

    #[error("failed to open '{}'", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in '{}'", .path.display())]
    Line {
        path: PathBuf,
        #[source]
        source: LineError,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("'{}' does not end with '.{}' required for {format} output", .path.display(), .format.extension())]
    ExtensionMismatch { path: PathBuf, format: CloudFormat },

    #[error("{format} output does not support {what}")]
    Unsupported {
        format: CloudFormat,
        what: &'static str,
    },

    #[error("failed to write '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{format} writer failed for '{}': {message}", .path.display())]
    Writer {
        path: PathBuf,
        format: CloudFormat,
        message: String,
    },
}
