//! Reader for `.dat` measurement exports.
//!
//! Each line holds one `x;y;z` triple. Files are written by the instrument software in
//! the local Windows codepage, so the text is decoded explicitly before parsing.

use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use tracing::{debug, warn};

pub mod line;

pub use line::{decode, parse_line, records};

use crate::error::ReadError;
use crate::shared::paths::extension;

/// Codepage used when nothing else is configured.
pub const DEFAULT_ENCODING: &Encoding = encoding_rs::GBK;

/// Extension every measurement file must carry.
pub const DAT_EXTENSION: &str = "dat";

/// A single measured coordinate triple.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Narrow to single precision, as most point-cloud consumers store positions.
    pub fn to_f32(self) -> [f32; 3] {
        [self.x as f32, self.y as f32, self.z as f32]
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Points in file line order.
pub type PointSet = Vec<Point>;

/// What to do with a record that fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop at the first bad record and report it.
    #[default]
    Abort,
    /// Log the bad record and keep going.
    Skip,
}

/// Resolve a WHATWG encoding label such as `gbk`, `windows-1252` or `utf-8`.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding, ReadError> {
    match Encoding::for_label(label.trim().as_bytes()) {
        Some(encoding) if encoding.is_ascii_compatible() => Ok(encoding),
        _ => Err(ReadError::UnsupportedEncoding {
            label: label.to_string(),
        }),
    }
}

/// Reads one `.dat` file and owns the resulting points.
#[derive(Debug)]
pub struct DatReader {
    path: PathBuf,
    encoding: &'static Encoding,
    points: PointSet,
    skipped: usize,
}

impl DatReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encoding: DEFAULT_ENCODING,
            points: Vec::new(),
            skipped: 0,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Points from the last successful [`read`](Self::read), empty before that.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Records dropped by [`ErrorPolicy::Skip`] during the last read.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn into_points(self) -> PointSet {
        self.points
    }

    /// Parse the file, replacing any previously read points.
    ///
    /// On error the reader holds no points.
    pub fn read(&mut self, policy: ErrorPolicy) -> Result<&[Point], ReadError> {
        self.points.clear();
        self.skipped = 0;

        if extension(&self.path) != DAT_EXTENSION {
            return Err(ReadError::UnsupportedExtension {
                path: self.path.clone(),
            });
        }

        let bytes = fs::read(&self.path).map_err(|source| ReadError::Open {
            path: self.path.clone(),
            source,
        })?;
        let (text, used) = decode(&bytes, self.encoding);
        if used != self.encoding {
            debug!(
                "{}: byte-order mark selects {} over {}",
                self.path.display(),
                used.name(),
                self.encoding.name()
            );
        }

        let mut points = PointSet::new();
        for record in records(&text, used) {
            match record {
                Ok(point) => points.push(point),
                Err(err) => match policy {
                    ErrorPolicy::Abort => {
                        return Err(ReadError::Line {
                            path: self.path.clone(),
                            source: err,
                        })
                    }
                    ErrorPolicy::Skip => {
                        warn!("{}: skipping {}", self.path.display(), err);
                        self.skipped += 1;
                    }
                },
            }
        }

        debug!(
            "{}: read {} points ({} skipped)",
            self.path.display(),
            points.len(),
            self.skipped
        );
        self.points = points;
        Ok(&self.points)
    }
}

/// Read a `.dat` file in one call.
pub fn read_dat_file(
    path: impl Into<PathBuf>,
    encoding: &'static Encoding,
    policy: ErrorPolicy,
) -> Result<PointSet, ReadError> {
    let mut reader = DatReader::new(path).with_encoding(encoding);
    reader.read(policy)?;
    Ok(reader.into_points())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_common_labels() {
        assert_eq!(encoding_for_label("gbk").unwrap(), encoding_rs::GBK);
        assert_eq!(encoding_for_label(" UTF-8 ").unwrap(), encoding_rs::UTF_8);
        assert_eq!(
            encoding_for_label("cp1252").unwrap(),
            encoding_rs::WINDOWS_1252
        );
    }

    #[test]
    fn rejects_unknown_labels() {
        assert!(matches!(
            encoding_for_label("klingon"),
            Err(ReadError::UnsupportedEncoding { .. })
        ));
        assert!(matches!(
            encoding_for_label("iso-2022-kr"),
            Err(ReadError::UnsupportedEncoding { .. })
        ));
    }

    #[test]
    fn rejects_encodings_that_move_ascii_bytes() {
        for label in ["utf-16le", "utf-16be", "iso-2022-jp"] {
            assert!(
                matches!(
                    encoding_for_label(label),
                    Err(ReadError::UnsupportedEncoding { .. })
                ),
                "{label} should be rejected"
            );
        }
        assert_eq!(encoding_for_label("gb18030").unwrap(), encoding_rs::GB18030);
    }

    #[test]
    fn wrong_extension_fails_before_touching_the_filesystem() {
        let mut reader = DatReader::new("/definitely/not/here/measurement.txt");
        let err = reader.read(ErrorPolicy::Abort).unwrap_err();
        assert!(matches!(err, ReadError::UnsupportedExtension { .. }));
        assert!(reader.points().is_empty());
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let mut reader = DatReader::new("/definitely/not/here/measurement.dat");
        let err = reader.read(ErrorPolicy::Abort).unwrap_err();
        assert!(matches!(err, ReadError::Open { .. }));
        assert!(reader.points().is_empty());
    }

    #[test]
    fn narrows_to_single_precision() {
        let p = Point::new(0.1, 1e40, -2.5);
        let [x, y, z] = p.to_f32();
        assert_eq!(x, 0.1_f32);
        assert!(y.is_infinite());
        assert_eq!(z, -2.5_f32);
    }
}
