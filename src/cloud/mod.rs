//! Export of point sets into point-cloud files.
//!
//! Every writer receives the points in file order and emits one unlabeled XYZ point
//! per measurement. The destination extension has to match the requested format.

use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;
use tracing::{debug, error};

mod las;
mod pcd;
mod ply;

use crate::dat::Point;
use crate::error::ExportError;
use crate::shared::paths::extension;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudFormat {
    Ply,
    Pcd,
    Las,
    Laz,
}

impl CloudFormat {
    /// File extension (without dot) the format is written to.
    pub fn extension(self) -> &'static str {
        match self {
            CloudFormat::Ply => "ply",
            CloudFormat::Pcd => "pcd",
            CloudFormat::Las => "las",
            CloudFormat::Laz => "laz",
        }
    }

    /// Infer the format from a path's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        match extension(path).as_str() {
            "ply" => Some(CloudFormat::Ply),
            "pcd" => Some(CloudFormat::Pcd),
            "las" => Some(CloudFormat::Las),
            "laz" => Some(CloudFormat::Laz),
            _ => None,
        }
    }
}

impl fmt::Display for CloudFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension().to_uppercase())
    }
}

/// Payload encoding for formats that offer a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloudEncoding {
    #[default]
    Binary,
    Ascii,
}

/// Floating point width of the stored coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// `f32`, what PCL-style tools expect for XYZ clouds.
    #[default]
    Single,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: CloudFormat,
    pub encoding: CloudEncoding,
    pub precision: Precision,
}

impl ExportOptions {
    /// Binary, single precision output in `format`.
    pub fn new(format: CloudFormat) -> Self {
        Self {
            format,
            encoding: CloudEncoding::default(),
            precision: Precision::default(),
        }
    }

    pub fn ascii(mut self) -> Self {
        self.encoding = CloudEncoding::Ascii;
        self
    }

    pub fn with_encoding(mut self, encoding: CloudEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }
}

/// Write `points` to `destination`, returning the number of points written.
///
/// Nothing is created on disk when the destination does not carry the format's
/// extension or the format cannot honour the requested encoding.
pub fn export(
    points: &[Point],
    destination: impl AsRef<Path>,
    options: &ExportOptions,
) -> Result<usize, ExportError> {
    let path = destination.as_ref();
    validate_destination(path, options)?;

    match options.format {
        CloudFormat::Ply => ply::write_ply(points, path, options.encoding, options.precision)?,
        CloudFormat::Pcd => pcd::write_pcd(points, path, options.encoding, options.precision)?,
        format @ (CloudFormat::Las | CloudFormat::Laz) => las::write_las(points, path, format)?,
    }

    debug!(
        "wrote {} points to '{}' ({:?}, {:?})",
        points.len(),
        path.display(),
        options.encoding,
        options.precision
    );
    Ok(points.len())
}

/// Check that `path` and `options` describe something [`export`] can write, without
/// touching the filesystem.
pub fn validate_destination(path: &Path, options: &ExportOptions) -> Result<(), ExportError> {
    let format = options.format;
    if extension(path) != format.extension() {
        error!(
            "{} export skipped: '{}' must end with '.{}'",
            format,
            path.display(),
            format.extension()
        );
        return Err(ExportError::ExtensionMismatch {
            path: path.to_path_buf(),
            format,
        });
    }
    if matches!(format, CloudFormat::Las | CloudFormat::Laz)
        && options.encoding == CloudEncoding::Ascii
    {
        return Err(ExportError::Unsupported {
            format,
            what: "ASCII encoding",
        });
    }
    Ok(())
}

fn writer_error(path: &Path, format: CloudFormat, err: impl fmt::Display) -> ExportError {
    ExportError::Writer {
        path: path.to_path_buf(),
        format,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_path_ignores_case() {
        assert_eq!(CloudFormat::from_path("a.PLY"), Some(CloudFormat::Ply));
        assert_eq!(CloudFormat::from_path("dir/b.pcd"), Some(CloudFormat::Pcd));
        assert_eq!(CloudFormat::from_path("c.laz"), Some(CloudFormat::Laz));
        assert_eq!(CloudFormat::from_path("d.dat"), None);
    }

    #[test]
    fn mismatched_extension_is_rejected() {
        let path = std::env::temp_dir().join("wlicloud-never-written.txt");
        let err = export(
            &[Point::new(1.0, 2.0, 3.0)],
            &path,
            &ExportOptions::new(CloudFormat::Ply),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExportError::ExtensionMismatch {
                format: CloudFormat::Ply,
                ..
            }
        ));
        assert!(!path.exists());
    }

    #[test]
    fn ply_path_is_not_a_pcd_path() {
        let path = std::env::temp_dir().join("wlicloud-never-written.ply");
        let err = export(&[], &path, &ExportOptions::new(CloudFormat::Pcd)).unwrap_err();
        assert!(matches!(err, ExportError::ExtensionMismatch { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn las_has_no_ascii_variant() {
        let path = std::env::temp_dir().join("wlicloud-never-written.las");
        let err = export(&[], &path, &ExportOptions::new(CloudFormat::Las).ascii()).unwrap_err();
        assert!(matches!(err, ExportError::Unsupported { .. }));
        assert!(!path.exists());
    }
}
