use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use encoding_rs::Encoding;

use crate::cloud::{export, validate_destination, CloudFormat, ExportOptions};
use crate::config::Config;
use crate::dat::{encoding_for_label, DatReader, ErrorPolicy, Point, DEFAULT_ENCODING};
use crate::shared::math::{
    height_stats, hull_volume_area, mean_xyz, pca_eigenvalues, sample_for_hull, sum_xyz, Bounds,
    HeightStats, MAX_HULL_POINTS,
};

/// Pick the codepage from the flag, then the config, then the default.
pub fn resolve_encoding(flag: Option<&str>, config: &Config) -> Result<&'static Encoding> {
    match flag.or(config.encoding.as_deref()) {
        Some(label) => Ok(encoding_for_label(label)?),
        None => Ok(DEFAULT_ENCODING),
    }
}

pub fn resolve_policy(skip_invalid: bool, config: &Config) -> ErrorPolicy {
    if skip_invalid || config.skip_invalid {
        ErrorPolicy::Skip
    } else {
        ErrorPolicy::Abort
    }
}

/// Where a converted file goes: next to the input, or mirrored below `output_dir`.
pub fn output_path_for(
    input: &Path,
    input_root: &Path,
    output_dir: Option<&Path>,
    format: CloudFormat,
) -> PathBuf {
    let target = match output_dir {
        Some(dir) => {
            let relative = input.strip_prefix(input_root).unwrap_or(input);
            let relative = if relative.as_os_str().is_empty() {
                input.file_name().map(Path::new).unwrap_or(input)
            } else {
                relative
            };
            dir.join(relative)
        }
        None => input.to_path_buf(),
    };
    target.with_extension(format.extension())
}

/// Read one `.dat` file.
pub fn read_points(
    path: &Path,
    encoding: &'static Encoding,
    policy: ErrorPolicy,
) -> Result<(Vec<Point>, usize)> {
    let mut reader = DatReader::new(path).with_encoding(encoding);
    reader
        .read(policy)
        .with_context(|| format!("Was unable to read {}", path.display()))?;
    let skipped = reader.skipped();
    Ok((reader.into_points(), skipped))
}

/// Outcome of converting one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Converted {
    pub points: usize,
    pub skipped: usize,
}

/// Read `input` and export it to `output`, creating missing parent directories.
pub fn convert_file(
    input: &Path,
    output: &Path,
    encoding: &'static Encoding,
    policy: ErrorPolicy,
    options: &ExportOptions,
) -> Result<Converted> {
    validate_destination(output, options)?;
    let (points, skipped) = read_points(input, encoding, policy)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Unable to create directory {}", parent.display()))?;
    }
    let written = export(&points, output, options)
        .with_context(|| format!("Failure while writing {}.", output.display()))?;

    Ok(Converted {
        points: written,
        skipped,
    })
}

/// Per-file statistics of a measurement.
#[derive(Debug, Clone)]
pub struct DatSummary {
    pub file_name: String,
    pub total_points: usize,
    pub skipped: usize,
    pub bounds: Bounds,
    pub mean: [f64; 3],
    // Sums for weighted averages when aggregating files
    pub sum: [f64; 3],
    pub heights: HeightStats,
    /// λ₁ ≥ λ₂ ≥ λ₃; `None` when the covariance overflows.
    pub pca_eigenvalues: Option<[f64; 3]>,
    /// (volume, area); `None` for flat or tiny measurements.
    pub convex_hull: Option<(f64, f64)>,
}

/// Compute summary statistics for the points of one file.
pub fn compute_summary(file_name: String, points: &[Point], skipped: usize) -> Result<DatSummary> {
    let (Some(bounds), Some(mean), Some(heights)) =
        (Bounds::of(points), mean_xyz(points), height_stats(points))
    else {
        bail!("{} has no points to summarize.", file_name);
    };

    Ok(DatSummary {
        file_name,
        total_points: points.len(),
        skipped,
        bounds,
        mean,
        sum: sum_xyz(points),
        heights,
        pca_eigenvalues: pca_eigenvalues(points),
        convex_hull: hull_volume_area(sample_for_hull(points, MAX_HULL_POINTS)),
    })
}
