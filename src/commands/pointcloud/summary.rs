use anyhow::Result;
use colored::Colorize;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use crate::commands::pointcloud::pointcloud_utils::{
    compute_summary, read_points, resolve_encoding, resolve_policy, DatSummary,
};
use crate::config::Config;
use crate::shared::histogram::Histogram;
use crate::shared::math::Bounds;
use crate::shared::paths::gather_dat_paths;
use crate::shared::progressbar::file_progress_style;
use crate::DatSummaryArgs;

/// Aggregated statistics over multiple measurement files.
struct Stats {
    total_points: usize,
    skipped: usize,
    bounds: Option<Bounds>,
    sum: [f64; 3],
    file_point_counts: Vec<usize>,
    sa_sum: f64,
    sq_sum: f64,
    hull_volume_sum: f64,
    hull_count: usize,
    file_count: usize,
}

impl Stats {
    fn new() -> Self {
        Self {
            total_points: 0,
            skipped: 0,
            bounds: None,
            sum: [0.0; 3],
            file_point_counts: Vec::new(),
            sa_sum: 0.0,
            sq_sum: 0.0,
            hull_volume_sum: 0.0,
            hull_count: 0,
            file_count: 0,
        }
    }

    fn merge_bounds(&mut self, other: Option<Bounds>) {
        self.bounds = match (self.bounds, other) {
            (Some(mut a), Some(b)) => {
                a.merge(&b);
                Some(a)
            }
            (a, b) => a.or(b),
        };
    }

    fn update(&mut self, summary: &DatSummary) {
        self.total_points += summary.total_points;
        self.skipped += summary.skipped;
        self.merge_bounds(Some(summary.bounds));
        for axis in 0..3 {
            self.sum[axis] += summary.sum[axis];
        }
        self.file_point_counts.push(summary.total_points);
        self.sa_sum += summary.heights.sa;
        self.sq_sum += summary.heights.sq;
        if let Some((volume, _)) = summary.convex_hull {
            self.hull_volume_sum += volume;
            self.hull_count += 1;
        }
        self.file_count += 1;
    }

    fn merge(&mut self, other: Stats) {
        self.total_points += other.total_points;
        self.skipped += other.skipped;
        self.merge_bounds(other.bounds);
        for axis in 0..3 {
            self.sum[axis] += other.sum[axis];
        }
        self.file_point_counts.extend(other.file_point_counts);
        self.sa_sum += other.sa_sum;
        self.sq_sum += other.sq_sum;
        self.hull_volume_sum += other.hull_volume_sum;
        self.hull_count += other.hull_count;
        self.file_count += other.file_count;
    }

    fn overall_mean_position(&self) -> [f64; 3] {
        if self.total_points == 0 {
            [0.0; 3]
        } else {
            let n = self.total_points as f64;
            [self.sum[0] / n, self.sum[1] / n, self.sum[2] / n]
        }
    }
}

pub fn execute(args: DatSummaryArgs, config: &Config) -> Result<()> {
    let encoding = resolve_encoding(args.encoding.as_deref(), config)?;
    let policy = resolve_policy(args.skip_invalid, config);

    let paths = gather_dat_paths(&args.input, args.recursive)?;
    if paths.is_empty() {
        eprintln!("No .dat files found at '{}'", args.input.display());
        return Ok(());
    }
    let count_files_total = paths.len();

    if count_files_total == 1 {
        let path = &paths[0];
        let (points, skipped) = read_points(path, encoding, policy)?;
        let summary = compute_summary(path.display().to_string(), &points, skipped)?;
        print_file_summary(&summary);
        if let Some(hist) = Histogram::from_values(points.iter().map(|p| p.z), args.buckets) {
            println!("=== Height distribution (z) ===");
            println!("{}", hist);
        }
        return Ok(());
    }

    let summaries: Vec<DatSummary> = paths
        .par_iter()
        .progress()
        .with_style(file_progress_style("Computing per-file stats"))
        .filter_map(|path| {
            let name = path.display().to_string();
            match read_points(path, encoding, policy) {
                Ok((points, skipped)) => match compute_summary(name, &points, skipped) {
                    Ok(summary) => Some(summary),
                    Err(err) => {
                        eprintln!(
                            "Skipping file {} due to error in summarization: {:#}",
                            path.display(),
                            err
                        );
                        None
                    }
                },
                Err(err) => {
                    eprintln!(
                        "Skipping file {} due to error in reading: {:#}",
                        path.display(),
                        err
                    );
                    None
                }
            }
        })
        .collect();

    let count_read_successfully = summaries.len();
    let final_stats = summaries
        .par_iter()
        .fold(Stats::new, |mut acc, summary| {
            acc.update(summary);
            acc
        })
        .reduce(Stats::new, |mut a, b| {
            a.merge(b);
            a
        });

    println!(
        "{}",
        format!("Summary for files in {}", args.input.display()).bold()
    );
    println!("Total number of files: {}", count_files_total);
    println!(
        "Failed to read or summarize: {} files",
        count_files_total - count_read_successfully
    );
    println!("Total number of points: {}", final_stats.total_points);
    if final_stats.skipped > 0 {
        println!("Skipped malformed records: {}", final_stats.skipped);
    }
    if final_stats.file_count == 0 {
        return Ok(());
    }

    if let Some(bounds) = final_stats.bounds {
        print_bounds(&bounds);
    }
    let [x, y, z] = final_stats.overall_mean_position();
    println!("Mean position: [x: {:.4}, y: {:.4}, z: {:.4}]", x, y, z);

    let files = final_stats.file_count as f64;
    println!("Mean Sa: {:.4}", final_stats.sa_sum / files);
    println!("Mean Sq: {:.4}", final_stats.sq_sum / files);
    if final_stats.hull_count > 0 {
        println!(
            "Mean convex-hull volume: {:.4}",
            final_stats.hull_volume_sum / final_stats.hull_count as f64
        );
    }

    if let Some(hist) = Histogram::from_values(
        final_stats.file_point_counts.iter().map(|&n| n as f64),
        args.buckets,
    ) {
        println!("=== Points per file ===");
        println!("{}", hist);
    }

    Ok(())
}

fn print_bounds(bounds: &Bounds) {
    println!("Axis-aligned bounding box:");
    for (axis, name) in ["x", "y", "z"].iter().enumerate() {
        println!(
            " - {}: [{:.4}, {:.4}]",
            name, bounds.min[axis], bounds.max[axis]
        );
    }
}

fn print_file_summary(summary: &DatSummary) {
    println!("{}", format!("Summary for file {}", summary.file_name).bold());
    println!("Total number of points: {}", summary.total_points);
    if summary.skipped > 0 {
        println!("Skipped malformed records: {}", summary.skipped);
    }
    print_bounds(&summary.bounds);
    let [x, y, z] = summary.mean;
    println!("Mean position: [x: {:.4}, y: {:.4}, z: {:.4}]", x, y, z);

    println!("Surface heights:");
    println!(" - Sa (mean abs. deviation): {:.4}", summary.heights.sa);
    println!(" - Sq (RMS deviation): {:.4}", summary.heights.sq);
    println!(" - Sz (peak to valley): {:.4}", summary.heights.sz);

    match summary.pca_eigenvalues {
        Some([l1, l2, l3]) => {
            println!(
                "PCA eigenvalues (λ₁, λ₂, λ₃): [{:.4e}, {:.4e}, {:.4e}]",
                l1, l2, l3
            );
            if l1 > 0.0 {
                // a flat surface scan has λ₃ far below λ₁
                println!(" - Flatness (λ₃ / λ₁): {:.4e}", l3 / l1);
            }
        }
        None => println!("PCA eigenvalues: not available (coordinates out of range)"),
    }

    match summary.convex_hull {
        Some((volume, area)) => {
            println!("Convex-hull volume: {:.4}", volume);
            println!("Convex-hull area: {:.4}", area);
            let bbox_volume = summary.bounds.volume();
            if bbox_volume > 0.0 {
                println!(
                    "Bbox utilization by convex-hull: {:.2}%",
                    100.0 * (volume / bbox_volume).clamp(0.0, 1.0)
                );
            }
        }
        None => println!("Convex hull: not available (flat or too few points)"),
    }
}
