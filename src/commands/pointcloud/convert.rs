use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use colored::Colorize;
use encoding_rs::Encoding;
use indicatif::ParallelProgressIterator;
use itertools::{Either, Itertools};
use rayon::prelude::*;

use crate::cloud::{CloudEncoding, CloudFormat, ExportOptions, Precision};
use crate::commands::pointcloud::pointcloud_utils::{
    convert_file, output_path_for, resolve_encoding, resolve_policy, Converted,
};
use crate::config::Config;
use crate::dat::ErrorPolicy;
use crate::shared::paths::gather_dat_paths;
use crate::shared::progressbar::file_progress_style;
use crate::DatConvertArgs;

pub fn execute(args: DatConvertArgs, config: &Config) -> Result<()> {
    let encoding = resolve_encoding(args.encoding.as_deref(), config)?;
    let policy = resolve_policy(args.skip_invalid, config);
    let cloud_encoding = if args.ascii || config.ascii {
        CloudEncoding::Ascii
    } else {
        CloudEncoding::Binary
    };
    let precision = if args.double || config.double_precision {
        Precision::Double
    } else {
        Precision::Single
    };

    if args.input.is_dir() {
        let format = args.format.or(config.format).unwrap_or(CloudFormat::Ply);
        let options = ExportOptions::new(format)
            .with_encoding(cloud_encoding)
            .with_precision(precision);
        return convert_directory(&args, encoding, policy, &options);
    }

    // An explicit format wins over the output extension so mismatches are reported.
    let format = args
        .format
        .or_else(|| args.output.as_deref().and_then(CloudFormat::from_path))
        .or(config.format)
        .unwrap_or(CloudFormat::Ply);
    let options = ExportOptions::new(format)
        .with_encoding(cloud_encoding)
        .with_precision(precision);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension(format.extension()));

    let converted = convert_file(&args.input, &output, encoding, policy, &options)?;
    report(&args.input, &output, converted);
    Ok(())
}

fn report(input: &Path, output: &Path, converted: Converted) {
    println!(
        "Converted '{}' to '{}' ({} points)",
        input.display(),
        output.display(),
        converted.points
    );
    if converted.skipped > 0 {
        println!(
            "{}",
            format!(" - skipped {} malformed records", converted.skipped).yellow()
        );
    }
}

fn convert_directory(
    args: &DatConvertArgs,
    encoding: &'static Encoding,
    policy: ErrorPolicy,
    options: &ExportOptions,
) -> Result<()> {
    let paths = gather_dat_paths(&args.input, args.recursive)?;
    if paths.is_empty() {
        eprintln!("No .dat files found at '{}'", args.input.display());
        return Ok(());
    }
    let count_files_total = paths.len();

    let results: Vec<(PathBuf, PathBuf, Result<Converted>)> = paths
        .par_iter()
        .progress()
        .with_style(file_progress_style("Converting"))
        .map(|path| {
            let output =
                output_path_for(path, &args.input, args.output.as_deref(), options.format);
            let result = convert_file(path, &output, encoding, policy, options);
            (path.clone(), output, result)
        })
        .collect();

    let (converted, failed): (Vec<_>, Vec<_>) =
        results
            .into_iter()
            .partition_map(|(input, output, result)| match result {
                Ok(converted) => Either::Left((input, output, converted)),
                Err(err) => Either::Right((input, err)),
            });

    for (input, output, converted) in &converted {
        report(input, output, *converted);
    }
    for (input, err) in &failed {
        eprintln!(
            "{} {}: {:#}",
            "Failed to convert".red(),
            input.display(),
            err
        );
    }

    let total_points: usize = converted.iter().map(|(_, _, c)| c.points).sum();
    println!(
        "Converted {} of {} files ({} points) to {}",
        converted.len(),
        count_files_total,
        total_points,
        options.format
    );
    if !failed.is_empty() {
        bail!(
            "{} of {} files failed to convert",
            failed.len(),
            count_files_total
        );
    }
    Ok(())
}
