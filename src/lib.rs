use std::path::PathBuf;

use clap::Args;

pub mod cloud;
pub mod commands;
pub mod config;
pub mod dat;
pub mod error;
pub mod shared;

pub use cloud::{export, CloudEncoding, CloudFormat, ExportOptions, Precision};
pub use config::Config;
pub use dat::{read_dat_file, DatReader, ErrorPolicy, Point, PointSet};
pub use error::{ExportError, LineError, LineErrorKind, ReadError};

#[derive(Debug, Args)]
pub struct DatConvertArgs {
    /// Input .dat file, or a directory of .dat files
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file, or output directory when INPUT is a directory.
    ///
    /// Defaults to INPUT with the extension of the output format.
    pub output: Option<PathBuf>,

    /// Output format. Inferred from OUTPUT's extension when omitted.
    ///
    /// Supported pointcloud formats: [PLY, PCD, LAS, LAZ]
    #[clap(short, long, value_enum)]
    pub format: Option<CloudFormat>,

    /// Write ASCII payloads instead of binary ones (PLY and PCD only)
    #[clap(long)]
    pub ascii: bool,

    /// Store coordinates as f64 instead of f32 (PLY and PCD only)
    #[clap(long)]
    pub double: bool,

    /// Text encoding of the .dat files as a WHATWG label, e.g. gbk, windows-1252, utf-8
    #[clap(short, long)]
    pub encoding: Option<String>,

    /// Skip malformed records with a warning instead of failing the file
    #[clap(long)]
    pub skip_invalid: bool,

    /// If provided, recursively process directories
    #[clap(short, long)]
    pub recursive: bool,
}

#[derive(Debug, Args)]
pub struct DatSummaryArgs {
    /// Input .dat file or directory
    #[arg(required = true)]
    pub input: PathBuf,

    /// If provided, recursively process directories
    #[clap(short, long)]
    pub recursive: bool,

    /// Text encoding of the .dat files as a WHATWG label, e.g. gbk, windows-1252, utf-8
    #[clap(short, long)]
    pub encoding: Option<String>,

    /// Skip malformed records with a warning instead of failing the file
    #[clap(long)]
    pub skip_invalid: bool,

    /// Number of histogram buckets
    #[clap(long, default_value_t = 10)]
    pub buckets: usize,
}

// Error handling utility that can be used by both lib and binary
pub fn handle_error(e: anyhow::Error) {
    eprintln!("Error!");
    for (i, cause) in e.chain().enumerate() {
        eprintln!("  Cause {}: {}", i, cause);
    }
    std::process::exit(1);
}
