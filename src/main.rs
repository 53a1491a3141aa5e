use clap::{Parser, Subcommand};
use wlicloud::shared::logging::init_logging;
use wlicloud::{Config, DatConvertArgs, DatSummaryArgs};

/// Convert white-light-interferometry .dat exports into point clouds
#[derive(Debug, Parser)]
#[clap(name = "wlicloud", version, about, infer_subcommands = true)]
pub struct RootArgs {
    #[clap(subcommand)]
    command: DatCommand,
}

#[derive(Debug, Subcommand)]
enum DatCommand {
    /// Convert .dat files to PLY, PCD, LAS or LAZ.
    Convert(DatConvertArgs),
    /// Summarize .dat files in a given path.
    Summary(DatSummaryArgs),
}

fn main() {
    let args = RootArgs::parse();

    let loaded = Config::load();
    init_logging(
        loaded
            .as_ref()
            .ok()
            .and_then(|config| config.log_level.as_deref()),
    );
    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Ignoring config: {:#}", e);
        Config::default()
    });

    let result = match args.command {
        DatCommand::Convert(args) => wlicloud::commands::pointcloud::convert::execute(args, &config),
        DatCommand::Summary(args) => wlicloud::commands::pointcloud::summary::execute(args, &config),
    };

    if let Err(e) = result {
        wlicloud::handle_error(e);
    }
}
