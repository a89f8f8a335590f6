//! customer-features entrypoint: one batch run over the raw customer and transaction tables.
//! The run summary is printed to stdout as one JSON line.

use clap::Parser;
use customer_features::{
    config::PipelineConfig,
    logging::StructuredLogger,
    pipeline::{self, RunOptions},
};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "customer-features", about = "12-month rolling customer features")]
struct Args {
    /// JSON config file; defaults apply when missing
    #[arg(long, env = "FEATURES_CONFIG_PATH", default_value = "config.json")]
    config: PathBuf,
    /// Base data directory (`<dir>/raw` in, `<dir>/transformed` out)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Override the export directory
    #[arg(long)]
    output_dir: Option<PathBuf>,
    #[arg(long)]
    skip_summary: bool,
    #[arg(long)]
    skip_validation: bool,
    /// Do not write the SQLite feature table
    #[arg(long)]
    skip_store: bool,
    /// Aggregate customers on the calling thread
    #[arg(long)]
    sequential: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let mut config = PipelineConfig::load(&args.config);
    if let Some(dir) = &args.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if args.sequential {
        config.aggregation.parallel = false;
    }

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(raw_dir = ?config.raw_dir, output_dir = ?config.output_dir, "customer-features starting");

    let options = RunOptions {
        write_summary: !args.skip_summary,
        validate_export: !args.skip_validation,
        persist: !args.skip_store,
    };
    let summary = pipeline::run(&config, &options)?;

    info!(
        customers = summary.customers,
        active = summary.active_customers,
        inactive = summary.inactive_customers,
        "run complete"
    );
    StructuredLogger::emit_json(&summary, &mut std::io::stdout().lock())?;
    Ok(())
}
