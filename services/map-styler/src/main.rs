//! Land-use map styler.
//!
//! Runs a styling job: reads a categorical or continuous land-use raster,
//! colors and reprojects it, writes the GeoTIFF and PNG, and prints the
//! display placement (plus legend for categorical maps) as JSON.

mod job;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use job::StyleJob;

#[derive(Parser, Debug)]
#[command(name = "map-styler")]
#[command(about = "Style land-use rasters for web map overlays")]
struct Args {
    /// Job description (YAML)
    #[arg(short, long, env = "MAP_JOB")]
    job: String,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout carries only the report
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!(job = %args.job, "Starting map styler");

    let job = StyleJob::from_file(&args.job)?;
    let report = job.run().with_context(|| format!("Job {} failed", args.job))?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    Ok(())
}
