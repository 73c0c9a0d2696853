use std::path::PathBuf;

use clap::Parser;
use sensor_compare::config::{DEFAULT_GROUND_TRUTH, DEFAULT_REFERENCE, parse_units_lenient};
use sensor_compare::{RunConfig, compare_folder, write_report};
use time::UtcOffset;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sensor-compare")]
#[command(about = "Compare heart rate, distance and speed recorded by several devices during one activity")]
struct Cli {
    /// Folder holding one GPX, TCX or FIT file per device
    folder: PathBuf,

    /// Label of the heart-rate ground-truth device
    #[arg(long, env = "SENSOR_COMPARE_GT", default_value = DEFAULT_GROUND_TRUTH)]
    ground_truth: String,

    /// Label of the distance reference device
    #[arg(long = "ref", env = "SENSOR_COMPARE_REF", default_value = DEFAULT_REFERENCE)]
    reference: String,

    /// metric or imperial
    #[arg(long, env = "SENSOR_COMPARE_UNITS", default_value = "metric")]
    units: String,

    /// Where the report is written (defaults to the input folder)
    #[arg(long, env = "SENSOR_COMPARE_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Also write the summary tables as JSON
    #[arg(long)]
    json: bool,

    /// Open the report in the default browser once written
    #[arg(long, env = "SENSOR_COMPARE_LAUNCH_BROWSER", overrides_with = "no_launch_browser")]
    launch_browser: bool,

    /// Only log the report location
    #[arg(long, overrides_with = "launch_browser")]
    no_launch_browser: bool,
}

impl Cli {
    fn launch_browser(&self) -> bool {
        self.launch_browser && !self.no_launch_browser
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> anyhow::Result<()> {
    // Must be read before any other thread exists.
    let offset = UtcOffset::current_local_offset();

    init_logging();
    let offset = offset.unwrap_or_else(|e| {
        tracing::warn!("Could not determine local offset ({e}), using UTC");
        UtcOffset::UTC
    });
    let cli = Cli::parse();
    let launch_browser = cli.launch_browser();

    let config = RunConfig {
        ground_truth: cli.ground_truth,
        reference: cli.reference,
        units: parse_units_lenient(&cli.units),
        local_offset: offset,
        output_dir: cli.output_dir.unwrap_or_else(|| cli.folder.clone()),
        write_json: cli.json,
    };

    let run = compare_folder(&cli.folder, &config)?;
    let path = write_report(&run, &config.output_dir, config.write_json)?;

    let path = std::fs::canonicalize(&path).unwrap_or(path);
    tracing::info!("Report written to file://{}", path.display());
    if launch_browser {
        if let Err(e) = open::that(&path) {
            tracing::warn!("Could not open {} in a browser: {e}", path.display());
        }
    }
    Ok(())
}
