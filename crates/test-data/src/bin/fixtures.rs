//! Writes a folder of synthetic device recordings
//!
//! Run with:
//! ```
//! cargo run -p test-data --bin fixtures -- fixtures/run
//! ```
//!
//! `FIXTURE_SEED`, `FIXTURE_DISTANCE_M` and `FIXTURE_SPORT` (`running` or
//! `cycling`) tweak the scenario.

use std::path::PathBuf;

use test_data::prelude::*;
use tracing_subscriber::EnvFilter;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("fixtures/run"));

    let activity = match std::env::var("FIXTURE_SPORT").as_deref() {
        Ok("cycling") => ActivityKind::Cycling,
        _ => ActivityKind::Running,
    };

    let scenario = ScenarioBuilder::standard_devices()
        .with_seed(env_or("FIXTURE_SEED", 12345))
        .with_distance(env_or("FIXTURE_DISTANCE_M", 5000.0))
        .with_activity(activity)
        .build();

    let paths = scenario.write_to(&out_dir)?;

    tracing::info!("Fixtures written to {}", out_dir.display());
    tracing::info!("  Sport: {}", scenario.sport);
    tracing::info!("  Truth distance: {:.0} m", scenario.truth_distance());
    for path in &paths {
        tracing::info!("  {}", path.display());
    }

    Ok(())
}
