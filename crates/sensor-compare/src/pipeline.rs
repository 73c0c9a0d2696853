//! One comparison run, from a folder of recordings to the summary tables.
//!
//! Files are parsed one device per file, enriched with distance and speed in
//! parallel, then merged into a single corpus that every table reads from.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use rayon::prelude::*;
use serde::Serialize;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::comparison::{distance_metrics, heart_rate_metrics};
use crate::config::RunConfig;
use crate::distance::enrich_distance;
use crate::errors::{CompareError, Result};
use crate::file_parsers::{FileType, parse_activity_file};
use crate::models::{CombinedCorpus, DeviceSeries, MetricsTable, SpeedRow};
use crate::outliers::speed_metrics;
use crate::speed::enrich_speed;
use crate::units::UnitOfMeasure;

/// Sport label of a run whose files declare none.
pub const UNKNOWN_SPORT: &str = "Unknown";
pub const UNKNOWN_TIME: &str = "Unknown Time";

const SECONDS_PER_DAY: i64 = 86_400;

/// Activity files directly inside `dir`, sorted by path.
pub fn discover_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && FileType::from_path(&path) != FileType::Other {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(CompareError::NoInputFiles(dir.to_path_buf()));
    }
    Ok(files)
}

/// The device id of a file is its name without extension.
pub fn device_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parses one file into an unenriched device series.
pub fn load_device(path: &Path) -> Result<DeviceSeries> {
    let bytes = Bytes::from(std::fs::read(path)?);
    let parsed = parse_activity_file(FileType::from_path(path), bytes).map_err(|source| {
        CompareError::Parse {
            file: path.to_path_buf(),
            source,
        }
    })?;

    let start = parsed.start_time();
    let mut series =
        DeviceSeries::from_points(device_id_for(path), parsed.points).with_sport(parsed.sport);
    series.activity_start = start;

    tracing::info!(
        "Loaded {} ({} samples, sport {:?})",
        series.device_id,
        series.samples.len(),
        series.sport
    );
    Ok(series)
}

/// Adds cumulative distance and, when that succeeded, speed.
pub fn enrich(series: &mut DeviceSeries) {
    if enrich_distance(series) {
        enrich_speed(series);
    }
}

/// Enriches every series in parallel; returns once all are done.
pub fn enrich_all(series: &mut [DeviceSeries]) {
    series.par_iter_mut().for_each(enrich);
}

fn is_unknown(sport: &str) -> bool {
    sport.is_empty() || sport == UNKNOWN_SPORT
}

/// The one sport all files agree on.
///
/// Files without a sport never conflict. Two different declared sports abort
/// the run.
pub fn resolve_sport(series: &[DeviceSeries]) -> Result<String> {
    let mut chosen: Option<&str> = None;
    for s in series.iter().filter(|s| !is_unknown(&s.sport)) {
        match chosen {
            None => chosen = Some(&s.sport),
            Some(first) if first != s.sport => {
                return Err(CompareError::InconsistentSport {
                    first: first.to_string(),
                    second: s.sport.clone(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(chosen.unwrap_or(UNKNOWN_SPORT).to_string())
}

/// Earliest declared activity start among the files.
pub fn resolve_start_time(series: &[DeviceSeries]) -> Option<OffsetDateTime> {
    let starts: Vec<OffsetDateTime> = series.iter().filter_map(|s| s.activity_start).collect();
    let earliest = starts.iter().min().copied()?;
    if starts.iter().any(|t| *t != earliest) {
        tracing::warn!("Files disagree on start time, using the earliest ({earliest})");
    }
    Some(earliest)
}

/// Scalars shown in the report header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub sport: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    /// Latest minus earliest timestamp over all devices, within one day.
    pub duration: Duration,
    pub device_count: usize,
}

impl RunSummary {
    pub fn new(sport: String, start_time: Option<OffsetDateTime>, corpus: &CombinedCorpus) -> Self {
        let duration = corpus
            .time_span()
            .map(|(lo, hi)| Duration::seconds((hi - lo).whole_seconds() % SECONDS_PER_DAY))
            .unwrap_or(Duration::ZERO);

        Self {
            sport,
            start_time,
            duration,
            device_count: corpus.len(),
        }
    }

    /// e.g. `2024-05-01 07:30:00 AM`, or `Unknown Time`.
    pub fn start_time_label(&self, offset: UtcOffset) -> String {
        let format = format_description!(
            "[year]-[month]-[day] [hour repr:12]:[minute]:[second] [period]"
        );
        self.start_time
            .and_then(|t| t.to_offset(offset).format(&format).ok())
            .unwrap_or_else(|| UNKNOWN_TIME.to_string())
    }

    /// e.g. `42m 7s`.
    pub fn duration_label(&self) -> String {
        let secs = self.duration.whole_seconds();
        format!("{}m {}s", secs / 60, secs % 60)
    }

    /// `<sport>_<YYYY-MM-DD>` with spaces replaced, used to name the report.
    pub fn file_stem(&self, offset: UtcOffset) -> String {
        let date = self
            .start_time
            .and_then(|t| {
                t.to_offset(offset)
                    .date()
                    .format(format_description!("[year]-[month]-[day]"))
                    .ok()
            })
            .unwrap_or_else(|| "unknown-date".to_string());
        format!("{}_{date}", self.sport).replace(' ', "_")
    }
}

/// Everything a report needs.
#[derive(Debug, Clone)]
pub struct ComparisonRun {
    pub corpus: CombinedCorpus,
    pub summary: RunSummary,
    pub heart_rate: MetricsTable,
    pub distance: MetricsTable,
    pub speed: Vec<SpeedRow>,
    pub units: UnitOfMeasure,
    pub local_offset: UtcOffset,
}

/// Runs the comparison over already parsed series.
///
/// The sport check runs before any enrichment so an inconsistent run does no
/// work.
pub fn compare_series(mut series: Vec<DeviceSeries>, config: &RunConfig) -> Result<ComparisonRun> {
    let sport = resolve_sport(&series)?;
    let start_time = resolve_start_time(&series);

    enrich_all(&mut series);

    let corpus = CombinedCorpus::merge(series, config.local_offset);
    let summary = RunSummary::new(sport, start_time, &corpus);

    tracing::info!(
        "Comparing {} devices ({}, {})",
        corpus.len(),
        summary.sport,
        summary.duration_label()
    );

    let heart_rate = heart_rate_metrics(&corpus, &config.ground_truth);
    let distance = distance_metrics(&corpus, &config.reference, config.units);
    let speed = speed_metrics(&corpus, config.units);

    Ok(ComparisonRun {
        corpus,
        summary,
        heart_rate,
        distance,
        speed,
        units: config.units,
        local_offset: config.local_offset,
    })
}

/// Discovers, parses and compares every activity file in `dir`.
///
/// Any file that fails to parse aborts the run.
pub fn compare_folder(dir: &Path, config: &RunConfig) -> Result<ComparisonRun> {
    let files = discover_files(dir)?;
    tracing::info!("Found {} activity files in {}", files.len(), dir.display());

    let series = files
        .iter()
        .map(|path| load_device(path))
        .collect::<Result<Vec<_>>>()?;

    compare_series(series, config)
}
