//! Settings for one comparison run.

use std::path::PathBuf;

use time::UtcOffset;

use crate::units::UnitOfMeasure;

pub const DEFAULT_GROUND_TRUTH: &str = "Polar";
pub const DEFAULT_REFERENCE: &str = "Apple";

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Device label whose heart rate is treated as truth.
    pub ground_truth: String,
    /// Device label whose distance is treated as truth.
    pub reference: String,
    pub units: UnitOfMeasure,
    /// Offset all timestamps are shown in.
    pub local_offset: UtcOffset,
    pub output_dir: PathBuf,
    /// Also write the summary tables as JSON next to the report.
    pub write_json: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ground_truth: DEFAULT_GROUND_TRUTH.to_string(),
            reference: DEFAULT_REFERENCE.to_string(),
            units: UnitOfMeasure::Metric,
            local_offset: UtcOffset::UTC,
            output_dir: PathBuf::from("."),
            write_json: false,
        }
    }
}

impl RunConfig {
    pub fn with_units(mut self, units: UnitOfMeasure) -> Self {
        self.units = units;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

/// Parses a unit name, falling back to metric for anything unrecognised.
pub fn parse_units_lenient(value: &str) -> UnitOfMeasure {
    value.parse().unwrap_or_else(|e| {
        tracing::warn!("{e}, using {}", UnitOfMeasure::Metric);
        UnitOfMeasure::Metric
    })
}
