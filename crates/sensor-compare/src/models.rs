use std::collections::BTreeMap;

use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};

/// A WGS84 coordinate in decimal degrees.
///
/// Latitude and longitude only ever exist together: a sample either has a
/// `Position` or it has none.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    /// Returns `None` when either coordinate is out of range or not a number.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon))
            .then_some(Self { lat, lon })
    }

    /// Builds a position from two independently parsed halves.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        match (lat, lon) {
            (Some(lat), Some(lon)) => Self::new(lat, lon),
            _ => None,
        }
    }
}

/// A point as it comes out of a file parser, before timestamp filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackPointData {
    pub timestamp: Option<OffsetDateTime>,
    pub position: Option<Position>,
    pub heart_rate: Option<u32>,
    pub elevation: Option<f64>,
}

impl TrackPointData {
    /// Points without a timestamp cannot be aligned and are dropped here.
    pub fn into_sample(self) -> Option<Sample> {
        let timestamp = self.timestamp?;
        Some(Sample {
            timestamp,
            position: self.position,
            heart_rate: self.heart_rate,
            altitude_meters: self.elevation,
            cumulative_distance_meters: None,
            speed_kmh: None,
        })
    }
}

/// One sensor reading of one device.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: OffsetDateTime,
    pub position: Option<Position>,
    /// Beats per minute
    pub heart_rate: Option<u32>,
    pub altitude_meters: Option<f64>,
    /// Filled in by the distance engine
    pub cumulative_distance_meters: Option<f64>,
    /// Filled in by the speed engine
    pub speed_kmh: Option<f64>,
}

impl Sample {
    pub fn new(timestamp: OffsetDateTime) -> Self {
        Self {
            timestamp,
            position: None,
            heart_rate: None,
            altitude_meters: None,
            cumulative_distance_meters: None,
            speed_kmh: None,
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_heart_rate(mut self, bpm: u32) -> Self {
        self.heart_rate = Some(bpm);
        self
    }
}

/// All samples recorded by one device, in recording order.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSeries {
    pub device_id: String,
    /// Sport label reported by the file, possibly empty.
    pub sport: String,
    pub activity_start: Option<OffsetDateTime>,
    pub samples: Vec<Sample>,
}

impl DeviceSeries {
    pub fn new(device_id: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            device_id: device_id.into(),
            sport: String::new(),
            activity_start: None,
            samples,
        }
    }

    pub fn with_sport(mut self, sport: impl Into<String>) -> Self {
        self.sport = sport.into();
        self
    }

    pub fn with_start(mut self, start: OffsetDateTime) -> Self {
        self.activity_start = Some(start);
        self
    }

    /// Builds a series from parser output, dropping points without a timestamp.
    pub fn from_points(device_id: impl Into<String>, points: Vec<TrackPointData>) -> Self {
        let device_id = device_id.into();
        let total = points.len();
        let samples: Vec<Sample> = points
            .into_iter()
            .filter_map(TrackPointData::into_sample)
            .collect();

        if samples.len() < total {
            tracing::warn!(
                "{device_id}: dropped {} of {total} points without a timestamp",
                total - samples.len()
            );
        }

        Self::new(device_id, samples)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True when every sample carries a position, the precondition for distance.
    pub fn has_full_position(&self) -> bool {
        self.samples.iter().all(|s| s.position.is_some())
    }

    pub fn heart_rates(&self) -> impl Iterator<Item = (OffsetDateTime, Option<f64>)> + '_ {
        self.samples
            .iter()
            .map(|s| (s.timestamp, s.heart_rate.map(f64::from)))
    }

    pub fn distances(&self) -> impl Iterator<Item = (OffsetDateTime, Option<f64>)> + '_ {
        self.samples
            .iter()
            .map(|s| (s.timestamp, s.cumulative_distance_meters))
    }

    pub fn speeds(&self) -> impl Iterator<Item = (OffsetDateTime, Option<f64>)> + '_ {
        self.samples.iter().map(|s| (s.timestamp, s.speed_kmh))
    }

    /// Largest cumulative distance recorded, in meters.
    pub fn total_distance_meters(&self) -> Option<f64> {
        max_of(self.samples.iter().filter_map(|s| s.cumulative_distance_meters))
    }

    fn to_offset(&mut self, offset: UtcOffset) {
        for sample in &mut self.samples {
            sample.timestamp = sample.timestamp.to_offset(offset);
        }
        self.activity_start = self.activity_start.map(|t| t.to_offset(offset));
    }
}

/// Every device series of one run, keyed by device id.
///
/// Devices iterate in ascending id order so every table built from the corpus
/// is deterministic.
#[derive(Debug, Clone, Default)]
pub struct CombinedCorpus {
    devices: BTreeMap<String, DeviceSeries>,
}

impl CombinedCorpus {
    /// Merges enriched series and shifts all timestamps to `offset`.
    ///
    /// Two series with the same device id are concatenated in input order.
    pub fn merge(series: Vec<DeviceSeries>, offset: UtcOffset) -> Self {
        let mut devices: BTreeMap<String, DeviceSeries> = BTreeMap::new();

        for mut s in series {
            s.to_offset(offset);
            match devices.get_mut(&s.device_id) {
                Some(existing) => {
                    tracing::warn!("{}: several files share this device id", s.device_id);
                    existing.samples.extend(s.samples);
                }
                None => {
                    devices.insert(s.device_id.clone(), s);
                }
            }
        }

        Self { devices }
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceSeries> {
        self.devices.values()
    }

    pub fn device(&self, device_id: &str) -> Option<&DeviceSeries> {
        self.devices.get(device_id)
    }

    /// Every sample tagged with its owning device.
    pub fn samples(&self) -> impl Iterator<Item = (&str, &Sample)> {
        self.devices
            .values()
            .flat_map(|d| d.samples.iter().map(move |s| (d.device_id.as_str(), s)))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Earliest and latest timestamp over all devices.
    pub fn time_span(&self) -> Option<(OffsetDateTime, OffsetDateTime)> {
        let mut times = self.samples().map(|(_, s)| s.timestamp);
        let first = times.next()?;
        Some(times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }
}

/// Role of a row in a comparison table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowRole {
    /// The ground-truth or reference row.
    Baseline,
    Compared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFamily {
    HeartRate,
    Distance,
}

/// One line of a heart-rate or distance summary table.
///
/// `None` means "not applicable"; a device with nothing to compare has no row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRow {
    pub device: String,
    pub role: RowRole,
    pub mae: Option<f64>,
    /// Average bpm or total distance in display units.
    pub aggregate: Option<f64>,
    /// Signed bpm bias or distance difference in percent.
    pub variance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsTable {
    pub family: MetricFamily,
    pub rows: Vec<MetricsRow>,
}

impl MetricsTable {
    pub fn baseline(&self) -> Option<&MetricsRow> {
        self.rows.iter().find(|r| r.role == RowRole::Baseline)
    }

    pub fn row(&self, device: &str) -> Option<&MetricsRow> {
        self.rows
            .iter()
            .find(|r| r.role == RowRole::Compared && r.device == device)
    }
}

/// A speed sample flagged by the z-score test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outlier {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub speed_kmh: f64,
    pub z_score: f64,
}

/// One line of the speed summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedRow {
    pub device: String,
    /// Total distance over elapsed time, in km/h or mph.
    pub average_speed: Option<f64>,
    pub outliers: Vec<Outlier>,
}

pub(crate) fn max_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| match acc {
        Some(m) if m >= v => Some(m),
        _ => Some(v),
    })
}
