//! Fluent builder for multi-device recording scenarios.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use sensor_compare::distance::haversine_distance;
use sensor_compare::models::{DeviceSeries, Position, TrackPointData};
use time::OffsetDateTime;

use crate::config::{BoundingBox, ScenarioConfig};
use crate::devices::{DeviceModel, FileFormat};
use crate::gpx::generate_gpx;
use crate::profiles::{AthleteProfile, CyclistProfile, RunnerProfile};
use crate::sources::{ProceduralGenerator, TruthPoint};
use crate::tcx::generate_tcx;
use crate::terrain::ElevationGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Running,
    Cycling,
}

impl ActivityKind {
    fn profile(self) -> Box<dyn AthleteProfile> {
        match self {
            Self::Running => Box::new(RunnerProfile::default()),
            Self::Cycling => Box::new(CyclistProfile::default()),
        }
    }
}

/// One device's view of the scenario.
#[derive(Debug, Clone)]
pub struct Recording {
    pub device: DeviceModel,
    /// Sport label this device writes, empty for GPX.
    pub sport: String,
    pub points: Vec<TrackPointData>,
}

impl Recording {
    /// File contents in the device's export format.
    pub fn to_bytes(&self, start: OffsetDateTime) -> Vec<u8> {
        match self.device.format {
            FileFormat::Gpx => generate_gpx(&self.points, &self.device.name, Some(start)),
            FileFormat::Tcx => generate_tcx(&self.points, &self.sport, Some(start)),
        }
    }

    /// The series the file would parse into, without going through a file.
    ///
    /// GPX keeps only positioned points, as on disk.
    pub fn to_series(&self, start: OffsetDateTime) -> DeviceSeries {
        let points = match self.device.format {
            FileFormat::Gpx => self
                .points
                .iter()
                .filter(|p| p.position.is_some())
                .cloned()
                .collect(),
            FileFormat::Tcx => self.points.clone(),
        };
        DeviceSeries::from_points(self.device.name.clone(), points)
            .with_sport(self.sport.clone())
            .with_start(start)
    }
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub sport: String,
    pub start_time: OffsetDateTime,
    pub truth: Vec<TruthPoint>,
    pub recordings: Vec<Recording>,
}

impl Scenario {
    /// Writes one file per device into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut paths = Vec::with_capacity(self.recordings.len());
        for recording in &self.recordings {
            let path = dir.join(recording.device.file_name());
            std::fs::write(&path, recording.to_bytes(self.start_time))?;
            tracing::debug!("Wrote {} ({} points)", path.display(), recording.points.len());
            paths.push(path);
        }
        Ok(paths)
    }

    pub fn device_series(&self) -> Vec<DeviceSeries> {
        self.recordings
            .iter()
            .map(|r| r.to_series(self.start_time))
            .collect()
    }

    /// Ground-truth distance in meters.
    pub fn truth_distance(&self) -> f64 {
        self.truth
            .windows(2)
            .filter_map(|w| {
                let a = Position::new(w[0].lat, w[0].lon)?;
                let b = Position::new(w[1].lat, w[1].lon)?;
                Some(haversine_distance(a, b))
            })
            .sum()
    }

    pub fn recording(&self, name: &str) -> Option<&Recording> {
        self.recordings.iter().find(|r| r.device.name == name)
    }
}

/// Builder for a scenario: one athlete, one ground-truth track and any number
/// of devices recording it.
///
/// ```rust,ignore
/// let scenario = ScenarioBuilder::new()
///     .with_seed(7)
///     .with_distance(5000.0)
///     .with_device(DeviceModel::polar_h10())
///     .with_device(DeviceModel::garmin_forerunner())
///     .build();
/// scenario.write_to(Path::new("fixtures"))?;
/// ```
pub struct ScenarioBuilder {
    config: ScenarioConfig,
    kind: ActivityKind,
    flat_terrain: bool,
    devices: Vec<DeviceModel>,
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self {
            config: ScenarioConfig::default(),
            kind: ActivityKind::Running,
            flat_terrain: false,
            devices: Vec::new(),
        }
    }

    /// Chest strap, watch, GPS watch, bike computer and phone.
    pub fn standard_devices() -> Self {
        Self::new()
            .with_device(DeviceModel::polar_h10())
            .with_device(DeviceModel::apple_watch())
            .with_device(DeviceModel::garmin_forerunner())
            .with_device(DeviceModel::wahoo_elemnt())
            .with_device(DeviceModel::phone())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_region(mut self, region: BoundingBox) -> Self {
        self.config.region = region;
        self
    }

    pub fn with_flat_terrain(mut self) -> Self {
        self.flat_terrain = true;
        self
    }

    pub fn with_distance(mut self, meters: f64) -> Self {
        self.config.distance_meters = meters;
        self
    }

    pub fn with_start_time(mut self, start: OffsetDateTime) -> Self {
        self.config.start_time = start;
        self
    }

    pub fn with_activity(mut self, kind: ActivityKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_device(mut self, device: DeviceModel) -> Self {
        self.devices.push(device);
        self
    }

    /// Generates the truth and every device's recording of it.
    ///
    /// The same seed always produces the same scenario.
    pub fn build(&self) -> Scenario {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let terrain_seed = self.config.seed as u32;
        let elevation = if self.flat_terrain {
            ElevationGenerator::flat(terrain_seed)
        } else {
            ElevationGenerator::boulder(terrain_seed)
        };

        let profile = self.kind.profile();
        let truth = ProceduralGenerator::for_region(self.config.region, elevation)
            .with_distance(self.config.distance_meters)
            .with_start_time(self.config.start_time)
            .generate(profile.as_ref(), &mut rng);

        let recordings = self
            .devices
            .iter()
            .map(|device| {
                let sport = match device.format {
                    FileFormat::Gpx => String::new(),
                    FileFormat::Tcx => device
                        .sport_override
                        .clone()
                        .unwrap_or_else(|| profile.sport().to_string()),
                };
                Recording {
                    device: device.clone(),
                    sport,
                    points: device.record(&truth, &mut rng),
                }
            })
            .collect();

        tracing::info!(
            "Built {} scenario: {} truth points, {} devices",
            profile.sport(),
            truth.len(),
            self.devices.len()
        );

        Scenario {
            sport: profile.sport().to_string(),
            start_time: self.config.start_time,
            truth,
            recordings,
        }
    }
}
