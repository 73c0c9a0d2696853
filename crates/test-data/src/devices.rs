//! Device error models.
//!
//! A [`DeviceModel`] turns the ground truth into what one wearable would have
//! written to disk: its own sampling rate, clock, GPS noise and heart-rate
//! error, and only the channels the device actually records.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use sensor_compare::models::{Position, TrackPointData};
use time::Duration;

use crate::sources::{TruthPoint, offset_meters};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Gpx,
    Tcx,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gpx => "gpx",
            Self::Tcx => "tcx",
        }
    }
}

/// A sudden position jump, as when a watch briefly loses its fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsGlitch {
    /// Every n-th recorded sample is displaced.
    pub every: usize,
    pub meters: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceModel {
    /// Also the file stem, which becomes the device id.
    pub name: String,
    pub format: FileFormat,
    pub sample_interval_s: usize,
    /// Added to every timestamp the device writes.
    pub clock_offset: Duration,
    /// Standard deviation of position noise; `None` when the device has no GPS.
    pub gps_jitter_m: Option<f64>,
    /// Standard deviation of heart-rate noise; `None` when there is no HR sensor.
    pub heart_rate_noise_bpm: Option<f64>,
    pub heart_rate_bias_bpm: f64,
    pub glitch: Option<GpsGlitch>,
    /// Sport label written instead of the scenario's.
    pub sport_override: Option<String>,
}

impl DeviceModel {
    pub fn new(name: impl Into<String>, format: FileFormat) -> Self {
        Self {
            name: name.into(),
            format,
            sample_interval_s: 1,
            clock_offset: Duration::ZERO,
            gps_jitter_m: None,
            heart_rate_noise_bpm: None,
            heart_rate_bias_bpm: 0.0,
            glitch: None,
            sport_override: None,
        }
    }

    /// Chest strap: accurate heart rate, no GPS.
    pub fn polar_h10() -> Self {
        Self::new("Polar H10", FileFormat::Tcx).with_heart_rate(0.5, 0.0)
    }

    /// Wrist watch exporting GPX with heart rate in the track point extension.
    pub fn apple_watch() -> Self {
        Self::new("Apple Watch", FileFormat::Gpx)
            .with_gps(2.0)
            .with_heart_rate(3.0, -2.0)
    }

    pub fn garmin_forerunner() -> Self {
        Self::new("Garmin Forerunner", FileFormat::Tcx)
            .with_gps(1.5)
            .with_heart_rate(2.0, 3.0)
    }

    /// Bike computer logging every other second, no heart rate.
    pub fn wahoo_elemnt() -> Self {
        Self::new("Wahoo Elemnt", FileFormat::Tcx)
            .with_gps(2.5)
            .with_interval(2)
    }

    /// Phone app with a noisy fix and a clock half a second off.
    pub fn phone() -> Self {
        Self::new("Phone", FileFormat::Gpx)
            .with_gps(4.0)
            .with_clock_offset(Duration::milliseconds(500))
            .with_glitch(200, 80.0)
    }

    pub fn with_gps(mut self, jitter_m: f64) -> Self {
        self.gps_jitter_m = Some(jitter_m);
        self
    }

    pub fn with_heart_rate(mut self, noise_bpm: f64, bias_bpm: f64) -> Self {
        self.heart_rate_noise_bpm = Some(noise_bpm);
        self.heart_rate_bias_bpm = bias_bpm;
        self
    }

    pub fn with_interval(mut self, seconds: usize) -> Self {
        self.sample_interval_s = seconds.max(1);
        self
    }

    pub fn with_clock_offset(mut self, offset: Duration) -> Self {
        self.clock_offset = offset;
        self
    }

    pub fn with_glitch(mut self, every: usize, meters: f64) -> Self {
        self.glitch = Some(GpsGlitch {
            every: every.max(1),
            meters,
        });
        self
    }

    pub fn with_sport(mut self, sport: impl Into<String>) -> Self {
        self.sport_override = Some(sport.into());
        self
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.format.extension())
    }

    /// What this device records of the ground truth.
    pub fn record(&self, truth: &[TruthPoint], rng: &mut impl Rng) -> Vec<TrackPointData> {
        truth
            .iter()
            .step_by(self.sample_interval_s)
            .enumerate()
            .map(|(i, p)| {
                let position = self.gps_jitter_m.and_then(|sd| {
                    let (mut north, mut east) = (gaussian(rng, sd), gaussian(rng, sd));
                    let glitched = self.glitch.filter(|g| i > 0 && i % g.every == 0);
                    if let Some(glitch) = glitched {
                        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
                        north += glitch.meters * angle.cos();
                        east += glitch.meters * angle.sin();
                    }
                    let (lat, lon) = offset_meters((p.lat, p.lon), north, east);
                    Position::new(lat, lon)
                });

                let heart_rate = self.heart_rate_noise_bpm.map(|sd| {
                    let bpm = p.heart_rate + self.heart_rate_bias_bpm + gaussian(rng, sd);
                    bpm.round().max(30.0) as u32
                });

                TrackPointData {
                    timestamp: Some(p.timestamp + self.clock_offset),
                    elevation: position.map(|_| p.elevation + gaussian(rng, 3.0)),
                    position,
                    heart_rate,
                }
            })
            .collect()
    }
}

fn gaussian(rng: &mut impl Rng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    Normal::new(0.0, std_dev).map_or(0.0, |n| n.sample(rng))
}
