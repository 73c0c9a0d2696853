//! Procedural ground-truth tracks.
//!
//! The generator walks a random path with momentum, one step per second, so the
//! output is what a perfect 1 Hz sensor would have recorded.

use rand::Rng;
use sensor_compare::distance::haversine_distance;
use sensor_compare::models::Position;
use time::{Duration, OffsetDateTime};

use crate::config::{BoundingBox, DEFAULT_START, Region};
use crate::profiles::{self, AthleteProfile};
use crate::terrain::ElevationGenerator;

const METERS_PER_DEGREE: f64 = 111_000.0;

/// The athlete's true state at one second of the activity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruthPoint {
    pub timestamp: OffsetDateTime,
    pub lat: f64,
    pub lon: f64,
    pub elevation: f64,
    pub heart_rate: f64,
    pub speed_mps: f64,
}

#[derive(Debug, Clone)]
pub struct TrackConfig {
    /// Target distance in meters.
    pub distance_meters: f64,
    /// Starting point (lat, lon). If None, random within bounds.
    pub start_point: Option<(f64, f64)>,
    pub bounds: BoundingBox,
    pub start_time: OffsetDateTime,
    /// Largest heading change per second, in radians.
    pub heading_wander: f64,
    /// Fraction of the gap to the target heart rate closed each second.
    pub heart_rate_response: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            distance_meters: 3000.0,
            start_point: None,
            bounds: Region::BOULDER,
            start_time: DEFAULT_START,
            heading_wander: 0.15,
            heart_rate_response: 0.08,
        }
    }
}

pub struct ProceduralGenerator {
    config: TrackConfig,
    elevation: ElevationGenerator,
}

impl ProceduralGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            config: TrackConfig::default(),
            elevation: ElevationGenerator::boulder(seed),
        }
    }

    pub fn for_region(bounds: BoundingBox, elevation: ElevationGenerator) -> Self {
        Self {
            config: TrackConfig {
                bounds,
                ..Default::default()
            },
            elevation,
        }
    }

    pub fn with_distance(mut self, meters: f64) -> Self {
        self.config.distance_meters = meters;
        self
    }

    pub fn with_start(mut self, lat: f64, lon: f64) -> Self {
        self.config.start_point = Some((lat, lon));
        self
    }

    pub fn with_start_time(mut self, start: OffsetDateTime) -> Self {
        self.config.start_time = start;
        self
    }

    /// Generates one point per second until the target distance is covered.
    pub fn generate(&self, profile: &dyn AthleteProfile, rng: &mut impl Rng) -> Vec<TruthPoint> {
        let mut current = self
            .config
            .start_point
            .unwrap_or_else(|| self.config.bounds.random_point(rng));
        let mut heading = rng.gen_range(0.0..std::f64::consts::TAU);
        let form = profiles::sample_variance(profile, rng);

        let mut elevation = self.elevation.elevation_at(current.0, current.1);
        let mut heart_rate = profiles::target_heart_rate(profile, 0.0) - 25.0;
        let mut timestamp = self.config.start_time;
        let mut covered = 0.0;
        let mut grade = 0.0;

        let mut track = Vec::new();
        loop {
            let speed = profiles::speed_at_grade(profile, grade, form);
            track.push(TruthPoint {
                timestamp,
                lat: current.0,
                lon: current.1,
                elevation,
                heart_rate,
                speed_mps: speed,
            });
            if covered >= self.config.distance_meters {
                break;
            }

            heading += rng.gen_range(-self.config.heading_wander..self.config.heading_wander);
            let (next, bounced) = self.step(current, heading, speed);
            heading = bounced;

            let step = distance_between(current, next);
            let next_elevation = self.elevation.elevation_at(next.0, next.1);
            grade = if step > 0.0 {
                (next_elevation - elevation) / step
            } else {
                0.0
            };

            let target = profiles::target_heart_rate(profile, grade);
            heart_rate += (target - heart_rate) * self.config.heart_rate_response;

            covered += step;
            current = next;
            elevation = next_elevation;
            timestamp += Duration::SECOND;
        }

        track
    }

    /// Moves `meters` along `heading`, bouncing off the region edges.
    fn step(&self, (lat, lon): (f64, f64), heading: f64, meters: f64) -> ((f64, f64), f64) {
        let lat_delta = meters * heading.cos() / METERS_PER_DEGREE;
        let lon_delta = meters * heading.sin() / (METERS_PER_DEGREE * lat.to_radians().cos());

        let b = &self.config.bounds;
        let (mut next_lat, mut next_lon) = (lat + lat_delta, lon + lon_delta);
        let mut heading = heading;

        if !(b.min_lat..=b.max_lat).contains(&next_lat) {
            heading = std::f64::consts::PI - heading;
            next_lat = lat - lat_delta;
        }
        if !(b.min_lon..=b.max_lon).contains(&next_lon) {
            heading = -heading;
            next_lon = lon - lon_delta;
        }

        ((next_lat, next_lon), heading)
    }
}

fn distance_between(a: (f64, f64), b: (f64, f64)) -> f64 {
    match (Position::new(a.0, a.1), Position::new(b.0, b.1)) {
        (Some(a), Some(b)) => haversine_distance(a, b),
        _ => 0.0,
    }
}

/// Offsets a coordinate by the given number of meters north and east.
pub fn offset_meters((lat, lon): (f64, f64), north: f64, east: f64) -> (f64, f64) {
    (
        lat + north / METERS_PER_DEGREE,
        lon + east / (METERS_PER_DEGREE * lat.to_radians().cos()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::RunnerProfile;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn track(distance: f64) -> Vec<TruthPoint> {
        let mut rng = StdRng::seed_from_u64(42);
        ProceduralGenerator::new(42)
            .with_distance(distance)
            .generate(&RunnerProfile::default(), &mut rng)
    }

    #[test]
    fn test_one_point_per_second() {
        let track = track(500.0);
        assert!(track.len() > 100, "got {} points", track.len());
        assert_eq!(track[0].timestamp, DEFAULT_START);
        for w in track.windows(2) {
            assert_eq!(w[1].timestamp - w[0].timestamp, Duration::SECOND);
        }
    }

    #[test]
    fn test_covers_target_distance() {
        let track = track(1000.0);
        let total: f64 = track
            .windows(2)
            .map(|w| distance_between((w[0].lat, w[0].lon), (w[1].lat, w[1].lon)))
            .sum();
        assert!(total >= 1000.0 && total < 1020.0, "got {total}");
    }

    #[test]
    fn test_stays_in_region() {
        let track = track(3000.0);
        assert!(track.iter().all(|p| Region::BOULDER.contains(p.lat, p.lon)));
    }

    #[test]
    fn test_heart_rate_is_plausible() {
        let track = track(2000.0);
        assert!(track.iter().all(|p| (90.0..200.0).contains(&p.heart_rate)));
        // warms up from below the working rate
        assert!((track[0].heart_rate - 127.0).abs() < 1e-9);
    }

    #[test]
    fn test_offset_meters() {
        let (lat, lon) = offset_meters((0.0, 0.0), 111.0, 0.0);
        assert!((lat - 0.001).abs() < 1e-12);
        assert_eq!(lon, 0.0);
    }
}
