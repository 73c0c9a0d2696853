//! Configuration types for synthetic recordings.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::datetime;

/// Geographic bounding box defined by southwest and northeast corners.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum latitude (south)
    pub min_lat: f64,
    /// Minimum longitude (west)
    pub min_lon: f64,
    /// Maximum latitude (north)
    pub max_lat: f64,
    /// Maximum longitude (east)
    pub max_lon: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Returns a random point within the bounding box.
    pub fn random_point(&self, rng: &mut impl rand::Rng) -> (f64, f64) {
        let lat = rng.gen_range(self.min_lat..self.max_lat);
        let lon = rng.gen_range(self.min_lon..self.max_lon);
        (lat, lon)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

/// Pre-defined geographic regions.
#[derive(Debug, Clone, Copy)]
pub struct Region;

impl Region {
    /// Boulder, CO foothills.
    pub const BOULDER: BoundingBox = BoundingBox::new(39.9, -105.5, 40.1, -105.2);

    /// A flat park near sea level.
    pub const GOLDEN_GATE_PARK: BoundingBox = BoundingBox::new(37.765, -122.51, 37.775, -122.455);
}

/// Default start of every generated activity, so fixtures are reproducible.
pub const DEFAULT_START: OffsetDateTime = datetime!(2024-05-01 14:30:00 UTC);

/// Settings shared by every device of a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub seed: u64,
    pub region: BoundingBox,
    /// Ground-truth distance in meters.
    pub distance_meters: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            region: Region::BOULDER,
            distance_meters: 3000.0,
            start_time: DEFAULT_START,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_points_stay_inside() {
        let mut rng = StdRng::seed_from_u64(3);
        let bounds = Region::GOLDEN_GATE_PARK;
        for _ in 0..100 {
            let (lat, lon) = bounds.random_point(&mut rng);
            assert!(bounds.contains(lat, lon));
        }
        let (lat, lon) = Region::BOULDER.center();
        assert!((lat - 40.0).abs() < 1e-9);
        assert!((lon + 105.35).abs() < 1e-9);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "seed": 7,
            "region": {"min_lat": 37.7, "min_lon": -122.5, "max_lat": 37.8, "max_lon": -122.4},
            "distance_meters": 1200.0,
            "start_time": "2024-05-01T14:30:00Z"
        }"#;
        let config: ScenarioConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.start_time, DEFAULT_START);
        assert!(config.region.contains(37.75, -122.45));
    }
}
