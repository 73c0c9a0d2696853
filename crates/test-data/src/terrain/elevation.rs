//! Perlin noise terrain.

use noise::{NoiseFn, Perlin};

/// Deterministic elevation field built from several octaves of Perlin noise.
#[derive(Debug, Clone)]
pub struct ElevationGenerator {
    perlin: Perlin,
    /// Meters
    base_elevation: f64,
    /// Peak deviation from the base, in meters
    height_scale: f64,
    /// Noise cycles per degree-ish; lower means broader hills
    frequency: f64,
    octaves: u32,
}

impl ElevationGenerator {
    /// Boulder foothills, around 1650 m.
    pub fn boulder(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 1650.0,
            height_scale: 150.0,
            frequency: 40.0,
            octaves: 4,
        }
    }

    /// Gentle rolling terrain near sea level.
    pub fn flat(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 30.0,
            height_scale: 15.0,
            frequency: 60.0,
            octaves: 2,
        }
    }

    pub fn with_height_scale(mut self, scale: f64) -> Self {
        self.height_scale = scale;
        self
    }

    /// Elevation in meters at a coordinate (fractal Brownian motion).
    pub fn elevation_at(&self, lat: f64, lon: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.frequency;
        let mut max_amplitude = 0.0;

        for _ in 0..self.octaves {
            total += self.perlin.get([lat * frequency, lon * frequency]) * amplitude;
            max_amplitude += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        self.base_elevation + (total / max_amplitude) * self.height_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevation_is_deterministic() {
        let a = ElevationGenerator::boulder(42);
        let b = ElevationGenerator::boulder(42);
        assert_eq!(a.elevation_at(40.0, -105.3), b.elevation_at(40.0, -105.3));
    }

    #[test]
    fn test_elevation_range() {
        let terrain = ElevationGenerator::flat(7);
        for i in 0..50 {
            let e = terrain.elevation_at(37.77 + i as f64 * 0.0001, -122.48);
            assert!((15.0..=45.0).contains(&e), "got {e}");
        }
    }
}
