//! Cumulative great-circle distance along a device's samples.

use crate::models::{DeviceSeries, Position};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Incremental computation over consecutive track points.
pub trait TrackMetric {
    type Point;
    type Score;
    fn next_point(&mut self, point: &Self::Point);
    fn finish(&mut self) -> Self::Score;
}

/// Great-circle distance between two positions in meters (haversine).
pub fn haversine_distance(a: Position, b: Position) -> f64 {
    let lat1_rad = a.lat.to_radians();
    let lat2_rad = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_M * c
}

#[derive(Debug, Clone, Default)]
pub struct CumulativeDistance {
    total: f64,
    last_point: Option<Position>,
    cumulative: Vec<f64>,
}

impl TrackMetric for CumulativeDistance {
    type Point = Position;
    type Score = Vec<f64>;

    fn next_point(&mut self, point: &Position) {
        self.total += self
            .last_point
            .map_or(0.0, |prev| haversine_distance(prev, *point));
        self.last_point = Some(*point);
        self.cumulative.push(self.total);
    }

    fn finish(&mut self) -> Vec<f64> {
        std::mem::take(&mut self.cumulative)
    }
}

/// Cumulative distance in meters for each position; the first entry is 0.
pub fn cumulative_distances(positions: &[Position]) -> Vec<f64> {
    let mut acc = CumulativeDistance::default();
    for p in positions {
        acc.next_point(p);
    }
    acc.finish()
}

/// Fills `cumulative_distance_meters` on every sample.
///
/// Returns `false`, leaving the series untouched, when any sample lacks a
/// position.
pub fn enrich_distance(series: &mut DeviceSeries) -> bool {
    let positions: Option<Vec<Position>> = series.samples.iter().map(|s| s.position).collect();
    let Some(positions) = positions else {
        tracing::info!(
            "{}: position missing on some samples, skipping distance",
            series.device_id
        );
        return false;
    };

    for (sample, d) in series
        .samples
        .iter_mut()
        .zip(cumulative_distances(&positions))
    {
        sample.cumulative_distance_meters = Some(d);
    }
    true
}
