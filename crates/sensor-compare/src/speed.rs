//! Instantaneous speed from consecutive cumulative distances.

use time::OffsetDateTime;

use crate::distance::TrackMetric;
use crate::models::DeviceSeries;

/// Speed between each sample and its predecessor, in km/h.
///
/// The first sample anchors the series and has no speed. A predecessor with
/// the same or a later timestamp also yields no speed.
#[derive(Debug, Clone, Default)]
pub struct InstantSpeed {
    last: Option<(OffsetDateTime, f64)>,
    speeds: Vec<Option<f64>>,
}

impl TrackMetric for InstantSpeed {
    type Point = (OffsetDateTime, f64);
    type Score = Vec<Option<f64>>;

    fn next_point(&mut self, &(time, distance): &(OffsetDateTime, f64)) {
        let speed = self.last.and_then(|(prev_time, prev_distance)| {
            let hours = (time - prev_time).as_seconds_f64() / 3600.0;
            (hours > 0.0).then(|| (distance - prev_distance) / 1000.0 / hours)
        });
        self.last = Some((time, distance));
        self.speeds.push(speed);
    }

    fn finish(&mut self) -> Vec<Option<f64>> {
        std::mem::take(&mut self.speeds)
    }
}

pub fn speeds_kmh(points: &[(OffsetDateTime, f64)]) -> Vec<Option<f64>> {
    let mut acc = InstantSpeed::default();
    for p in points {
        acc.next_point(p);
    }
    acc.finish()
}

/// Fills `speed_kmh` on the samples that carry a cumulative distance.
pub fn enrich_speed(series: &mut DeviceSeries) {
    let indexed: Vec<(usize, (OffsetDateTime, f64))> = series
        .samples
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.cumulative_distance_meters.map(|d| (i, (s.timestamp, d))))
        .collect();

    if indexed.is_empty() {
        return;
    }

    let points: Vec<_> = indexed.iter().map(|(_, p)| *p).collect();
    for ((i, _), speed) in indexed.iter().zip(speeds_kmh(&points)) {
        series.samples[*i].speed_kmh = speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sample;
    use time::Duration;
    use time::macros::datetime;

    #[test]
    fn test_36km_in_one_hour() {
        let t0 = datetime!(2024-05-01 10:00:00 UTC);
        let speeds = speeds_kmh(&[(t0, 0.0), (t0 + Duration::hours(1), 36_000.0)]);
        assert_eq!(speeds.len(), 2);
        assert!(speeds[0].is_none());
        assert!((speeds[1].unwrap() - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_per_second_speed() {
        let t0 = datetime!(2024-05-01 10:00:00 UTC);
        let points: Vec<_> = (0..5)
            .map(|i| (t0 + Duration::seconds(i), i as f64 * 5.0))
            .collect();
        let speeds = speeds_kmh(&points);
        for s in &speeds[1..] {
            assert!((s.unwrap() - 18.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_duplicate_timestamp_has_no_speed() {
        let t0 = datetime!(2024-05-01 10:00:00 UTC);
        let speeds = speeds_kmh(&[
            (t0, 0.0),
            (t0, 3.0),
            (t0 + Duration::seconds(1), 6.0),
        ]);
        assert!(speeds[1].is_none());
        assert!((speeds[2].unwrap() - 10.8).abs() < 1e-9);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(speeds_kmh(&[]).is_empty());
        let t0 = datetime!(2024-05-01 10:00:00 UTC);
        assert_eq!(speeds_kmh(&[(t0, 0.0)]), vec![None]);
    }

    #[test]
    fn test_enrich_leaves_series_without_distance_alone() {
        let t0 = datetime!(2024-05-01 10:00:00 UTC);
        let mut series = DeviceSeries::new(
            "polar",
            vec![Sample::new(t0).with_heart_rate(90), Sample::new(t0 + Duration::seconds(1))],
        );
        enrich_speed(&mut series);
        assert!(series.samples.iter().all(|s| s.speed_kmh.is_none()));
    }

    #[test]
    fn test_enrich_sets_speed_after_anchor() {
        let t0 = datetime!(2024-05-01 10:00:00 UTC);
        let mut samples = vec![Sample::new(t0), Sample::new(t0 + Duration::seconds(10))];
        samples[0].cumulative_distance_meters = Some(0.0);
        samples[1].cumulative_distance_meters = Some(100.0);
        let mut series = DeviceSeries::new("apple", samples);

        enrich_speed(&mut series);
        assert!(series.samples[0].speed_kmh.is_none());
        assert!((series.samples[1].speed_kmh.unwrap() - 36.0).abs() < 1e-9);
    }
}
