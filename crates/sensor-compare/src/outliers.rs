//! Per-device speed outliers and the speed summary table.

use time::OffsetDateTime;

use crate::comparison::mean;
use crate::models::{CombinedCorpus, DeviceSeries, Outlier, SpeedRow};
use crate::units::UnitOfMeasure;

/// A sample is an outlier when its absolute z-score exceeds this.
pub const Z_SCORE_THRESHOLD: f64 = 3.0;

/// Sample standard deviation (n - 1 denominator).
///
/// `None` for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values.iter().copied())?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// z-scores of `values` against their own mean and sample standard deviation.
///
/// `None` when the deviation is zero or undefined.
pub fn z_scores(values: &[f64]) -> Option<Vec<f64>> {
    let m = mean(values.iter().copied())?;
    let sd = sample_std_dev(values).filter(|sd| sd.is_finite() && *sd > 0.0)?;
    Some(values.iter().map(|v| (v - m) / sd).collect())
}

/// Speed readings whose |z| exceeds [`Z_SCORE_THRESHOLD`].
pub fn detect_outliers(speeds: &[(OffsetDateTime, f64)]) -> Vec<Outlier> {
    let values: Vec<f64> = speeds.iter().map(|(_, v)| *v).collect();
    let Some(scores) = z_scores(&values) else {
        return Vec::new();
    };

    speeds
        .iter()
        .zip(scores)
        .filter(|(_, z)| z.abs() > Z_SCORE_THRESHOLD)
        .map(|(&(timestamp, speed_kmh), z_score)| Outlier {
            timestamp,
            speed_kmh,
            z_score,
        })
        .collect()
}

fn speed_row(device: &DeviceSeries, units: UnitOfMeasure) -> Option<SpeedRow> {
    let with_speed: Vec<_> = device
        .samples
        .iter()
        .filter(|s| s.speed_kmh.is_some())
        .collect();
    let (first, last) = (with_speed.first()?, with_speed.last()?);

    let speeds: Vec<(OffsetDateTime, f64)> = with_speed
        .iter()
        .filter_map(|s| s.speed_kmh.map(|v| (s.timestamp, v)))
        .collect();
    let outliers = detect_outliers(&speeds);

    let hours = (last.timestamp - first.timestamp).as_seconds_f64() / 3600.0;
    let average_speed = last
        .cumulative_distance_meters
        .filter(|_| hours > 0.0)
        .map(|meters| units.meters_to_large(meters) / hours);

    if !outliers.is_empty() {
        tracing::info!("{}: {} speed outliers", device.device_id, outliers.len());
    }

    Some(SpeedRow {
        device: device.device_id.clone(),
        average_speed,
        outliers,
    })
}

/// One row per device that has any speed reading, in device order.
///
/// The average speed is the last cumulative distance over the time between
/// the first and last speed reading, not a mean of instantaneous speeds.
pub fn speed_metrics(corpus: &CombinedCorpus, units: UnitOfMeasure) -> Vec<SpeedRow> {
    corpus.devices().filter_map(|d| speed_row(d, units)).collect()
}
