//! Heart-rate and distance comparison tables against a baseline device.
//!
//! Device matching follows two different rules:
//!
//! * the baseline samples are those of every device whose id **contains** the
//!   configured label (case-insensitive);
//! * a device is left out of the comparison loop, because it *is* the
//!   baseline row, when its id **starts with** the label (case-insensitive).
//!
//! A device id that contains the label without starting with it is therefore
//! part of the baseline and also compared against it.

use crate::alignment::{JoinKind, Observation, align, mean_absolute_error};
use crate::models::{
    CombinedCorpus, DeviceSeries, MetricFamily, MetricsRow, MetricsTable, RowRole, max_of,
};
use crate::units::UnitOfMeasure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMatch {
    Prefix,
    Contains,
}

impl DeviceMatch {
    pub fn matches(self, device_id: &str, label: &str) -> bool {
        let device_id = device_id.to_lowercase();
        let label = label.to_lowercase();
        match self {
            Self::Prefix => device_id.starts_with(&label),
            Self::Contains => device_id.contains(&label),
        }
    }
}

fn baseline_observations(
    corpus: &CombinedCorpus,
    label: &str,
    pick: impl Fn(&DeviceSeries) -> Vec<Observation>,
) -> Vec<Observation> {
    corpus
        .devices()
        .filter(|d| DeviceMatch::Contains.matches(&d.device_id, label))
        .flat_map(pick)
        .collect()
}

fn compared_devices<'a>(
    corpus: &'a CombinedCorpus,
    label: &'a str,
) -> impl Iterator<Item = &'a DeviceSeries> {
    corpus
        .devices()
        .filter(move |d| !DeviceMatch::Prefix.matches(&d.device_id, label))
}

/// Rounds to two decimals, the precision the tables show.
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Heart-rate table against the ground-truth device.
///
/// The first row is the ground truth with its mean bpm. Every other device
/// with at least one timestamp shared with the ground truth gets a row with the
/// MAE over the shared timestamps, its own mean bpm over all of its readings,
/// and the signed difference of the two means.
pub fn heart_rate_metrics(corpus: &CombinedCorpus, ground_truth: &str) -> MetricsTable {
    let gt_samples = baseline_observations(corpus, ground_truth, |d| d.heart_rates().collect());
    let gt_average = mean(gt_samples.iter().filter_map(|(_, hr)| *hr));

    let gt_device = corpus
        .devices()
        .filter(|d| DeviceMatch::Prefix.matches(&d.device_id, ground_truth))
        .last()
        .map(|d| d.device_id.clone())
        .unwrap_or_else(|| format!("GT ({ground_truth})"));

    let mut rows = vec![MetricsRow {
        device: gt_device,
        role: RowRole::Baseline,
        mae: None,
        aggregate: gt_average,
        variance: None,
    }];

    for device in compared_devices(corpus, ground_truth) {
        let observations: Vec<Observation> = device.heart_rates().collect();
        let pairs = align(&observations, &gt_samples, JoinKind::Inner);
        let Some(mae) = mean_absolute_error(&pairs) else {
            tracing::debug!(
                "{}: no heart rate shared with ground truth, omitted",
                device.device_id
            );
            continue;
        };

        let average = mean(observations.iter().filter_map(|(_, hr)| *hr));
        rows.push(MetricsRow {
            device: device.device_id.clone(),
            role: RowRole::Compared,
            mae: Some(mae),
            aggregate: average,
            variance: average.zip(gt_average).map(|(a, g)| round2(a) - round2(g)),
        });
    }

    MetricsTable {
        family: MetricFamily::HeartRate,
        rows,
    }
}

/// Distance table against the reference device.
///
/// MAE is reported in meters or feet, totals in km or mi, and the variance is
/// the signed percentage difference of a device's total from the reference
/// total.
pub fn distance_metrics(
    corpus: &CombinedCorpus,
    reference: &str,
    units: UnitOfMeasure,
) -> MetricsTable {
    let ref_samples = baseline_observations(corpus, reference, |d| d.distances().collect());
    let ref_total = max_of(ref_samples.iter().filter_map(|(_, d)| *d));

    let mut rows = vec![MetricsRow {
        device: format!("Ref: ({reference})"),
        role: RowRole::Baseline,
        mae: None,
        aggregate: ref_total.map(|m| units.meters_to_large(m)),
        variance: None,
    }];

    for device in compared_devices(corpus, reference) {
        let observations: Vec<Observation> =
            device.distances().filter(|(_, d)| d.is_some()).collect();
        let pairs = align(&observations, &ref_samples, JoinKind::OuterDropNulls);
        let Some(mae) = mean_absolute_error(&pairs) else {
            tracing::debug!(
                "{}: no distance shared with reference, omitted",
                device.device_id
            );
            continue;
        };

        let total = device.total_distance_meters();
        let variance = match (total, ref_total) {
            (Some(t), Some(r)) if r > 0.0 => Some((t - r) / r * 100.0),
            _ => None,
        };

        rows.push(MetricsRow {
            device: device.device_id.clone(),
            role: RowRole::Compared,
            mae: Some(units.meters_to_small(mae)),
            aggregate: total.map(|m| units.meters_to_large(m)),
            variance,
        });
    }

    MetricsTable {
        family: MetricFamily::Distance,
        rows,
    }
}
