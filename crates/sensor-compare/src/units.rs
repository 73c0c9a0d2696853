//! Units of measure for human-facing magnitudes.
//!
//! Every engine computes in meters and km/h. Values are converted with the
//! fixed ratios below only when a table or chart is produced.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Miles per kilometer.
pub const KM_TO_MILE_RATIO: f64 = 0.621371;
/// Feet per meter.
pub const M_TO_FT_RATIO: f64 = 3.28084;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitOfMeasure {
    #[default]
    Metric,
    Imperial,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown unit of measure: {0}")]
pub struct UnknownUnit(pub String);

impl FromStr for UnitOfMeasure {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            _ => Err(UnknownUnit(s.to_string())),
        }
    }
}

impl fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metric => f.write_str("metric"),
            Self::Imperial => f.write_str("imperial"),
        }
    }
}

impl UnitOfMeasure {
    /// Ratio applied to kilometers (and km/h) for display.
    pub fn large_ratio(self) -> f64 {
        match self {
            Self::Metric => 1.0,
            Self::Imperial => KM_TO_MILE_RATIO,
        }
    }

    /// Ratio applied to meters for display.
    pub fn small_ratio(self) -> f64 {
        match self {
            Self::Metric => 1.0,
            Self::Imperial => M_TO_FT_RATIO,
        }
    }

    /// Meters to km or mi.
    pub fn meters_to_large(self, meters: f64) -> f64 {
        meters / 1000.0 * self.large_ratio()
    }

    pub fn large_to_meters(self, value: f64) -> f64 {
        value / self.large_ratio() * 1000.0
    }

    /// Meters to m or ft.
    pub fn meters_to_small(self, meters: f64) -> f64 {
        meters * self.small_ratio()
    }

    pub fn small_to_meters(self, value: f64) -> f64 {
        value / self.small_ratio()
    }

    /// km/h to km/h or mph.
    pub fn kmh_to_display(self, kmh: f64) -> f64 {
        kmh * self.large_ratio()
    }

    pub fn display_to_kmh(self, value: f64) -> f64 {
        value / self.large_ratio()
    }

    pub fn distance_label(self) -> &'static str {
        match self {
            Self::Metric => "km",
            Self::Imperial => "mi",
        }
    }

    pub fn small_distance_label(self) -> &'static str {
        match self {
            Self::Metric => "m",
            Self::Imperial => "ft",
        }
    }

    pub fn speed_label(self) -> &'static str {
        match self {
            Self::Metric => "km/h",
            Self::Imperial => "mph",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!("metric".parse::<UnitOfMeasure>().unwrap(), UnitOfMeasure::Metric);
        assert_eq!("IMPERIAL".parse::<UnitOfMeasure>().unwrap(), UnitOfMeasure::Imperial);
        assert!("furlongs".parse::<UnitOfMeasure>().is_err());
    }

    #[test]
    fn test_metric_is_identity_on_base_units() {
        let units = UnitOfMeasure::Metric;
        assert!((units.meters_to_large(5000.0) - 5.0).abs() < 1e-12);
        assert!((units.meters_to_small(42.0) - 42.0).abs() < 1e-12);
        assert!((units.kmh_to_display(12.5) - 12.5).abs() < 1e-12);
    }

    #[test]
    fn test_imperial_round_trip() {
        let units = UnitOfMeasure::Imperial;
        for meters in [0.0, 1.0, 1609.344, 42_195.0, 123_456.789] {
            let miles = units.meters_to_large(meters);
            assert!((units.large_to_meters(miles) - meters).abs() < 1e-6);

            let feet = units.meters_to_small(meters);
            assert!((units.small_to_meters(feet) - meters).abs() < 1e-6);
        }

        let mph = units.kmh_to_display(36.0);
        assert!((mph - 36.0 * KM_TO_MILE_RATIO).abs() < 1e-12);
        assert!((units.display_to_kmh(mph) - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_labels() {
        assert_eq!(UnitOfMeasure::Metric.distance_label(), "km");
        assert_eq!(UnitOfMeasure::Imperial.small_distance_label(), "ft");
        assert_eq!(UnitOfMeasure::Imperial.speed_label(), "mph");
    }
}
