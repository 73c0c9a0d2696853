//! GPX 1.1 output.
//!
//! Points without a position or timestamp are left out, since GPX track points
//! require coordinates. Heart rate goes into a Garmin TrackPointExtension.

use sensor_compare::models::TrackPointData;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::xml::escape_xml;

/// Renders `points` as a single-track, single-segment GPX document.
pub fn generate_gpx(
    points: &[TrackPointData],
    activity_name: &str,
    start: Option<OffsetDateTime>,
) -> Vec<u8> {
    let mut gpx = String::new();

    gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    gpx.push('\n');
    gpx.push_str(r#"<gpx version="1.1" creator="sensor-compare-test-data""#);
    gpx.push_str(r#" xmlns="http://www.topografix.com/GPX/1/1""#);
    gpx.push_str(r#" xmlns:gpxtpx="http://www.garmin.com/xmlschemas/TrackPointExtension/v1""#);
    gpx.push_str(r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#);
    gpx.push_str(r#" xsi:schemaLocation="http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd">"#);
    gpx.push('\n');

    gpx.push_str("  <metadata>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", escape_xml(activity_name)));
    if let Some(start) = start.and_then(|t| t.format(&Rfc3339).ok()) {
        gpx.push_str(&format!("    <time>{start}</time>\n"));
    }
    gpx.push_str("  </metadata>\n");

    gpx.push_str("  <trk>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", escape_xml(activity_name)));
    gpx.push_str("    <trkseg>\n");

    for point in points {
        let (Some(position), Some(ts)) = (point.position, point.timestamp) else {
            continue;
        };

        gpx.push_str(&format!(
            r#"      <trkpt lat="{:.7}" lon="{:.7}">"#,
            position.lat, position.lon
        ));
        gpx.push('\n');
        if let Some(ele) = point.elevation {
            gpx.push_str(&format!("        <ele>{ele:.2}</ele>\n"));
        }
        gpx.push_str(&format!(
            "        <time>{}</time>\n",
            ts.format(&Rfc3339).unwrap_or_default()
        ));
        if let Some(hr) = point.heart_rate {
            gpx.push_str(&format!(
                "        <extensions><gpxtpx:TrackPointExtension><gpxtpx:hr>{hr}</gpxtpx:hr></gpxtpx:TrackPointExtension></extensions>\n"
            ));
        }
        gpx.push_str("      </trkpt>\n");
    }

    gpx.push_str("    </trkseg>\n");
    gpx.push_str("  </trk>\n");
    gpx.push_str("</gpx>\n");

    gpx.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_START;
    use sensor_compare::file_parsers::{FileType, parse_activity_file};
    use sensor_compare::models::Position;

    fn point(lat: f64, lon: f64, secs: i64) -> TrackPointData {
        TrackPointData {
            timestamp: Some(DEFAULT_START + time::Duration::seconds(secs)),
            position: Position::new(lat, lon),
            heart_rate: Some(140),
            elevation: Some(1650.0),
        }
    }

    #[test]
    fn test_generate_gpx_basic() {
        let gpx = generate_gpx(
            &[point(40.015, -105.2705, 0), point(40.016, -105.2695, 1)],
            "Test Activity",
            Some(DEFAULT_START),
        );
        let gpx_str = String::from_utf8(gpx).unwrap();

        assert!(gpx_str.contains(r#"version="1.1""#));
        assert!(gpx_str.contains("<name>Test Activity</name>"));
        assert!(gpx_str.contains(r#"lat="40.0150000""#));
        assert!(gpx_str.contains(r#"lon="-105.2705000""#));
        assert!(gpx_str.contains("<ele>1650.00</ele>"));
        assert!(gpx_str.contains("<time>2024-05-01T14:30:00Z</time>"));
        assert!(gpx_str.contains("<gpxtpx:hr>140</gpxtpx:hr>"));
    }

    #[test]
    fn test_points_without_position_are_skipped() {
        let mut no_fix = point(40.0, -105.0, 2);
        no_fix.position = None;
        let gpx = generate_gpx(&[point(40.0, -105.0, 0), no_fix], "Run & <Ride>", None);
        let gpx_str = String::from_utf8(gpx).unwrap();
        assert_eq!(gpx_str.matches("<trkpt").count(), 1);
        assert!(gpx_str.contains("Run &amp; &lt;Ride&gt;"));
    }

    #[test]
    fn test_output_parses_back() {
        let points: Vec<_> = (0..5).map(|i| point(40.0 + i as f64 * 1e-4, -105.0, i)).collect();
        let gpx = generate_gpx(&points, "Loop", Some(DEFAULT_START));
        let parsed = parse_activity_file(FileType::Gpx, gpx.into()).unwrap();
        assert_eq!(parsed.points.len(), 5);
        assert_eq!(parsed.start_time(), Some(DEFAULT_START));
        assert!(parsed.points.iter().all(|p| p.heart_rate == Some(140)));
    }

    #[test]
    fn test_missing_heart_rate_stays_missing() {
        let mut quiet = point(40.0001, -105.0, 1);
        quiet.heart_rate = None;
        let gpx = generate_gpx(&[point(40.0, -105.0, 0), quiet], "Loop", None);
        let parsed = parse_activity_file(FileType::Gpx, gpx.into()).unwrap();
        let rates: Vec<_> = parsed.points.iter().map(|p| p.heart_rate).collect();
        assert_eq!(rates, vec![Some(140), None]);
    }
}
