//! Garmin Training Center (TCX v2) output.
//!
//! One activity with one lap. Trackpoints without a position still carry their
//! time and heart rate, the way chest-strap-only recordings look.

use std::fmt::Write as _;

use sensor_compare::distance::haversine_distance;
use sensor_compare::models::{Position, TrackPointData};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::xml::escape_xml;

fn rfc3339(t: OffsetDateTime) -> String {
    t.format(&Rfc3339).unwrap_or_default()
}

/// Renders `points` as a TCX document declaring `sport`.
///
/// The activity id is `start`, or the first point time when `start` is `None`.
/// Points without a timestamp are skipped.
pub fn generate_tcx(
    points: &[TrackPointData],
    sport: &str,
    start: Option<OffsetDateTime>,
) -> Vec<u8> {
    let timed: Vec<(OffsetDateTime, &TrackPointData)> = points
        .iter()
        .filter_map(|p| p.timestamp.map(|t| (t, p)))
        .collect();

    let id = start
        .or_else(|| timed.first().map(|(t, _)| *t))
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
    let total_seconds = match (timed.first(), timed.last()) {
        (Some((first, _)), Some((last, _))) => (*last - *first).as_seconds_f64(),
        _ => 0.0,
    };

    let mut cumulative = Vec::with_capacity(timed.len());
    let mut total = 0.0;
    let mut last: Option<Position> = None;
    for (_, p) in &timed {
        if let Some(pos) = p.position {
            total += last.map_or(0.0, |prev| haversine_distance(prev, pos));
            last = Some(pos);
            cumulative.push(Some(total));
        } else {
            cumulative.push(None);
        }
    }

    let mut tcx = String::new();
    tcx.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    tcx.push_str("<TrainingCenterDatabase xmlns=\"http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\n");
    tcx.push_str("  <Activities>\n");
    let _ = writeln!(tcx, "    <Activity Sport=\"{}\">", escape_xml(sport));
    let _ = writeln!(tcx, "      <Id>{}</Id>", rfc3339(id));
    let _ = writeln!(tcx, "      <Lap StartTime=\"{}\">", rfc3339(id));
    let _ = writeln!(tcx, "        <TotalTimeSeconds>{total_seconds:.1}</TotalTimeSeconds>");
    let _ = writeln!(tcx, "        <DistanceMeters>{total:.2}</DistanceMeters>");
    tcx.push_str("        <Calories>0</Calories>\n");
    tcx.push_str("        <Intensity>Active</Intensity>\n");
    tcx.push_str("        <TriggerMethod>Manual</TriggerMethod>\n");
    tcx.push_str("        <Track>\n");

    for ((t, p), distance) in timed.iter().zip(&cumulative) {
        tcx.push_str("          <Trackpoint>\n");
        let _ = writeln!(tcx, "            <Time>{}</Time>", rfc3339(*t));
        if let Some(pos) = p.position {
            tcx.push_str("            <Position>\n");
            let _ = writeln!(tcx, "              <LatitudeDegrees>{:.7}</LatitudeDegrees>", pos.lat);
            let _ = writeln!(tcx, "              <LongitudeDegrees>{:.7}</LongitudeDegrees>", pos.lon);
            tcx.push_str("            </Position>\n");
        }
        if let Some(ele) = p.elevation {
            let _ = writeln!(tcx, "            <AltitudeMeters>{ele:.2}</AltitudeMeters>");
        }
        if let Some(d) = distance {
            let _ = writeln!(tcx, "            <DistanceMeters>{d:.2}</DistanceMeters>");
        }
        if let Some(hr) = p.heart_rate {
            let _ = writeln!(tcx, "            <HeartRateBpm><Value>{hr}</Value></HeartRateBpm>");
        }
        tcx.push_str("          </Trackpoint>\n");
    }

    tcx.push_str("        </Track>\n");
    tcx.push_str("      </Lap>\n");
    tcx.push_str("    </Activity>\n");
    tcx.push_str("  </Activities>\n");
    tcx.push_str("</TrainingCenterDatabase>\n");

    tcx.into_bytes()
}
