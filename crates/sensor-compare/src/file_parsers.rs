//! Activity file parsers for GPX, TCX, and FIT formats.
//!
//! Every parser produces the same [`ParsedActivity`]: the recorded points in
//! file order, the sport label the file declares (empty when it declares none)
//! and the activity start time.

use bytes::Buf as _;
use bytes::Bytes;
use std::io::BufReader;
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::models::{Position, TrackPointData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Gpx,
    Tcx,
    Fit,
    Other,
}

impl FileType {
    /// Detects the type from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("gpx") => Self::Gpx,
            Some("tcx") => Self::Tcx,
            Some("fit") => Self::Fit,
            _ => Self::Other,
        }
    }

}

/// Result of parsing an activity file
#[derive(Debug, Clone, Default)]
pub struct ParsedActivity {
    pub points: Vec<TrackPointData>,
    /// Sport declared by the file, empty when unknown.
    pub sport: String,
    /// Start time declared by the file, if any.
    pub started_at: Option<OffsetDateTime>,
}

impl ParsedActivity {
    /// Declared start time, falling back to the first timestamped point.
    pub fn start_time(&self) -> Option<OffsetDateTime> {
        self.started_at
            .or_else(|| self.points.iter().find_map(|pt| pt.timestamp))
    }
}

/// Error type for parsing failures
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to parse GPX file: {0}")]
    GpxError(String),
    #[error("Failed to parse TCX file: {0}")]
    TcxError(String),
    #[error("Failed to parse FIT file: {0}")]
    FitError(String),
    #[error("Unsupported file type: {0:?}")]
    UnsupportedFileType(FileType),
}

/// Parse an activity file of the given type.
pub fn parse_activity_file(
    file_type: FileType,
    bytes: Bytes,
) -> Result<ParsedActivity, ParseError> {
    match file_type {
        FileType::Gpx => parse_gpx(bytes),
        FileType::Tcx => parse_tcx(bytes),
        FileType::Fit => parse_fit(bytes),
        FileType::Other => Err(ParseError::UnsupportedFileType(file_type)),
    }
}

/// Parse a GPX file.
///
/// The `gpx` crate drops track point extensions, so heart rate
/// (`gpxtpx:TrackPointExtension/gpxtpx:hr`) is read in a second pass over
/// the document and matched to the track points by position in the file.
pub fn parse_gpx(bytes: Bytes) -> Result<ParsedActivity, ParseError> {
    let heart_rates = gpx_heart_rates(&bytes);
    let gpx = gpx::read(bytes.reader()).map_err(|e| ParseError::GpxError(e.to_string()))?;

    let started_at = gpx
        .metadata
        .as_ref()
        .and_then(|m| m.time.as_ref())
        .and_then(gpx_time);

    let mut points = Vec::new();
    for track in &gpx.tracks {
        for seg in &track.segments {
            for pt in &seg.points {
                let point = pt.point();
                points.push(TrackPointData {
                    timestamp: pt.time.as_ref().and_then(gpx_time),
                    position: Position::new(point.y(), point.x()),
                    heart_rate: None,
                    elevation: pt.elevation,
                });
            }
        }
    }

    match heart_rates {
        Some(rates) if rates.len() == points.len() => {
            for (point, hr) in points.iter_mut().zip(rates) {
                point.heart_rate = hr;
            }
        }
        Some(rates) => tracing::warn!(
            "GPX heart rate skipped: {} trkpt elements for {} track points",
            rates.len(),
            points.len()
        ),
        None => {}
    }

    Ok(ParsedActivity {
        points,
        sport: String::new(),
        started_at,
    })
}

/// Heart rate of every `trkpt` in document order, `None` where a point has none.
///
/// Returns `None` when the document cannot be read as XML.
fn gpx_heart_rates(bytes: &[u8]) -> Option<Vec<Option<u32>>> {
    let text = std::str::from_utf8(bytes).ok()?;
    let doc = match roxmltree::Document::parse(text) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!("GPX extensions not readable: {e}");
            return None;
        }
    };

    let rates = doc
        .descendants()
        .filter(|n| n.has_tag_name("trkpt"))
        .map(|trkpt| {
            trkpt
                .descendants()
                .find(|n| n.has_tag_name("hr"))
                .and_then(|hr| hr.text())
                .and_then(|t| t.trim().parse::<f64>().ok())
                .filter(|v| *v >= 0.0)
                .map(|v| v as u32)
        })
        .collect();
    Some(rates)
}

fn gpx_time(t: &gpx::Time) -> Option<OffsetDateTime> {
    t.format()
        .ok()
        .and_then(|s| OffsetDateTime::parse(&s, &Rfc3339).ok())
}

/// Parse a TCX (Training Center XML) file.
///
/// Trackpoints without a position are kept so that heart-rate-only devices
/// still contribute samples.
pub fn parse_tcx(bytes: Bytes) -> Result<ParsedActivity, ParseError> {
    // TCX crate needs a BufReader
    let cursor = std::io::Cursor::new(bytes.to_vec());
    let mut buf_reader = BufReader::new(cursor);

    let tcx_data =
        tcx::read(&mut buf_reader).map_err(|e| ParseError::TcxError(format!("{e:?}")))?;

    let mut points = Vec::new();
    let mut sport = String::new();
    let mut started_at = None;

    if let Some(ref activities) = tcx_data.activities {
        if let Some(first) = activities.activities.first() {
            sport = first.sport.trim().to_string();
            // the Id is usually, but not always, the start time
            started_at = OffsetDateTime::parse(first.id.trim(), &Rfc3339).ok();
        }

        for activity in &activities.activities {
            for lap in &activity.laps {
                for track in &lap.tracks {
                    for trackpoint in &track.trackpoints {
                        let position = trackpoint
                            .position
                            .as_ref()
                            .and_then(|p| Position::new(p.latitude, p.longitude));

                        points.push(TrackPointData {
                            timestamp: chrono_to_offset_datetime_utc(&trackpoint.time),
                            position,
                            heart_rate: trackpoint.heart_rate.as_ref().map(|h| h.value as u32),
                            elevation: trackpoint.altitude_meters,
                        });
                    }
                }
            }
        }
    }

    Ok(ParsedActivity {
        points,
        sport,
        started_at,
    })
}

/// Convert chrono DateTime<Utc> to time OffsetDateTime
fn chrono_to_offset_datetime_utc(dt: &chrono::DateTime<chrono::Utc>) -> Option<OffsetDateTime> {
    let nanos = dt.timestamp_nanos_opt()?;
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos)).ok()
}

/// Convert chrono DateTime<Local> to time OffsetDateTime
fn chrono_to_offset_datetime_local(
    dt: &chrono::DateTime<chrono::Local>,
) -> Option<OffsetDateTime> {
    chrono_to_offset_datetime_utc(&dt.with_timezone(&chrono::Utc))
}

/// Parse a FIT (Flexible and Interoperable Data Transfer) file.
///
/// FIT sport names use a different vocabulary from TCX, so FIT files are
/// treated as unlabeled.
pub fn parse_fit(bytes: Bytes) -> Result<ParsedActivity, ParseError> {
    let data = bytes.to_vec();
    let fit_data = fitparser::from_bytes(&data).map_err(|e| ParseError::FitError(e.to_string()))?;

    let mut points = Vec::new();

    for record in fit_data {
        if record.kind() != fitparser::profile::field_types::MesgNum::Record {
            continue;
        }

        let mut lat: Option<f64> = None;
        let mut lon: Option<f64> = None;
        let mut elevation: Option<f64> = None;
        let mut timestamp: Option<OffsetDateTime> = None;
        let mut hr: Option<u32> = None;

        for field in record.fields() {
            match field.name() {
                "position_lat" => {
                    if let fitparser::Value::SInt32(v) = field.value() {
                        lat = Some(semicircles_to_degrees(*v));
                    }
                }
                "position_long" => {
                    if let fitparser::Value::SInt32(v) = field.value() {
                        lon = Some(semicircles_to_degrees(*v));
                    }
                }
                "altitude" | "enhanced_altitude" => {
                    elevation = extract_fit_f64(field.value());
                }
                "timestamp" => {
                    if let fitparser::Value::Timestamp(t) = field.value() {
                        timestamp = chrono_to_offset_datetime_local(t);
                    }
                }
                "heart_rate" => {
                    hr = extract_fit_f64(field.value())
                        .filter(|v| *v >= 0.0)
                        .map(|v| v as u32);
                }
                _ => {}
            }
        }

        points.push(TrackPointData {
            timestamp,
            position: Position::from_parts(lat, lon),
            heart_rate: hr,
            elevation,
        });
    }

    Ok(ParsedActivity {
        points,
        sport: String::new(),
        started_at: None,
    })
}

/// Convert FIT semicircles to degrees.
/// FIT uses semicircles where 2^31 semicircles = 180 degrees.
fn semicircles_to_degrees(semicircles: i32) -> f64 {
    (semicircles as f64) * (180.0 / 2_147_483_648.0)
}

/// Extract f64 from various FIT value types
fn extract_fit_f64(value: &fitparser::Value) -> Option<f64> {
    match value {
        fitparser::Value::Float32(v) => Some(*v as f64),
        fitparser::Value::Float64(v) => Some(*v),
        fitparser::Value::SInt8(v) => Some(*v as f64),
        fitparser::Value::UInt8(v) => Some(*v as f64),
        fitparser::Value::SInt16(v) => Some(*v as f64),
        fitparser::Value::UInt16(v) => Some(*v as f64),
        fitparser::Value::SInt32(v) => Some(*v as f64),
        fitparser::Value::UInt32(v) => Some(*v as f64),
        _ => None,
    }
}
