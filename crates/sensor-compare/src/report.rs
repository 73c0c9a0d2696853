//! HTML report: one tab per metric family plus a track map.
//!
//! Charts are rendered to inline SVG with `plotters`; x axes are minutes since
//! the first sample of the run.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use geo::{BoundingRect, Centroid, MultiPoint, Point};
use plotters::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;

use crate::errors::{CompareError, Result};
use crate::models::{DeviceSeries, MetricsTable, RowRole, SpeedRow};
use crate::pipeline::{ComparisonRun, RunSummary};
use crate::units::UnitOfMeasure;

const CHART_SIZE: (u32, u32) = (1100, 520);
const MISSING: &str = "---";

struct Line {
    label: String,
    points: Vec<(f64, f64)>,
}

fn report_error<E: std::fmt::Display>(e: E) -> CompareError {
    CompareError::Report(e.to_string())
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{v:.2}"))
}

fn padded_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    let pad = ((hi - lo) * 0.05).max(1e-6);
    (lo - pad)..(hi + pad)
}

fn line_chart(
    title: &str,
    x_desc: &str,
    y_desc: &str,
    lines: &[Line],
    markers: &[(f64, f64)],
) -> Result<String> {
    sized_line_chart(CHART_SIZE, title, x_desc, y_desc, lines, markers)
}

fn sized_line_chart(
    size: (u32, u32),
    title: &str,
    x_desc: &str,
    y_desc: &str,
    lines: &[Line],
    markers: &[(f64, f64)],
) -> Result<String> {
    let x_range = padded_range(lines.iter().flat_map(|l| l.points.iter().map(|p| p.0)));
    let y_range = padded_range(
        lines
            .iter()
            .flat_map(|l| l.points.iter().map(|p| p.1))
            .chain(markers.iter().map(|m| m.1)),
    );

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(report_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 22))
            .margin(20)
            .set_label_area_size(LabelAreaPosition::Left, 70)
            .set_label_area_size(LabelAreaPosition::Bottom, 45)
            .build_cartesian_2d(x_range, y_range)
            .map_err(report_error)?;

        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc(y_desc)
            .draw()
            .map_err(report_error)?;

        for (i, line) in lines.iter().enumerate() {
            let color = Palette99::pick(i).to_rgba();
            chart
                .draw_series(LineSeries::new(line.points.iter().copied(), color))
                .map_err(report_error)?
                .label(line.label.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .draw_series(
                markers
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 5, RED.filled())),
            )
            .map_err(report_error)?;

        if !lines.is_empty() {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .position(SeriesLabelPosition::UpperRight)
                .draw()
                .map_err(report_error)?;
        }

        root.present().map_err(report_error)?;
    }
    Ok(svg)
}

fn minutes_since(start: OffsetDateTime, t: OffsetDateTime) -> f64 {
    (t - start).as_seconds_f64() / 60.0
}

fn device_lines(
    devices: &[&DeviceSeries],
    start: OffsetDateTime,
    value: impl Fn(&DeviceSeries) -> Vec<(OffsetDateTime, Option<f64>)>,
) -> Vec<Line> {
    devices
        .iter()
        .filter_map(|d| {
            let points: Vec<(f64, f64)> = value(d)
                .into_iter()
                .filter_map(|(t, v)| v.map(|v| (minutes_since(start, t), v)))
                .collect();
            (!points.is_empty()).then(|| Line {
                label: d.device_id.clone(),
                points,
            })
        })
        .collect()
}

fn metrics_table_html(table: &MetricsTable, headers: [&str; 4]) -> String {
    let mut html = String::from("<table>\n<tr>");
    for h in headers {
        let _ = write!(html, "<th>{}</th>", escape_html(h));
    }
    html.push_str("</tr>\n");
    for row in &table.rows {
        let class = match row.role {
            RowRole::Baseline => " class=\"baseline\"",
            RowRole::Compared => "",
        };
        let _ = writeln!(
            html,
            "<tr{class}><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&row.device),
            fmt_value(row.mae),
            fmt_value(row.aggregate),
            fmt_value(row.variance),
        );
    }
    html.push_str("</table>\n");
    html
}

fn speed_table_html(rows: &[SpeedRow], units: UnitOfMeasure, offset: time::UtcOffset) -> String {
    let label = units.speed_label();
    let mut html = format!(
        "<table>\n<tr><th>Device</th><th>Average speed ({label})</th><th>Outliers</th></tr>\n"
    );
    for row in rows {
        let outliers = if row.outliers.is_empty() {
            "none".to_string()
        } else {
            row.outliers
                .iter()
                .map(|o| {
                    let t = o.timestamp.to_offset(offset).time();
                    format!(
                        "{:02}:{:02}:{:02} ({:.1} {label})",
                        t.hour(),
                        t.minute(),
                        t.second(),
                        units.kmh_to_display(o.speed_kmh)
                    )
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&row.device),
            fmt_value(row.average_speed),
            outliers
        );
    }
    html.push_str("</table>\n");
    html
}

/// Mean position over every positioned sample, with the extent of the tracks.
pub fn map_center(devices: &[&DeviceSeries]) -> Option<(Point, geo::Rect)> {
    let points: MultiPoint = devices
        .iter()
        .flat_map(|d| d.samples.iter().filter_map(|s| s.position))
        .map(|p| Point::new(p.lon, p.lat))
        .collect::<Vec<_>>()
        .into();
    Some((points.centroid()?, points.bounding_rect()?))
}

/// Chart size giving the track extent roughly equal meters per pixel on both
/// axes, with the height kept between 300 and 900 px.
fn map_size(extent: geo::Rect, center_lat: f64) -> (u32, u32) {
    let width = CHART_SIZE.0;
    let east_west = extent.width() * center_lat.to_radians().cos();
    let north_south = extent.height();
    if east_west <= 0.0 {
        return (width, 900);
    }
    let height = (f64::from(width) * north_south / east_west).clamp(300.0, 900.0);
    (width, height.round() as u32)
}

fn heart_rate_tab(run: &ComparisonRun, devices: &[&DeviceSeries], start: OffsetDateTime) -> Result<String> {
    let lines = device_lines(devices, start, |d| d.heart_rates().collect());
    let chart = line_chart("Heart Rate", "Minutes", "bpm", &lines, &[])?;
    let table = metrics_table_html(
        &run.heart_rate,
        ["Device", "MAE (bpm)", "Average HR (bpm)", "Variance (bpm)"],
    );
    Ok(format!("{chart}\n{table}"))
}

fn distance_tab(run: &ComparisonRun, devices: &[&DeviceSeries], start: OffsetDateTime) -> Result<String> {
    let units = run.units;
    let lines = device_lines(devices, start, |d| {
        d.distances()
            .map(|(t, v)| (t, v.map(|m| units.meters_to_large(m))))
            .collect()
    });
    let chart = line_chart("Distance", "Minutes", units.distance_label(), &lines, &[])?;
    let mae = format!("MAE ({})", units.small_distance_label());
    let total = format!("Total ({})", units.distance_label());
    let table = metrics_table_html(&run.distance, ["Device", &mae, &total, "Variance (%)"]);
    Ok(format!("{chart}\n{table}"))
}

fn speed_tab(run: &ComparisonRun, devices: &[&DeviceSeries], start: OffsetDateTime) -> Result<String> {
    let units = run.units;
    let lines = device_lines(devices, start, |d| {
        d.speeds()
            .map(|(t, v)| (t, v.map(|kmh| units.kmh_to_display(kmh))))
            .collect()
    });
    let markers: Vec<(f64, f64)> = run
        .speed
        .iter()
        .flat_map(|row| row.outliers.iter())
        .map(|o| (minutes_since(start, o.timestamp), units.kmh_to_display(o.speed_kmh)))
        .collect();
    let chart = line_chart("Speed", "Minutes", units.speed_label(), &lines, &markers)?;
    let table = speed_table_html(&run.speed, units, run.local_offset);
    Ok(format!("{chart}\n{table}"))
}

fn map_tab(devices: &[&DeviceSeries]) -> Result<String> {
    let Some((center, extent)) = map_center(devices) else {
        return Ok("<p>No device recorded a position.</p>".to_string());
    };
    let lines: Vec<Line> = devices
        .iter()
        .filter_map(|d| {
            let points: Vec<(f64, f64)> = d
                .samples
                .iter()
                .filter_map(|s| s.position.map(|p| (p.lon, p.lat)))
                .collect();
            (!points.is_empty()).then(|| Line {
                label: d.device_id.clone(),
                points,
            })
        })
        .collect();
    let title = format!("Tracks (center {:.5}, {:.5})", center.y(), center.x());
    let size = map_size(extent, center.y());
    sized_line_chart(size, &title, "Longitude", "Latitude", &lines, &[])
}

fn header_html(summary: &RunSummary, run: &ComparisonRun) -> String {
    format!(
        "<h1>{} on {}</h1>\n<p>Duration: {} &middot; {} devices &middot; {} units</p>\n",
        escape_html(&summary.sport),
        escape_html(&summary.start_time_label(run.local_offset)),
        summary.duration_label(),
        summary.device_count,
        run.units,
    )
}

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
.tabs button{padding:.6em 1.2em;border:1px solid #ccc;background:#f4f4f4;cursor:pointer}\
.tabs button.active{background:#fff;border-bottom-color:#fff}\
.tab{display:none;padding-top:1em}.tab.active{display:block}\
table{border-collapse:collapse;margin-top:1em}td,th{border:1px solid #ccc;padding:.3em .8em}\
tr.baseline{font-weight:bold}";

const SCRIPT: &str = "function openTab(id){\
document.querySelectorAll('.tab').forEach(t=>t.classList.toggle('active',t.id===id));\
document.querySelectorAll('.tabs button').forEach(b=>b.classList.toggle('active',b.dataset.tab===id));}";

/// Renders the whole report as one self-contained HTML document.
pub fn render_report(run: &ComparisonRun) -> Result<String> {
    let devices: Vec<&DeviceSeries> = run.corpus.devices().collect();
    let start = run
        .corpus
        .time_span()
        .map(|(lo, _)| lo)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);

    let tabs = [
        ("heart-rate", "Heart Rate", heart_rate_tab(run, &devices, start)?),
        ("distance", "Distance", distance_tab(run, &devices, start)?),
        ("speed", "Speed", speed_tab(run, &devices, start)?),
        ("map", "Map", map_tab(&devices)?),
    ];

    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{STYLE}</style>\n<script>{SCRIPT}</script>\n</head>\n<body>\n",
        escape_html(&run.summary.sport)
    );
    html.push_str(&header_html(&run.summary, run));

    html.push_str("<div class=\"tabs\">\n");
    for (i, (id, title, _)) in tabs.iter().enumerate() {
        let active = if i == 0 { " class=\"active\"" } else { "" };
        let _ = writeln!(
            html,
            "<button{active} data-tab=\"{id}\" onclick=\"openTab('{id}')\">{title}</button>"
        );
    }
    html.push_str("</div>\n");

    for (i, (id, _, body)) in tabs.iter().enumerate() {
        let class = if i == 0 { "tab active" } else { "tab" };
        let _ = writeln!(html, "<div id=\"{id}\" class=\"{class}\">\n{body}</div>");
    }
    html.push_str("</body>\n</html>\n");
    Ok(html)
}

#[derive(Serialize)]
struct ReportTables<'a> {
    summary: &'a RunSummary,
    units: UnitOfMeasure,
    heart_rate: &'a MetricsTable,
    distance: &'a MetricsTable,
    speed: &'a [SpeedRow],
}

/// Summary and tables of a run as pretty-printed JSON.
pub fn tables_json(run: &ComparisonRun) -> Result<String> {
    let tables = ReportTables {
        summary: &run.summary,
        units: run.units,
        heart_rate: &run.heart_rate,
        distance: &run.distance,
        speed: &run.speed,
    };
    serde_json::to_string_pretty(&tables).map_err(report_error)
}

/// Writes `<sport>_<date>.html` (and optionally `.json`) into `output_dir`.
///
/// Returns the path of the HTML file.
pub fn write_report(run: &ComparisonRun, output_dir: &Path, write_json: bool) -> Result<PathBuf> {
    let html = render_report(run)?;

    std::fs::create_dir_all(output_dir)?;
    let stem = run.summary.file_stem(run.local_offset);
    let path = output_dir.join(format!("{stem}.html"));
    std::fs::write(&path, html)?;
    tracing::info!("Report written to {}", path.display());

    if write_json {
        let json_path = output_dir.join(format!("{stem}.json"));
        std::fs::write(&json_path, tables_json(run)?)?;
        tracing::info!("Tables written to {}", json_path.display());
    }

    Ok(path)
}
