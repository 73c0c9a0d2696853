//! Integration tests: folders of small hand-written recordings through the
//! whole pipeline, from file discovery to the written report.

use std::path::Path;

use sensor_compare::errors::CompareError;
use sensor_compare::models::RowRole;
use sensor_compare::{RunConfig, UnitOfMeasure, compare_folder, write_report};

const START: &str = "2024-05-01T14:30:00Z";

fn time_at(second: u32) -> String {
    format!("2024-05-01T14:30:{second:02}Z")
}

/// A TCX file with one trackpoint per heart-rate value, one second apart.
/// With `positions`, the points walk north 10 m per second.
fn tcx(sport: &str, heart_rates: &[u32], positions: bool) -> String {
    let mut trackpoints = String::new();
    for (i, hr) in heart_rates.iter().enumerate() {
        trackpoints.push_str("<Trackpoint>");
        trackpoints.push_str(&format!("<Time>{}</Time>", time_at(i as u32)));
        if positions {
            trackpoints.push_str(&format!(
                "<Position><LatitudeDegrees>{:.7}</LatitudeDegrees><LongitudeDegrees>-105.2700000</LongitudeDegrees></Position>",
                40.0 + i as f64 * 0.00009
            ));
        }
        trackpoints.push_str(&format!("<HeartRateBpm><Value>{hr}</Value></HeartRateBpm>"));
        trackpoints.push_str("</Trackpoint>\n");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<TrainingCenterDatabase xmlns="http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2">
<Activities>
<Activity Sport="{sport}">
<Id>{START}</Id>
<Lap StartTime="{START}">
<TotalTimeSeconds>{total}</TotalTimeSeconds>
<DistanceMeters>0</DistanceMeters>
<Calories>0</Calories>
<Intensity>Active</Intensity>
<TriggerMethod>Manual</TriggerMethod>
<Track>
{trackpoints}</Track>
</Lap>
</Activity>
</Activities>
</TrainingCenterDatabase>
"#,
        total = heart_rates.len().saturating_sub(1)
    )
}

/// A GPX file walking north at `meters_per_second`.
fn gpx(points: u32, meters_per_second: f64) -> String {
    let mut trkpts = String::new();
    for i in 0..points {
        let lat = 40.0 + i as f64 * meters_per_second / 111_195.0;
        trkpts.push_str(&format!(
            "<trkpt lat=\"{lat:.7}\" lon=\"-105.2700000\"><time>{}</time></trkpt>\n",
            time_at(i)
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
<metadata><time>{START}</time></metadata>
<trk><trkseg>
{trkpts}</trkseg></trk>
</gpx>
"#
    )
}

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn heart_rate_against_ground_truth() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Polar H10.tcx", &tcx("Running", &[100, 110, 120], false));
    write(dir.path(), "Garmin.tcx", &tcx("Running", &[102, 108, 125], false));
    // starts two minutes after the strap stopped, nothing to compare
    write(
        dir.path(),
        "Late Watch.tcx",
        &tcx("Running", &[100, 100], false).replace("14:30:0", "14:32:0"),
    );

    let run = compare_folder(dir.path(), &RunConfig::default()).unwrap();

    let gt = run.heart_rate.baseline().unwrap();
    assert_eq!(gt.device, "Polar H10");
    assert_eq!(gt.role, RowRole::Baseline);
    assert!((gt.aggregate.unwrap() - 110.0).abs() < 1e-9);
    assert_eq!(gt.mae, None);

    assert!(run.heart_rate.row("Late Watch").is_none());
    let garmin = run.heart_rate.row("Garmin").unwrap();
    assert!((garmin.mae.unwrap() - 3.0).abs() < 1e-9);
    assert!((garmin.aggregate.unwrap() - 111.666_666).abs() < 1e-4);
    assert!((garmin.variance.unwrap() - 1.67).abs() < 1e-9);

    assert_eq!(run.summary.sport, "Running");
    assert_eq!(run.summary.start_time_label(run.local_offset), "2024-05-01 02:30:00 PM");
}

#[test]
fn distance_and_speed_against_reference() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Apple Watch.gpx", &gpx(11, 10.0));
    write(dir.path(), "Phone.gpx", &gpx(11, 11.0));
    write(dir.path(), "Polar H10.tcx", &tcx("Running", &[120; 11], false));

    let run = compare_folder(dir.path(), &RunConfig::default()).unwrap();

    let reference = run.distance.baseline().unwrap();
    assert_eq!(reference.device, "Ref: (Apple)");
    assert!((reference.aggregate.unwrap() - 0.1).abs() < 1e-3);

    let phone = run.distance.row("Phone").unwrap();
    // the phone drifts 1 m further every second: 0..=10 m, mean 5
    assert!((phone.mae.unwrap() - 5.0).abs() < 0.05);
    assert!((phone.variance.unwrap() - 10.0).abs() < 0.1);
    // no positions on the strap, so no distance row
    assert!(run.distance.row("Polar H10").is_none());

    let devices: Vec<_> = run.speed.iter().map(|r| r.device.as_str()).collect();
    assert_eq!(devices, vec!["Apple Watch", "Phone"]);
    let apple = &run.speed[0];
    // 100 m between the first and last speed reading, 9 s apart
    assert!((apple.average_speed.unwrap() - 40.0).abs() < 0.1);
    assert!(apple.outliers.is_empty());

    // heart rate only comes from TCX here
    assert_eq!(run.heart_rate.rows.len(), 1);
}

#[test]
fn imperial_units_scale_distance_columns() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Apple Watch.gpx", &gpx(11, 10.0));
    write(dir.path(), "Phone.gpx", &gpx(11, 11.0));

    let config = RunConfig::default().with_units(UnitOfMeasure::Imperial);
    let run = compare_folder(dir.path(), &config).unwrap();

    let phone = run.distance.row("Phone").unwrap();
    assert!((phone.mae.unwrap() - 5.0 * 3.28084).abs() < 0.2);
    assert!((phone.aggregate.unwrap() - 0.11 * 0.621371).abs() < 1e-3);
    assert!((run.speed[0].average_speed.unwrap() - 40.0 * 0.621371).abs() < 0.1);
}

#[test]
fn inconsistent_sports_abort_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(dir.path(), "Polar H10.tcx", &tcx("Running", &[100, 110], false));
    write(dir.path(), "Wahoo.tcx", &tcx("Biking", &[100, 110], true));

    let config = RunConfig::default().with_output_dir(out.path());
    match compare_folder(dir.path(), &config) {
        Err(CompareError::InconsistentSport { first, second }) => {
            let mut labels = [first, second];
            labels.sort();
            assert_eq!(labels, ["Biking".to_string(), "Running".to_string()]);
        }
        other => panic!("expected InconsistentSport, got {other:?}"),
    }
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn single_quoted_sport_still_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Polar H10.tcx", &tcx("Running", &[100, 110], false));
    write(
        dir.path(),
        "Wahoo.tcx",
        &tcx("Biking", &[100, 110], true).replace(r#"Sport="Biking""#, "Sport='Biking'"),
    );

    let err = compare_folder(dir.path(), &RunConfig::default()).unwrap_err();
    assert!(matches!(err, CompareError::InconsistentSport { .. }));
}

#[test]
fn gpx_heart_rate_extension_is_compared() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Polar H10.tcx", &tcx("Running", &[100, 110, 120], false));
    let watch = gpx(3, 10.0)
        .replace(
            r#"xmlns="http://www.topografix.com/GPX/1/1">"#,
            r#"xmlns="http://www.topografix.com/GPX/1/1" xmlns:gpxtpx="http://www.garmin.com/xmlschemas/TrackPointExtension/v1">"#,
        )
        .replacen(
            "</time></trkpt>",
            "</time><extensions><gpxtpx:TrackPointExtension><gpxtpx:hr>104</gpxtpx:hr></gpxtpx:TrackPointExtension></extensions></trkpt>",
            1,
        );
    write(dir.path(), "Apple Watch.gpx", &watch);

    let run = compare_folder(dir.path(), &RunConfig::default()).unwrap();
    let apple = run.heart_rate.row("Apple Watch").unwrap();
    // only the first trkpt carries a reading
    assert_eq!(apple.mae, Some(4.0));
    assert_eq!(apple.aggregate, Some(104.0));
}

#[test]
fn unreadable_file_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Polar H10.tcx", &tcx("Running", &[100, 110], false));
    write(dir.path(), "Broken.gpx", "<gpx><trk>");

    let err = compare_folder(dir.path(), &RunConfig::default()).unwrap_err();
    match err {
        CompareError::Parse { file, .. } => assert!(file.ends_with("Broken.gpx")),
        other => panic!("expected Parse, got {other:?}"),
    }
}

#[test]
fn report_is_written_next_to_recordings() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Polar H10.tcx", &tcx("Trail Running", &[100, 110, 120], false));
    write(dir.path(), "Garmin.tcx", &tcx("Trail Running", &[101, 111, 121], true));
    write(dir.path(), "Apple Watch.gpx", &gpx(3, 10.0));

    let run = compare_folder(dir.path(), &RunConfig::default()).unwrap();
    let path = write_report(&run, dir.path(), false).unwrap();

    assert_eq!(path, dir.path().join("Trail_Running_2024-05-01.html"));
    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("Trail Running"));
    assert!(html.contains("Duration: 0m 2s"));
    assert!(!dir.path().join("Trail_Running_2024-05-01.json").exists());
}
