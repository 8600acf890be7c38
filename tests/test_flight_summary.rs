#![cfg(unix)]

use approx::assert_relative_eq;
use flight_summary::core::collate::{CAMERAS_IN_KML, CAMERAS_OUT_KML, PACKED_ERROR_LOG};
use flight_summary::core::tabulate::{BATCH_INFO_FILE, FAILED_BATCH_FILE};
use flight_summary::{
    FlightRun, FlightSummary, GeoCenter, GeoLocator, KmlMerger, Site, SummaryError,
    SummaryOptions, SummaryResult,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MISSING_ROW_TAIL: &str =
    "0.000000, 0.000000, -999.000000, -999.000000, -999.000000, -999.000000, -999.000000, -999.000000";

/// Fails for every DEM whose path contains one of the given batch names
struct ScriptedLocator {
    failing: Vec<&'static str>,
    calls: RefCell<Vec<PathBuf>>,
}

impl ScriptedLocator {
    fn failing(failing: Vec<&'static str>) -> Self {
        Self {
            failing,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl GeoLocator for ScriptedLocator {
    fn locate(&self, dem: &Path) -> SummaryResult<GeoCenter> {
        self.calls.borrow_mut().push(dem.to_path_buf());
        let text = dem.to_string_lossy();
        if self.failing.iter().any(|name| text.contains(name)) {
            return Err(SummaryError::Processing("no projection".to_string()));
        }
        Ok(GeoCenter {
            lon: -49.5,
            lat: 69.25,
            mean_alt: 812.125,
        })
    }
}

#[derive(Default)]
struct RecordingMerger {
    calls: RefCell<Vec<(PathBuf, Vec<PathBuf>)>>,
}

impl KmlMerger for RecordingMerger {
    fn merge(&self, output: &Path, inputs: &[PathBuf]) {
        std::fs::write(output, b"<kml/>").unwrap();
        self.calls
            .borrow_mut()
            .push((output.to_path_buf(), inputs.to_vec()));
    }
}

/// Synthetic run `GR_20110504` with three batches:
/// - 100..199: every diff file, a hillshade and a camera kml
/// - 200..299: nothing at all
/// - 300..399: only a lidar diff
struct TestRun {
    _temp_dir: TempDir,
    run: FlightRun,
    root: PathBuf,
}

fn diff_header(mean: f64) -> String {
    format!(
        "# Max difference: 9.0\n# Min difference: -9.0\n# Mean difference: {}\n# StdDev of difference: 1.0\n-49.1, 69.2, 0.3\n",
        mean
    )
}

fn build_run() -> TestRun {
    let _ = env_logger::builder().is_test(true).try_init();

    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    let run = FlightRun::new(Site::GR, "20110504", &root);
    let processed = run.process_folder();

    let batch1 = processed.join("batch_100_199_0");
    std::fs::create_dir_all(batch1.join("bundle")).unwrap();
    std::fs::write(batch1.join("out-diff.csv"), diff_header(0.5)).unwrap();
    std::fs::write(batch1.join("out-blend-DEM-diff.csv"), diff_header(0.25)).unwrap();
    std::fs::write(batch1.join("out_inter_diff_summary.csv"), diff_header(-1.5)).unwrap();
    std::fs::write(batch1.join("out_fireball_diff_summary.csv"), diff_header(2.0)).unwrap();
    std::fs::write(batch1.join("out_fireLidar_diff_summary.csv"), diff_header(3.125)).unwrap();
    std::fs::write(batch1.join("out-DEM_HILLSHADE_browse.tif"), b"hillshade").unwrap();
    std::fs::write(batch1.join("bundle").join(CAMERAS_OUT_KML), b"<kml/>").unwrap();

    std::fs::create_dir_all(processed.join("batch_200_299_1")).unwrap();

    let batch3 = processed.join("batch_300_399_2");
    std::fs::create_dir_all(&batch3).unwrap();
    std::fs::write(batch3.join("out-diff.csv"), diff_header(7.0)).unwrap();
    // Left behind by a cleaned-up rerun; must not break the cameras_out search
    std::os::unix::fs::symlink(batch3.join("removed.tif"), batch3.join("stale-DEM.tif")).unwrap();

    std::fs::write(processed.join(CAMERAS_IN_KML), b"<kml/>").unwrap();
    std::fs::write(run.folder().join(PACKED_ERROR_LOG), b"batch_200_299_1 failed\n").unwrap();

    let lidar = run.lidar_folder();
    std::fs::create_dir_all(&lidar).unwrap();
    std::fs::write(lidar.join("ILATM1B_20110504_1.qi"), b"binary").unwrap();
    let mut csv = String::from("# latitude,longitude,height\n");
    for i in 0..3000 {
        csv.push_str(&format!("69.{:04}, -49.{:04}, 100.0\n", i, i));
    }
    std::fs::write(lidar.join("ILATM1B_20110504_1.csv"), csv).unwrap();

    TestRun {
        _temp_dir: temp_dir,
        run,
        root,
    }
}

fn options_for(root: &Path, name: &str) -> SummaryOptions {
    SummaryOptions::new(root.join(name))
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_full_summary_with_failed_batch() {
    let test_run = build_run();
    let mut options = options_for(&test_run.root, "summary");
    options.start_frame = 100;
    options.stop_frame = 299;

    let locator = ScriptedLocator::failing(vec!["batch_200_299"]);
    let merger = RecordingMerger::default();
    let report = FlightSummary::new(&test_run.run, &options, &locator, &merger)
        .generate()
        .unwrap();

    let out = &options.output_folder;
    let info = read_lines(&out.join(BATCH_INFO_FILE));
    assert_eq!(info.len(), 3);
    assert_eq!(
        info[1],
        "100, 199, -49.500000, 69.250000, 812.125000, 0.500000, 0.250000, -1.500000, 2.000000, 3.125000"
    );
    assert_eq!(info[2], format!("200, 299, {}", MISSING_ROW_TAIL));

    let failures = read_lines(&out.join(FAILED_BATCH_FILE));
    assert_eq!(failures, vec!["# startFrame, stopFrame", "200, 299"]);

    assert_eq!(report.batches_reported, 2);
    assert_eq!(report.batches_failed, 1);
    assert!(report.error_log_copied);
    assert!(out.join(PACKED_ERROR_LOG).exists());

    // Batch 300..399 lies outside the window and is never geolocated
    assert_eq!(locator.calls.borrow().len(), 2);
}

#[test]
fn test_out_of_window_batches_are_absent() {
    let test_run = build_run();
    let mut options = options_for(&test_run.root, "summary");
    options.start_frame = 150;
    options.stop_frame = 399;
    options.skip_kml = true;

    let locator = ScriptedLocator::failing(vec![]);
    let merger = RecordingMerger::default();
    FlightSummary::new(&test_run.run, &options, &locator, &merger)
        .generate()
        .unwrap();

    let info = read_lines(&options.output_folder.join(BATCH_INFO_FILE));
    let frames: Vec<&str> = info[1..]
        .iter()
        .map(|line| &line[..line.find(", ").unwrap()])
        .collect();
    assert_eq!(frames, vec!["200", "300"]);

    let failures = read_lines(&options.output_folder.join(FAILED_BATCH_FILE));
    assert_eq!(failures.len(), 1);
}

#[test]
fn test_missing_diff_files_do_not_fail_batch() {
    let test_run = build_run();
    let mut options = options_for(&test_run.root, "summary");
    options.start_frame = 300;
    options.skip_kml = true;

    let locator = ScriptedLocator::failing(vec![]);
    let merger = RecordingMerger::default();
    FlightSummary::new(&test_run.run, &options, &locator, &merger)
        .generate()
        .unwrap();

    let info = read_lines(&options.output_folder.join(BATCH_INFO_FILE));
    assert_eq!(
        info[1],
        "300, 399, -49.500000, 69.250000, 812.125000, 7.000000, -999.000000, -999.000000, -999.000000, -999.000000"
    );
    let failures = read_lines(&options.output_folder.join(FAILED_BATCH_FILE));
    assert_eq!(failures, vec!["# startFrame, stopFrame"]);
}

#[test]
fn test_skip_geo_center_fails_every_batch() {
    let test_run = build_run();
    let mut options = options_for(&test_run.root, "summary");
    options.skip_geo = true;
    options.skip_kml = true;

    let locator = ScriptedLocator::failing(vec![]);
    let merger = RecordingMerger::default();
    let report = FlightSummary::new(&test_run.run, &options, &locator, &merger)
        .generate()
        .unwrap();

    assert!(locator.calls.borrow().is_empty());
    assert_eq!(report.batches_failed, 3);

    let info = read_lines(&options.output_folder.join(BATCH_INFO_FILE));
    for line in &info[1..] {
        let fields: Vec<&str> = line.split(", ").collect();
        assert_eq!(&fields[2..5], &["0.000000", "0.000000", "-999.000000"]);
    }
    let failures = read_lines(&options.output_folder.join(FAILED_BATCH_FILE));
    assert_eq!(
        failures,
        vec!["# startFrame, stopFrame", "100, 199", "200, 299", "300, 399"]
    );
}

#[test]
fn test_skip_kml_leaves_kml_outputs_alone() {
    let test_run = build_run();
    let locator = ScriptedLocator::failing(vec!["batch_200_299"]);

    let full = options_for(&test_run.root, "full");
    let full_merger = RecordingMerger::default();
    let full_report = FlightSummary::new(&test_run.run, &full, &locator, &full_merger)
        .generate()
        .unwrap();

    let mut skipped = options_for(&test_run.root, "skipped");
    skipped.skip_kml = true;
    let skip_merger = RecordingMerger::default();
    let skip_report = FlightSummary::new(&test_run.run, &skipped, &locator, &skip_merger)
        .generate()
        .unwrap();

    let full_out = &full.output_folder;
    assert!(full_out.join(CAMERAS_IN_KML).exists());
    assert!(full_out.join(CAMERAS_OUT_KML).exists());
    assert_eq!(full_report.lidar_previews_written.len(), 1);
    assert_eq!(full_merger.calls.borrow()[0].1.len(), 1);

    let skip_out = &skipped.output_folder;
    assert!(!skip_out.join(CAMERAS_IN_KML).exists());
    assert!(!skip_out.join(CAMERAS_OUT_KML).exists());
    assert!(!skip_out.join("lidar").exists());
    assert!(skip_merger.calls.borrow().is_empty());
    assert!(skip_report.merged_camera_kml.is_none());

    for name in [BATCH_INFO_FILE, FAILED_BATCH_FILE] {
        assert_eq!(
            std::fs::read_to_string(full_out.join(name)).unwrap(),
            std::fs::read_to_string(skip_out.join(name)).unwrap()
        );
    }
}

#[test]
fn test_lidar_previews_are_not_regenerated() {
    let test_run = build_run();
    let options = options_for(&test_run.root, "summary");
    let locator = ScriptedLocator::failing(vec![]);
    let merger = RecordingMerger::default();

    let first = FlightSummary::new(&test_run.run, &options, &locator, &merger)
        .generate()
        .unwrap();
    let preview = options
        .output_folder
        .join("lidar")
        .join("ILATM1B_20110504_1.qi.kml");
    assert_eq!(first.lidar_previews_written, vec![preview.clone()]);

    // 3000 points with a stride of 1527 keeps points 0 and 1527
    let kml = std::fs::read_to_string(&preview).unwrap();
    assert_eq!(kml.matches("<Placemark>").count(), 2);
    assert!(kml.contains("<coordinates>-49.1527,69.1527,100</coordinates>"));

    // A newer lidar file does not refresh the cached preview
    let lidar_csv = test_run.run.lidar_folder().join("ILATM1B_20110504_1.csv");
    std::fs::write(&lidar_csv, "70.0, -50.0, 5.0\n").unwrap();

    let second = FlightSummary::new(&test_run.run, &options, &locator, &merger)
        .generate()
        .unwrap();
    assert!(second.lidar_previews_written.is_empty());
    assert_eq!(std::fs::read_to_string(&preview).unwrap(), kml);
}

#[test]
fn test_browse_links_point_at_hillshades() {
    let test_run = build_run();
    let mut options = options_for(&test_run.root, "summary");
    options.skip_kml = true;

    let locator = ScriptedLocator::failing(vec!["batch_100_199"]);
    let merger = RecordingMerger::default();
    let report = FlightSummary::new(&test_run.run, &options, &locator, &merger)
        .generate()
        .unwrap();

    let link = options.output_folder.join("dem_00100_00199_browse.tif");
    assert_eq!(report.browse_links, vec![link.clone()]);
    assert_eq!(std::fs::read(&link).unwrap(), b"hillshade");

    // A rerun replaces the existing link instead of failing
    FlightSummary::new(&test_run.run, &options, &locator, &merger)
        .generate()
        .unwrap();
    assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
}

#[test]
fn test_missing_run_folder_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let run = FlightRun::new(Site::AN, "20091016", temp_dir.path());
    let mut options = SummaryOptions::new(temp_dir.path().join("summary"));
    options.skip_kml = true;

    let locator = ScriptedLocator::failing(vec![]);
    let merger = RecordingMerger::default();
    let result = FlightSummary::new(&run, &options, &locator, &merger).generate();
    assert!(result.is_err());
}

#[test]
fn test_reports_are_truncated_on_rerun() {
    let test_run = build_run();
    let options = options_for(&test_run.root, "summary");
    std::fs::create_dir_all(&options.output_folder).unwrap();
    std::fs::write(
        options.output_folder.join(FAILED_BATCH_FILE),
        "# stale\n1, 2\n3, 4\n5, 6\n7, 8\n",
    )
    .unwrap();

    let locator = ScriptedLocator::failing(vec![]);
    let merger = RecordingMerger::default();
    let report = FlightSummary::new(&test_run.run, &options, &locator, &merger)
        .generate()
        .unwrap();

    let failures = read_lines(&report.failed_batch_path);
    assert_eq!(failures, vec!["# startFrame, stopFrame"]);

    let info = read_lines(&report.batch_info_path);
    let mean_alt: f64 = info[1].split(", ").nth(4).unwrap().parse().unwrap();
    assert_relative_eq!(mean_alt, 812.125);
}
