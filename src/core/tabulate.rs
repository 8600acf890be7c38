use crate::io::{ArtifactKind, BatchPaths, DiffStats, GeoLocator};
use crate::types::{
    BatchOutcome, DiffMeans, FrameRange, GeoCenter, SummaryError, SummaryResult, MISSING_VALUE,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const BATCH_INFO_FILE: &str = "batchInfoSummary.csv";
pub const FAILED_BATCH_FILE: &str = "failedBatchList.csv";

pub const BATCH_INFO_HEADER: &str = "# startFrame, stopFrame, centerLon, centerLat, meanAlt, \
     meanLidarDiff, meanBlendDiff, meanInterDiff, meanFireDiff, meanFireLidarDiff";
pub const FAILED_BATCH_HEADER: &str = "# startFrame, stopFrame";

/// Collects per-batch quality metrics of a run
pub struct BatchTabulator<'a> {
    locator: &'a dyn GeoLocator,
    start_frame: i64,
    stop_frame: i64,
    skip_geo: bool,
}

impl<'a> BatchTabulator<'a> {
    pub fn new(locator: &'a dyn GeoLocator, start_frame: i64, stop_frame: i64) -> Self {
        Self {
            locator,
            start_frame,
            stop_frame,
            skip_geo: false,
        }
    }

    /// Mark every batch as failed instead of geolocating its DEM
    pub fn with_skip_geo(mut self, skip_geo: bool) -> Self {
        self.skip_geo = skip_geo;
        self
    }

    /// Evaluate every batch fully inside the frame window, in input order
    pub fn tabulate(&self, dems: &[(PathBuf, FrameRange)]) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::new();

        for (dem, frames) in dems {
            if frames.start % 100 == 0 {
                log::info!("Frame: {}", frames.start);
            }

            if !frames.is_within(self.start_frame, self.stop_frame) {
                continue;
            }

            outcomes.push(self.evaluate(&BatchPaths::new(dem, *frames)));
        }

        log::info!(
            "Tabulated {} of {} batches ({} failed geolocation)",
            outcomes.len(),
            dems.len(),
            outcomes.iter().filter(|o| !o.geo_success).count()
        );
        outcomes
    }

    /// Metrics of a single batch; never fails, missing values become sentinels
    pub fn evaluate(&self, batch: &BatchPaths) -> BatchOutcome {
        let diffs = read_diff_means(batch);

        let geo = if self.skip_geo {
            Err(SummaryError::Processing("geo center computation skipped".to_string()))
        } else {
            self.locator.locate(&batch.dem)
        };

        let (center, geo_success) = match geo {
            Ok(center) => (center, true),
            Err(e) => {
                if !self.skip_geo {
                    log::warn!("Could not geolocate batch {}: {}", batch.frames, e);
                }
                (GeoCenter::failed(), false)
            }
        };

        BatchOutcome {
            frames: batch.frames,
            center,
            diffs,
            geo_success,
            hillshade: batch.hillshade(),
        }
    }
}

/// Mean of each difference file, `MISSING_VALUE` where it cannot be read
pub fn read_diff_means(batch: &BatchPaths) -> DiffMeans {
    let mean_of = |kind: ArtifactKind| {
        let path = batch.artifact(kind);
        match DiffStats::read(&path) {
            Ok(stats) => {
                log::debug!(
                    "{:?} statistics for batch {}: mean {}, min {:?}, max {:?}, std dev {:?}",
                    kind,
                    batch.frames,
                    stats.mean,
                    stats.min,
                    stats.max,
                    stats.std_dev
                );
                stats.mean
            }
            Err(e) => {
                log::debug!("No {:?} statistics for batch {}: {}", kind, batch.frames, e);
                MISSING_VALUE
            }
        }
    };

    DiffMeans {
        lidar: mean_of(ArtifactKind::LidarDiff),
        blend: mean_of(ArtifactKind::BlendDiff),
        inter: mean_of(ArtifactKind::InterDiff),
        fireball: mean_of(ArtifactKind::FireballDiff),
        fireball_lidar: mean_of(ArtifactKind::FireballLidarDiff),
    }
}

/// Report row of a batch, fixed-point with six decimals
pub fn format_batch_row(outcome: &BatchOutcome) -> String {
    let values = [
        outcome.center.lon,
        outcome.center.lat,
        outcome.center.mean_alt,
        outcome.diffs.lidar,
        outcome.diffs.blend,
        outcome.diffs.inter,
        outcome.diffs.fireball,
        outcome.diffs.fireball_lidar,
    ];

    let mut row = format!("{}, {}", outcome.frames.start, outcome.frames.stop);
    for value in values {
        row.push_str(", ");
        row.push_str(&format_fixed(value));
    }
    row
}

/// Six-decimal fixed point; non-finite values print as `nan`, `inf` or `-inf`
fn format_fixed(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{:.6}", value)
    }
}

/// Write the batch-info and failed-batch reports into `output_folder`.
///
/// Both files are truncated first. Returns their paths.
pub fn write_reports(
    outcomes: &[BatchOutcome],
    output_folder: &Path,
) -> SummaryResult<(PathBuf, PathBuf)> {
    let batch_info_path = output_folder.join(BATCH_INFO_FILE);
    let failed_batch_path = output_folder.join(FAILED_BATCH_FILE);
    log::info!("Writing statistics to: {}", batch_info_path.display());
    log::info!("Writing failures to: {}", failed_batch_path.display());

    let mut batch_info = BufWriter::new(File::create(&batch_info_path)?);
    let mut failures = BufWriter::new(File::create(&failed_batch_path)?);

    writeln!(batch_info, "{}", BATCH_INFO_HEADER)?;
    writeln!(failures, "{}", FAILED_BATCH_HEADER)?;

    for outcome in outcomes {
        if !outcome.geo_success {
            writeln!(failures, "{}", outcome.frames)?;
        }
        writeln!(batch_info, "{}", format_batch_row(outcome))?;
    }

    batch_info.flush()?;
    failures.flush()?;
    Ok((batch_info_path, failed_batch_path))
}
