use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Value written to the reports when a statistic could not be obtained
pub const MISSING_VALUE: f64 = -999.0;

/// Smallest frame number a survey run can contain
pub const SMALLEST_FRAME: i64 = 0;

/// Largest frame number a survey run can contain
pub const LARGEST_FRAME: i64 = 99_999_999;

/// Keep one lidar point out of this many when rendering KML previews
pub const LIDAR_POINT_SKIP: usize = 1527;

/// Icon colour used for lidar KML previews
pub const LIDAR_COLOR: &str = "red";

/// Survey site of a flight run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    /// Antarctica
    AN,
    /// Greenland
    GR,
    /// Alaska
    AL,
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Site::AN => write!(f, "AN"),
            Site::GR => write!(f, "GR"),
            Site::AL => write!(f, "AL"),
        }
    }
}

/// Contiguous slice of captured frames, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: i64,
    pub stop: i64,
}

impl FrameRange {
    pub fn new(start: i64, stop: i64) -> Self {
        Self { start, stop }
    }

    /// True when this range lies entirely inside `[start, stop]`.
    ///
    /// A batch that only overlaps the window is rejected.
    pub fn is_within(&self, start: i64, stop: i64) -> bool {
        self.start >= start && self.stop <= stop
    }
}

impl std::fmt::Display for FrameRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.start, self.stop)
    }
}

/// Geographic center and mean elevation of a batch DEM
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCenter {
    pub lon: f64,
    pub lat: f64,
    pub mean_alt: f64,
}

impl GeoCenter {
    /// Values reported for a batch whose DEM could not be geolocated
    pub fn failed() -> Self {
        Self {
            lon: 0.0,
            lat: 0.0,
            mean_alt: MISSING_VALUE,
        }
    }
}

/// Mean of each difference statistic attached to a batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiffMeans {
    pub lidar: f64,
    pub blend: f64,
    pub inter: f64,
    pub fireball: f64,
    pub fireball_lidar: f64,
}

impl Default for DiffMeans {
    fn default() -> Self {
        Self {
            lidar: MISSING_VALUE,
            blend: MISSING_VALUE,
            inter: MISSING_VALUE,
            fireball: MISSING_VALUE,
            fireball_lidar: MISSING_VALUE,
        }
    }
}

/// Everything learned about one in-range batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub frames: FrameRange,
    pub center: GeoCenter,
    pub diffs: DiffMeans,
    /// False when geolocation was skipped or failed
    pub geo_success: bool,
    pub hillshade: PathBuf,
}

/// Run-time options of the summary generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOptions {
    pub output_folder: PathBuf,
    pub skip_kml: bool,
    pub skip_geo: bool,
    pub start_frame: i64,
    pub stop_frame: i64,
    /// Executable used to merge the per-batch camera KML files
    pub merge_tool: PathBuf,
}

impl SummaryOptions {
    pub fn new<P: Into<PathBuf>>(output_folder: P) -> Self {
        Self {
            output_folder: output_folder.into(),
            skip_kml: false,
            skip_geo: false,
            start_frame: SMALLEST_FRAME,
            stop_frame: LARGEST_FRAME,
            merge_tool: PathBuf::from("merge_orbitviz.py"),
        }
    }
}

/// Error types for flight summary generation
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Run layout error: {0}")]
    Layout(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("XML writing error: {0}")]
    Xml(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for flight summary operations
pub type SummaryResult<T> = Result<T, SummaryError>;
