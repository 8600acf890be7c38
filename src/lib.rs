//! flight-summary: review folders for processed aerial survey runs
//!
//! Collects the error log, camera and lidar KML overviews, per-batch quality
//! metrics and hillshade browse links of a processed flight run into one
//! folder a human can look through.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    BatchOutcome, DiffMeans, FrameRange, GeoCenter, Site, SummaryError, SummaryOptions,
    SummaryResult,
};

pub use crate::io::{FlightRun, GdalGeoLocator, GeoLocator};
pub use crate::core::{CommandKmlMerger, FlightSummary, KmlMerger, SummaryReport};
