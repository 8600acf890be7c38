//! I/O modules for reading flight runs, DEMs, difference statistics and lidar

pub mod batch;
pub mod dem;
pub mod diff_stats;
pub mod lidar_kml;
pub mod links;
pub mod run;

pub use batch::{ArtifactKind, BatchPaths};
pub use dem::{GdalGeoLocator, GeoLocator};
pub use diff_stats::DiffStats;
pub use links::make_symlink;
pub use run::FlightRun;
