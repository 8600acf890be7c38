//! Flight summary phases

pub mod browse;
pub mod collate;
pub mod summary;
pub mod tabulate;

// Re-export main types
pub use browse::link_browse_images;
pub use collate::{CommandKmlMerger, KmlCollator, KmlMerger};
pub use summary::{FlightSummary, SummaryReport};
pub use tabulate::{write_reports, BatchTabulator};
