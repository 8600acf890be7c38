use crate::core::browse::link_browse_images;
use crate::core::collate::{KmlCollator, KmlMerger};
use crate::core::tabulate::{write_reports, BatchTabulator};
use crate::io::{FlightRun, GeoLocator};
use crate::types::{SummaryOptions, SummaryResult};
use std::path::PathBuf;

/// What a summary run produced
#[derive(Debug, Clone, Default)]
pub struct SummaryReport {
    pub error_log_copied: bool,
    pub merged_camera_kml: Option<PathBuf>,
    pub lidar_previews_written: Vec<PathBuf>,
    pub batch_info_path: PathBuf,
    pub failed_batch_path: PathBuf,
    pub batches_reported: usize,
    pub batches_failed: usize,
    pub browse_links: Vec<PathBuf>,
}

/// Builds the human-review folder of a processed flight run
pub struct FlightSummary<'a> {
    run: &'a FlightRun,
    options: &'a SummaryOptions,
    locator: &'a dyn GeoLocator,
    merger: &'a dyn KmlMerger,
}

impl<'a> FlightSummary<'a> {
    pub fn new(
        run: &'a FlightRun,
        options: &'a SummaryOptions,
        locator: &'a dyn GeoLocator,
        merger: &'a dyn KmlMerger,
    ) -> Self {
        Self {
            run,
            options,
            locator,
            merger,
        }
    }

    /// Run the collation, tabulation and linking phases in order
    pub fn generate(&self) -> SummaryResult<SummaryReport> {
        let output_folder = &self.options.output_folder;
        log::info!("Generating flight summary in: {}", output_folder.display());
        log::debug!("Options: {:?}", self.options);
        std::fs::create_dir_all(output_folder)?;

        let mut report = SummaryReport::default();

        log::info!("Copying log files...");
        let collator = KmlCollator::new(
            &self.run.folder(),
            &self.run.process_folder(),
            output_folder,
            self.merger,
        );
        report.error_log_copied = collator.copy_error_log()?;

        if !self.options.skip_kml {
            report.merged_camera_kml = Some(collator.merge_camera_kml()?);
            let lidar_files = self.run.lidar_files()?;
            report.lidar_previews_written = collator.render_lidar_previews(&lidar_files)?;
        }

        let dems = self.run.output_dem_list()?;
        let outcomes = BatchTabulator::new(
            self.locator,
            self.options.start_frame,
            self.options.stop_frame,
        )
        .with_skip_geo(self.options.skip_geo)
        .tabulate(&dems);

        let (batch_info_path, failed_batch_path) = write_reports(&outcomes, output_folder)?;
        report.batch_info_path = batch_info_path;
        report.failed_batch_path = failed_batch_path;
        report.batches_reported = outcomes.len();
        report.batches_failed = outcomes.iter().filter(|o| !o.geo_success).count();

        report.browse_links = link_browse_images(&outcomes, output_folder)?;

        log::info!(
            "Finished generating flight summary in folder: {}",
            output_folder.display()
        );
        Ok(report)
    }
}
