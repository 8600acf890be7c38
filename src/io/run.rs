use crate::types::{FrameRange, Site, SummaryError, SummaryResult};
use regex::Regex;
use std::path::{Path, PathBuf};

/// File name of the aligned DEM written into every batch folder
pub const DEM_FILE_NAME: &str = "out-align-DEM.tif";

/// Extensions of raw lidar files; each has a `.csv` conversion next to it
const LIDAR_EXTENSIONS: [&str; 4] = ["qi", "hdf5", "h5", "TXT"];

/// Folder layout of one processed flight run.
///
/// The upstream pipeline writes everything below `<parent>/<SITE>_<YYYYMMDD>`:
/// raw lidar files in `lidar/` and one `batch_<start>_<stop>_<n>` folder per
/// processing batch in `processed/`.
#[derive(Debug, Clone)]
pub struct FlightRun {
    site: Site,
    yyyymmdd: String,
    parent_folder: PathBuf,
}

impl FlightRun {
    pub fn new<P: AsRef<Path>>(site: Site, yyyymmdd: &str, parent_folder: P) -> Self {
        Self {
            site,
            yyyymmdd: yyyymmdd.to_string(),
            parent_folder: parent_folder.as_ref().to_path_buf(),
        }
    }

    /// Top level folder of the run
    pub fn folder(&self) -> PathBuf {
        self.parent_folder
            .join(default_output_folder(self.site, &self.yyyymmdd))
    }

    /// Folder holding the per-batch processing output
    pub fn process_folder(&self) -> PathBuf {
        self.folder().join("processed")
    }

    pub fn lidar_folder(&self) -> PathBuf {
        self.folder().join("lidar")
    }

    /// Raw lidar source files of the run, sorted by name
    pub fn lidar_files(&self) -> SummaryResult<Vec<PathBuf>> {
        let folder = self.lidar_folder();
        let entries = std::fs::read_dir(&folder).map_err(|e| {
            SummaryError::Layout(format!(
                "Cannot list lidar folder {}: {}",
                folder.display(),
                e
            ))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_lidar = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| LIDAR_EXTENSIONS.contains(&ext));
            if is_lidar {
                files.push(path);
            }
        }
        files.sort();

        log::debug!("Found {} lidar files in {}", files.len(), folder.display());
        Ok(files)
    }

    /// Output DEM of every batch folder together with its frame range.
    ///
    /// The DEM path is returned whether or not the batch managed to write it.
    /// Entries are ordered by frame range.
    pub fn output_dem_list(&self) -> SummaryResult<Vec<(PathBuf, FrameRange)>> {
        let folder = self.process_folder();
        let entries = std::fs::read_dir(&folder).map_err(|e| {
            SummaryError::Layout(format!(
                "Cannot list processing folder {}: {}",
                folder.display(),
                e
            ))
        })?;

        let batch_pattern = Regex::new(r"^batch_(\d+)_(\d+)(_.*)?$")
            .map_err(|e| SummaryError::Processing(format!("Invalid batch pattern: {}", e)))?;

        let mut dems = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            if let Some(frames) = parse_batch_name(&batch_pattern, name) {
                dems.push((path.join(DEM_FILE_NAME), frames));
            }
        }
        dems.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        log::debug!("Found {} batch folders in {}", dems.len(), folder.display());
        Ok(dems)
    }
}

/// Default folder name for a run, e.g. `AN_20091016`
pub fn default_output_folder(site: Site, yyyymmdd: &str) -> String {
    format!("{}_{}", site, yyyymmdd)
}

fn parse_batch_name(pattern: &Regex, name: &str) -> Option<FrameRange> {
    let caps = pattern.captures(name)?;
    let start = caps.get(1)?.as_str().parse().ok()?;
    let stop = caps.get(2)?.as_str().parse().ok()?;
    Some(FrameRange::new(start, stop))
}
