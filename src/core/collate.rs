use crate::io::lidar_kml;
use crate::types::{SummaryError, SummaryResult, LIDAR_COLOR, LIDAR_POINT_SKIP};
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

pub const PACKED_ERROR_LOG: &str = "packedErrors.log";
pub const CAMERAS_IN_KML: &str = "cameras_in.kml";
pub const CAMERAS_OUT_KML: &str = "cameras_out.kml";
pub const LIDAR_KML_FOLDER: &str = "lidar";

/// Merges several camera KML files into one
pub trait KmlMerger {
    /// Merge `inputs` into `output`.
    ///
    /// Failures are the merger's own business; nothing is reported back.
    fn merge(&self, output: &Path, inputs: &[PathBuf]);
}

/// Runs an external merge executable as `<tool> <output> <inputs...>`
#[derive(Debug, Clone)]
pub struct CommandKmlMerger {
    tool: PathBuf,
}

impl CommandKmlMerger {
    pub fn new<P: Into<PathBuf>>(tool: P) -> Self {
        Self { tool: tool.into() }
    }
}

impl KmlMerger for CommandKmlMerger {
    fn merge(&self, output: &Path, inputs: &[PathBuf]) {
        log::info!(
            "Running {} {} ({} input files)",
            self.tool.display(),
            output.display(),
            inputs.len()
        );

        match Command::new(&self.tool).arg(output).args(inputs).status() {
            Ok(status) if status.success() => {}
            Ok(status) => log::warn!("{} exited with {}", self.tool.display(), status),
            Err(e) => log::warn!("Failed to launch {}: {}", self.tool.display(), e),
        }
    }
}

/// Copies logs and builds the KML overview files of a run
pub struct KmlCollator<'a> {
    run_folder: PathBuf,
    process_folder: PathBuf,
    output_folder: PathBuf,
    merger: &'a dyn KmlMerger,
}

impl<'a> KmlCollator<'a> {
    pub fn new(
        run_folder: &Path,
        process_folder: &Path,
        output_folder: &Path,
        merger: &'a dyn KmlMerger,
    ) -> Self {
        Self {
            run_folder: run_folder.to_path_buf(),
            process_folder: process_folder.to_path_buf(),
            output_folder: output_folder.to_path_buf(),
            merger,
        }
    }

    /// Copy the packed error log into the output folder, if the run has one.
    ///
    /// Returns whether a copy was made.
    pub fn copy_error_log(&self) -> SummaryResult<bool> {
        let source = self.run_folder.join(PACKED_ERROR_LOG);
        if !source.exists() {
            log::debug!("No packed error log at {}", source.display());
            return Ok(false);
        }

        let destination = self.output_folder.join(PACKED_ERROR_LOG);
        if is_same_file(&source, &destination) {
            log::debug!("Output folder is the run folder, leaving {} alone", source.display());
            return Ok(false);
        }

        std::fs::copy(&source, &destination)?;
        Ok(true)
    }

    /// Copy `cameras_in.kml` and merge every batch `cameras_out.kml`
    pub fn merge_camera_kml(&self) -> SummaryResult<PathBuf> {
        let cameras_in = self.process_folder.join(CAMERAS_IN_KML);
        std::fs::copy(&cameras_in, self.output_folder.join(CAMERAS_IN_KML)).map_err(|e| {
            SummaryError::Processing(format!("Cannot copy {}: {}", cameras_in.display(), e))
        })?;

        log::info!("Merging output camera kml files...");
        let inputs = find_files_named(&self.process_folder, CAMERAS_OUT_KML)?;
        let output = self.output_folder.join(CAMERAS_OUT_KML);
        // Cameras shared by several bundles end up in the merged file more than once
        self.merger.merge(&output, &inputs);

        Ok(output)
    }

    /// Render a KML preview for each lidar file that does not have one yet.
    ///
    /// Previews are never refreshed, even if the lidar data changed since.
    /// Returns the previews written by this call.
    pub fn render_lidar_previews(&self, lidar_files: &[PathBuf]) -> SummaryResult<Vec<PathBuf>> {
        let lidar_output_folder = self.output_folder.join(LIDAR_KML_FOLDER);
        std::fs::create_dir_all(&lidar_output_folder)?;

        let mut written = Vec::new();
        for lidar_file in lidar_files {
            let input = lidar_file.with_extension("csv");
            let mut name = lidar_file
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_default();
            name.push(".kml");
            let output = lidar_output_folder.join(name);

            if output.exists() {
                log::debug!("Keeping existing preview {}", output.display());
                continue;
            }

            lidar_kml::convert(&input, &output, LIDAR_POINT_SKIP, LIDAR_COLOR)?;
            written.push(output);
        }

        Ok(written)
    }
}

/// Every file called `name` below `root`, sorted.
///
/// Symlinks are not followed. Entries that cannot be read are skipped.
pub fn find_files_named(root: &Path, name: &str) -> SummaryResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping unreadable entry below {}: {}", root.display(), e);
                continue;
            }
        };
        if entry.file_type().is_file() && entry.file_name() == name {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
