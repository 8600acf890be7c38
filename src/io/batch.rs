use crate::io::run::DEM_FILE_NAME;
use crate::types::FrameRange;
use std::path::{Path, PathBuf};

/// Files written next to a batch DEM by the upstream pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// DEM minus lidar
    LidarDiff,
    /// Blended DEM minus lidar
    BlendDiff,
    /// Difference between overlapping batches
    InterDiff,
    /// DEM minus fireball DEM
    FireballDiff,
    /// Fireball DEM minus lidar
    FireballLidarDiff,
    /// Hillshade browse image
    Hillshade,
}

impl ArtifactKind {
    /// Suffix that replaces `out-align-DEM.tif` in the DEM path
    pub fn suffix(&self) -> &'static str {
        match self {
            ArtifactKind::LidarDiff => "out-diff.csv",
            ArtifactKind::BlendDiff => "out-blend-DEM-diff.csv",
            ArtifactKind::InterDiff => "out_inter_diff_summary.csv",
            ArtifactKind::FireballDiff => "out_fireball_diff_summary.csv",
            ArtifactKind::FireballLidarDiff => "out_fireLidar_diff_summary.csv",
            ArtifactKind::Hillshade => "out-DEM_HILLSHADE_browse.tif",
        }
    }
}

/// A batch DEM and the naming convention of its sibling files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPaths {
    pub frames: FrameRange,
    pub dem: PathBuf,
}

impl BatchPaths {
    pub fn new<P: AsRef<Path>>(dem: P, frames: FrameRange) -> Self {
        Self {
            frames,
            dem: dem.as_ref().to_path_buf(),
        }
    }

    /// Path of a sibling artifact.
    ///
    /// Only the file name is rewritten; a DEM whose name does not end in
    /// `out-align-DEM.tif` keeps its name with the suffix appended.
    pub fn artifact(&self, kind: ArtifactKind) -> PathBuf {
        let name = self
            .dem
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let prefix = name.strip_suffix(DEM_FILE_NAME).unwrap_or(&name);
        self.dem.with_file_name(format!("{}{}", prefix, kind.suffix()))
    }

    pub fn hillshade(&self) -> PathBuf {
        self.artifact(ArtifactKind::Hillshade)
    }
}
