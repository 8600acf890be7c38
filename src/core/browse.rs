use crate::io::make_symlink;
use crate::types::{BatchOutcome, SummaryResult};
use std::path::{Path, PathBuf};

/// Name of the browse link of a batch in the summary folder
pub fn browse_link_name(outcome: &BatchOutcome) -> String {
    format!(
        "dem_{:05}_{:05}_browse.tif",
        outcome.frames.start, outcome.frames.stop
    )
}

/// Link every existing hillshade into `output_folder`.
///
/// Batches without a hillshade are skipped. Returns the links created.
pub fn link_browse_images(
    outcomes: &[BatchOutcome],
    output_folder: &Path,
) -> SummaryResult<Vec<PathBuf>> {
    let mut links = Vec::new();

    for outcome in outcomes {
        if !outcome.hillshade.exists() {
            log::debug!("No hillshade for batch {}", outcome.frames);
            continue;
        }

        let link = output_folder.join(browse_link_name(outcome));
        make_symlink(&outcome.hillshade, &link)?;
        links.push(link);
    }

    log::info!("Linked {} browse images", links.len());
    Ok(links)
}
