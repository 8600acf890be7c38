use crate::types::SummaryResult;
use std::path::Path;

/// Point `link` at the absolute path of `target`, replacing whatever is there
pub fn make_symlink<P: AsRef<Path>, Q: AsRef<Path>>(target: P, link: Q) -> SummaryResult<()> {
    let link = link.as_ref();
    let target = std::path::absolute(target.as_ref())?;

    // symlink_metadata also sees dangling links
    if std::fs::symlink_metadata(link).is_ok() {
        std::fs::remove_file(link)?;
    }

    #[cfg(unix)]
    std::os::unix::fs::symlink(&target, link)?;
    #[cfg(windows)]
    std::os::windows::fs::symlink_file(&target, link)?;

    log::debug!("Linked {} -> {}", link.display(), target.display());
    Ok(())
}
