//! Post-run cleanup of the date-scoped staging directory.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info};

/// Remove `date_dir` when no staged file is left anywhere beneath it.
///
/// Empty region directories do not count as content. Returns `true` when the directory was
/// removed, `false` when it is missing or still holds files (e.g. kept after an upload failure).
pub fn prune_empty_date_dir(date_dir: &Path) -> io::Result<bool> {
    if !date_dir.is_dir() {
        debug!(path = %date_dir.display(), "Date directory absent, nothing to prune");
        return Ok(false);
    }
    if contains_files(date_dir)? {
        debug!(path = %date_dir.display(), "Date directory still holds files, keeping it");
        return Ok(false);
    }
    fs::remove_dir_all(date_dir)?;
    info!(path = %date_dir.display(), "Removed empty date directory");
    Ok(true)
}

fn contains_files(dir: &Path) -> io::Result<bool> {
    for entry_res in fs::read_dir(dir)? {
        let path = entry_res?.path();
        if path.is_dir() {
            if contains_files(&path)? {
                return Ok(true);
            }
        } else {
            return Ok(true);
        }
    }
    Ok(false)
}
