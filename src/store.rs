//! Local staging tree: `<base>/<root label>/<run date>/<region label>/<filename>`.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::debug;

/// Formats a run date the way both the local tree and the cloud folders name it.
pub fn date_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// The staging tree of a single run.
#[derive(Debug, Clone)]
pub struct LocalStore {
    base_dir: PathBuf,
    root_label: String,
    date_label: String,
}

impl LocalStore {
    pub fn new(base_dir: impl Into<PathBuf>, root_label: impl Into<String>, run_date: NaiveDate) -> Self {
        Self {
            base_dir: base_dir.into(),
            root_label: root_label.into(),
            date_label: date_label(run_date),
        }
    }

    pub fn date_label(&self) -> &str {
        &self.date_label
    }

    /// `<base>/<root>/<date>`
    pub fn date_dir(&self) -> PathBuf {
        self.base_dir.join(&self.root_label).join(&self.date_label)
    }

    /// `<base>/<root>/<date>/<region>`
    pub fn region_dir(&self, region_label: &str) -> PathBuf {
        self.date_dir().join(region_label)
    }

    /// Create the region directory (and its parents) if missing.
    pub fn ensure_region_dir(&self, region_label: &str) -> io::Result<PathBuf> {
        let dir = self.region_dir(region_label);
        fs::create_dir_all(&dir)?;
        debug!(path = %dir.display(), "Region staging directory ready");
        Ok(dir)
    }

    /// Remote folder names, outermost first, mirroring the local tree for a region.
    pub fn remote_path(&self, region_label: &str) -> [String; 3] {
        [
            self.root_label.clone(),
            self.date_label.clone(),
            region_label.to_string(),
        ]
    }
}
