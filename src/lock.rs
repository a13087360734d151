//! Single-instance guard for a run.
//!
//! Folder resolution is list-then-create, so two concurrent runs against the same store
//! could create duplicate sibling folders. A run holds an exclusive lock file under the
//! staging root for its whole duration.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};
use uuid::Uuid;

pub const LOCK_FILE_NAME: &str = ".bulletin-sync.lock";

/// Held for the duration of a run; the lock file is removed on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    run_id: Uuid,
}

impl RunLock {
    /// Create `<base_dir>/.bulletin-sync.lock` exclusively.
    ///
    /// Fails with [`io::ErrorKind::AlreadyExists`] while another run holds the lock. A lock
    /// left behind by a killed process has to be removed by hand.
    pub fn acquire(base_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(base_dir)?;
        let path = base_dir.join(LOCK_FILE_NAME);
        let run_id = Uuid::new_v4();

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!(path = %path.display(), "Run lock already held");
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!(
                        "another run holds {} (remove it if no run is in progress)",
                        path.display()
                    ),
                ));
            }
            Err(e) => return Err(e),
        };
        writeln!(file, "run_id={run_id}\npid={}", std::process::id())?;

        info!(path = %path.display(), %run_id, "Acquired run lock");
        Ok(Self { path, run_id })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => info!(path = %self.path.display(), run_id = %self.run_id, "Released run lock"),
            Err(e) => error!(error = ?e, path = %self.path.display(), "Failed to release run lock"),
        }
    }
}
