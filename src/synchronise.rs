//! High-level pipeline: scrape → stage → mirror → clean up, for every configured region.
//!
//! [`synchronise`] runs one complete batch:
//!   - For each region: fetch the listing page, extract candidate links, download each file
//!     into `<base>/<root>/<date>/<region>/`, resolve the matching remote folder chain,
//!     upload, then delete the staged copy.
//!   - Upload the run log to the store root and delete it locally.
//!   - Remove the date directory when nothing is left in it.
//!
//! A local path is uploaded at most once per run. A link listed twice, or two links that
//! resolve to the same filename, are recorded as [`FileStatus::AlreadyHandled`].
//!
//! # Error Handling
//! Nothing escapes. Every failure is caught at its unit of work (region, file, post-run
//! step), written to the run log, recorded in the [`SynchroniseReport`] and the loop moves
//! on. A run in which every file failed still completes normally.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use reqwest::Url;
use tracing::{error, info, info_span, warn, Instrument};

use crate::cleanup::prune_empty_date_dir;
use crate::config::{Region, SyncConfig};
use crate::contract::{DriveStore, Fetcher};
use crate::discover::discover_links;
use crate::download::{derive_filename, fetch_file, FetchOutcome};
use crate::resolve::resolve_folder_path;
use crate::run_log::RunLogger;
use crate::store::LocalStore;
use crate::upload::upload_file;

/// What one run did.
#[derive(Debug, Default)]
pub struct SynchroniseReport {
    pub run_date: String,
    pub regions: Vec<RegionReport>,
    pub log_upload: StepOutcome,
    pub cleanup: StepOutcome,
}

impl SynchroniseReport {
    pub fn region(&self, label: &str) -> Option<&RegionReport> {
        self.regions.iter().find(|r| r.label == label)
    }

    pub fn uploaded_count(&self) -> usize {
        self.regions
            .iter()
            .flat_map(|r| r.files.iter())
            .filter(|f| matches!(f.status, FileStatus::Uploaded { .. }))
            .count()
    }
}

#[derive(Debug)]
pub struct RegionReport {
    pub label: String,
    pub outcome: RegionOutcome,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionOutcome {
    /// Links were found and each was attempted.
    Processed,
    /// The listing page could not be fetched.
    PageUnavailable(String),
    /// The listing page held no candidate links.
    NoLinks,
    /// The local region directory could not be created.
    StagingFailed(String),
}

#[derive(Debug)]
pub struct FileReport {
    pub url: String,
    pub filename: Option<String>,
    pub status: FileStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Uploaded { remote_id: String },
    AlreadyStaged,
    /// The same local path was already uploaded earlier in this run.
    AlreadyHandled,
    DownloadFailed(String),
    /// Upload (or folder resolution) failed; the staged copy was kept.
    UploadFailed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StepOutcome {
    #[default]
    NotRun,
    Done,
    Skipped,
    Failed(String),
}

/// Run the whole batch for `run_date`. Never fails; see the module docs.
pub async fn synchronise<F, D>(
    config: &SyncConfig,
    run_date: NaiveDate,
    fetcher: &F,
    drive: &D,
) -> SynchroniseReport
where
    F: Fetcher + ?Sized,
    D: DriveStore + ?Sized,
{
    let store = LocalStore::new(&config.base_dir, &config.root_label, run_date);
    let log = RunLogger::new(config.log_path());
    let mut report = SynchroniseReport {
        run_date: store.date_label().to_string(),
        ..Default::default()
    };

    info!(run_date = %store.date_label(), regions = config.regions.len(), "[SYNC] Starting run");
    log.info(format!("=== run started for {} ===", store.date_label()));

    let mut uploaded: HashSet<PathBuf> = HashSet::new();
    for region in &config.regions {
        let span = info_span!("region", region = %region.label);
        let region_report = sync_region(config, &store, &log, region, fetcher, drive, &mut uploaded)
            .instrument(span)
            .await;
        report.regions.push(region_report);
    }

    log.info(format!(
        "=== run finished: {} file(s) uploaded ===",
        report.uploaded_count()
    ));

    report.log_upload = upload_run_log(&log, drive).await;
    report.cleanup = cleanup_date_dir(&store, &log);

    info!(run_date = %report.run_date, uploaded = report.uploaded_count(), "[SYNC] Run complete");
    report
}

async fn sync_region<F, D>(
    config: &SyncConfig,
    store: &LocalStore,
    log: &RunLogger,
    region: &Region,
    fetcher: &F,
    drive: &D,
    uploaded: &mut HashSet<PathBuf>,
) -> RegionReport
where
    F: Fetcher + ?Sized,
    D: DriveStore + ?Sized,
{
    let mut region_report = RegionReport {
        label: region.label.clone(),
        outcome: RegionOutcome::Processed,
        files: Vec::new(),
    };
    log.info(format!("start scraping {}: {}", region.label, region.url));

    let page_url = match Url::parse(&region.url) {
        Ok(url) => url,
        Err(e) => {
            error!(error = ?e, url = %region.url, "[SYNC][ERROR] Invalid listing page url");
            log.error(format!("cannot access {}: {e}", region.url));
            region_report.outcome = RegionOutcome::PageUnavailable(e.to_string());
            return region_report;
        }
    };

    let links = match discover_links(fetcher, &page_url, config.page_timeout()).await {
        Ok(links) => links,
        Err(e) => {
            error!(error = ?e, url = %page_url, "[SYNC][ERROR] Listing page fetch failed");
            log.error(format!("cannot access {page_url}: {e}"));
            region_report.outcome = RegionOutcome::PageUnavailable(e.to_string());
            return region_report;
        }
    };

    if links.is_empty() {
        warn!(url = %page_url, "[SYNC] No download links found");
        log.warn(format!("no download links found for {}", region.label));
        region_report.outcome = RegionOutcome::NoLinks;
        return region_report;
    }

    let region_dir = match store.ensure_region_dir(&region.label) {
        Ok(dir) => dir,
        Err(e) => {
            error!(error = ?e, "[SYNC][ERROR] Failed to create region staging directory");
            log.error(format!(
                "cannot create directory {}: {e}",
                store.region_dir(&region.label).display()
            ));
            region_report.outcome = RegionOutcome::StagingFailed(e.to_string());
            return region_report;
        }
    };

    for link in &links {
        let url_path = region_dir.join(derive_filename(link));
        if uploaded.contains(&url_path) {
            region_report
                .files
                .push(already_handled(log, link, &url_path, None));
            continue;
        }

        let outcome = match fetch_file(fetcher, link, &region_dir, config.file_timeout()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = ?e, url = %link, "[SYNC][ERROR] Download failed");
                log.error(format!("download failed: {link} ({e})"));
                region_report.files.push(FileReport {
                    url: link.to_string(),
                    filename: None,
                    status: FileStatus::DownloadFailed(e.to_string()),
                });
                continue;
            }
        };

        let (filename, path) = match outcome {
            FetchOutcome::Skipped { filename, .. } => {
                info!(file = %filename, "[SYNC] Already staged, skipping");
                log.info(format!("already exists, skipping: {filename}"));
                region_report.files.push(FileReport {
                    url: link.to_string(),
                    filename: Some(filename),
                    status: FileStatus::AlreadyStaged,
                });
                continue;
            }
            FetchOutcome::Saved { filename, path } if uploaded.contains(&path) => {
                if let Err(e) = std::fs::remove_file(&path) {
                    error!(error = ?e, path = %path.display(), "[SYNC][ERROR] Failed to delete repeated download");
                    log.error(format!("failed to delete local copy {}: {e}", path.display()));
                }
                region_report
                    .files
                    .push(already_handled(log, link, &path, Some(filename)));
                continue;
            }
            FetchOutcome::Saved { filename, path } => {
                log.info(format!("download complete: {filename}"));
                (filename, path)
            }
        };

        let remote_path = store.remote_path(&region.label);
        let result = match resolve_folder_path(drive, &remote_path[..]).await {
            Ok(folder_id) => upload_file(drive, &path, Some(folder_id)).await,
            Err(e) => Err(e),
        };

        let status = match result {
            Ok(remote) => {
                log.info(format!("upload complete: {filename} (drive id: {})", remote.id));
                uploaded.insert(path.clone());
                if let Err(e) = std::fs::remove_file(&path) {
                    error!(error = ?e, path = %path.display(), "[SYNC][ERROR] Failed to delete staged copy");
                    log.error(format!("failed to delete local copy {}: {e}", path.display()));
                }
                FileStatus::Uploaded {
                    remote_id: remote.id,
                }
            }
            Err(e) => {
                error!(error = ?e, file = %filename, "[SYNC][ERROR] Upload failed, keeping staged copy");
                log.error(format!("upload failed: {filename} ({e})"));
                FileStatus::UploadFailed(e.to_string())
            }
        };
        region_report.files.push(FileReport {
            url: link.to_string(),
            filename: Some(filename),
            status,
        });
    }

    region_report
}

/// Record a repeat of a path uploaded earlier in the run.
fn already_handled(
    log: &RunLogger,
    link: &Url,
    path: &Path,
    filename: Option<String>,
) -> FileReport {
    let filename = filename.unwrap_or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    info!(file = %filename, url = %link, "[SYNC] Already uploaded this run, skipping");
    log.info(format!("already handled this run, skipping: {filename}"));
    FileReport {
        url: link.to_string(),
        filename: Some(filename),
        status: FileStatus::AlreadyHandled,
    }
}

async fn upload_run_log<D>(log: &RunLogger, drive: &D) -> StepOutcome
where
    D: DriveStore + ?Sized,
{
    if !log.path().is_file() {
        warn!(path = %log.path().display(), "[SYNC] No run log to upload");
        return StepOutcome::Skipped;
    }
    match upload_file(drive, log.path(), None).await {
        Ok(remote) => {
            info!(remote_id = %remote.id, "[SYNC] Run log uploaded");
            match std::fs::remove_file(log.path()) {
                Ok(()) => StepOutcome::Done,
                Err(e) => {
                    error!(error = ?e, "[SYNC][ERROR] Failed to delete uploaded run log");
                    log.error(format!("failed to delete uploaded log: {e}"));
                    StepOutcome::Failed(e.to_string())
                }
            }
        }
        Err(e) => {
            error!(error = ?e, "[SYNC][ERROR] Run log upload failed");
            log.error(format!("log upload failed: {e}"));
            StepOutcome::Failed(e.to_string())
        }
    }
}

fn cleanup_date_dir(store: &LocalStore, log: &RunLogger) -> StepOutcome {
    let date_dir = store.date_dir();
    match prune_empty_date_dir(&date_dir) {
        Ok(true) => StepOutcome::Done,
        Ok(false) => StepOutcome::Skipped,
        Err(e) => {
            error!(error = ?e, path = %date_dir.display(), "[SYNC][ERROR] Cleanup failed");
            log.error(format!("failed to remove directory {}: {e}", date_dir.display()));
            StepOutcome::Failed(e.to_string())
        }
    }
}
