use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_ROOT_LABEL: &str = "气象数据";
pub const DEFAULT_PROXY: &str = "http://127.0.0.1:7890";
pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com";
pub const DEFAULT_DRIVE_TIMEOUT_SECS: u64 = 60;

/// Everything one run needs: where to stage files, what to scrape, how to reach the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Local staging root; the log file and the lock file live directly under it.
    pub base_dir: PathBuf,
    /// Top-level folder name, both locally and in the cloud store.
    pub root_label: String,
    pub log_file: String,
    /// Proxy for all outbound HTTP(S). `None` connects directly.
    pub proxy: Option<String>,
    pub page_timeout_secs: u64,
    pub file_timeout_secs: u64,
    pub regions: Vec<Region>,
    pub drive: DriveConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("downloads"),
            root_label: DEFAULT_ROOT_LABEL.to_string(),
            log_file: "download_log.txt".to_string(),
            proxy: Some(DEFAULT_PROXY.to_string()),
            page_timeout_secs: 30,
            file_timeout_secs: 60,
            regions: default_regions(),
            drive: DriveConfig::default(),
        }
    }
}

impl SyncConfig {
    pub fn log_path(&self) -> PathBuf {
        self.base_dir.join(&self.log_file)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn file_timeout(&self) -> Duration {
        Duration::from_secs(self.file_timeout_secs)
    }

    pub fn trace_loaded(&self) {
        info!(
            base_dir = %self.base_dir.display(),
            root_label = %self.root_label,
            regions_count = self.regions.len(),
            proxy = self.proxy.as_deref().unwrap_or("<none>"),
            "Loaded SyncConfig"
        );
        for region in &self.regions {
            region.trace_loaded();
        }
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}

/// A named broadcast area and the page listing its bulletins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub label: String,
    pub url: String,
}

impl Region {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }

    pub fn trace_loaded(&self) {
        info!(region = %self.label, url = %self.url, "Loaded region");
    }
}

pub fn default_regions() -> Vec<Region> {
    vec![
        Region::new(
            "IX_Pakistan",
            "https://wwmiws.wmo.int/index.php/metareas/display/9",
        ),
        Region::new(
            "VIII_N_India",
            "https://wwmiws.wmo.int/index.php/metareas/display/8N",
        ),
        Region::new(
            "VIII_S_Mauritius_LaReunion",
            "https://wwmiws.wmo.int/index.php/metareas/display/8S",
        ),
    ]
}

/// Where the pre-issued credential lives and which API hosts to talk to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub token_path: PathBuf,
    pub api_base: String,
    /// Bound on each Drive call, token refresh and each upload request included.
    pub timeout_secs: u64,
}

impl DriveConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from("token.json"),
            api_base: DEFAULT_DRIVE_API_BASE.to_string(),
            timeout_secs: DEFAULT_DRIVE_TIMEOUT_SECS,
        }
    }
}
