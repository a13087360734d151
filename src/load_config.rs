/// `load_config` module: reads the optional YAML config file and the environment into a
/// [`SyncConfig`].
///
/// Every key of the YAML document is optional; missing keys fall back to the built-in
/// defaults (the three METAREA regions, `downloads/` as staging root, the local proxy).
/// The credential location may be overridden with `DRIVE_TOKEN_PATH`.
///
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use crate::config::SyncConfig;
use anyhow::{Context, Result};
use reqwest::Url;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const TOKEN_PATH_ENV: &str = "DRIVE_TOKEN_PATH";

/// Loads the YAML config at `path` (or the defaults when `None`) and applies env overrides.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<SyncConfig> {
    let mut config = match path {
        Some(path) => read_config_file(path.as_ref())?,
        None => {
            info!("No config file given, using built-in defaults");
            SyncConfig::default()
        }
    };

    if let Ok(token_path) = std::env::var(TOKEN_PATH_ENV) {
        info!(token_path = %token_path, "DRIVE_TOKEN_PATH found in env, overriding drive.token_path");
        config.drive.token_path = PathBuf::from(token_path);
    }

    validate(&config)?;
    config.trace_loaded();
    Ok(config)
}

fn read_config_file(path_ref: &Path) -> Result<SyncConfig> {
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    match serde_yaml::from_str::<SyncConfig>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

fn validate(config: &SyncConfig) -> Result<()> {
    if config.root_label.trim().is_empty() {
        anyhow::bail!("root_label must not be empty");
    }
    check_path_component("root_label", &config.root_label)?;
    if config.log_file.trim().is_empty() {
        anyhow::bail!("log_file must not be empty");
    }
    for region in &config.regions {
        if region.label.trim().is_empty() {
            anyhow::bail!("region label must not be empty (url: {})", region.url);
        }
        check_path_component("region label", &region.label)?;
        Url::parse(&region.url)
            .with_context(|| format!("Invalid url for region {}: {}", region.label, region.url))?;
    }
    if config.page_timeout_secs == 0 || config.file_timeout_secs == 0 || config.drive.timeout_secs == 0 {
        anyhow::bail!("timeouts must be at least one second");
    }
    if let Some(proxy) = &config.proxy {
        reqwest::Proxy::all(proxy.as_str()).with_context(|| format!("Invalid proxy: {proxy}"))?;
    }
    Ok(())
}

/// Labels become single directory names under the staging root.
fn check_path_component(what: &str, label: &str) -> Result<()> {
    let trimmed = label.trim();
    if trimmed == "." || trimmed == ".." || label.contains(['/', '\\']) {
        error!(label, "Label is not a plain directory name");
        anyhow::bail!("{what} {label:?} must be a plain directory name (no '/', '\\', '.' or '..')");
    }
    Ok(())
}
