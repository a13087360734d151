use crate::drive::{describe_token_path, DriveClient};
use crate::http::{build_http_client, HttpFetcher};
use crate::load_config::load_config;
use crate::lock::RunLock;
use crate::synchronise::synchronise;
use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI for bulletin-sync: mirror METAREA bulletins into a dated Drive folder tree.
#[derive(Parser)]
#[clap(
    name = "bulletin-sync",
    version,
    about = "Download METAREA bulletin files and mirror them into Google Drive"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one scrape-and-mirror pass over all configured regions
    Sync {
        /// Path to an optional YAML config file; built-in defaults are used without it
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
///
/// Only setup failures (config, credentials, run lock) surface as errors. Once the pipeline
/// starts, every failure is logged and the run still ends with `Ok`.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sync { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "sync", "Starting synchronisation process");

            let lock = RunLock::acquire(&config.base_dir).with_context(|| {
                format!("Cannot acquire run lock in {}", config.base_dir.display())
            })?;

            let http = build_http_client(config.proxy.as_deref())
                .context("Failed to build HTTP client")?;
            let fetcher = HttpFetcher::new(http.clone());
            let drive = DriveClient::connect(&config.drive, http)
                .await
                .map_err(|e| {
                    anyhow::anyhow!(
                        "Failed to authenticate with Drive using {}: {e}",
                        describe_token_path(&config.drive).display()
                    )
                })?;

            let run_date = Local::now().date_naive();
            println!("Synchronise starting for {run_date}...");
            let report = synchronise(&config, run_date, &fetcher, &drive).await;
            println!("Synchronise complete.\nReport:");
            println!("{:#?}", report);
            tracing::info!(
                command = "sync",
                run_id = %lock.run_id(),
                uploaded = report.uploaded_count(),
                "Synchronisation complete"
            );
            drop(lock);
            Ok(())
        }
    }
}
