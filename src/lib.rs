#![doc = "bulletin-sync: scrape METAREA bulletin pages and mirror the files into cloud storage."]

//! The pipeline for one run lives in [`synchronise`]; the network sits behind the traits in
//! [`contract`], with reqwest/Drive implementations in [`http`] and [`drive`].

pub mod cleanup;
pub mod cli;
pub mod config;
pub mod contract;
pub mod discover;
pub mod download;
pub mod drive;
pub mod http;
pub mod load_config;
pub mod lock;
pub mod resolve;
pub mod run_log;
pub mod store;
pub mod synchronise;
pub mod upload;

pub use cli::{run, Cli, Commands};
