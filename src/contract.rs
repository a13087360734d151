#![allow(unused)]

//! # contract: seams between the pipeline and the outside world
//!
//! The orchestration in [`crate::synchronise`] only talks to the network through the two
//! traits defined here:
//! - [`Fetcher`] performs plain HTTP GETs (listing pages and bulletin files).
//! - [`DriveStore`] is the folder-and-file API of the cloud store.
//!
//! Both are annotated for `mockall`, so tests can script every remote interaction
//! without a network. The real implementations live in [`crate::http`] and [`crate::drive`].
//!
//! Errors crossing these seams are boxed trait objects; callers log them and move on to
//! the next unit of work.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use mockall::{automock, predicate::*};
use reqwest::Url;

/// Error returned by [`Fetcher`] implementations (network, timeout or HTTP status).
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by [`DriveStore`] implementations (network, auth, quota, bad response).
pub type DriveError = Box<dyn std::error::Error + Send + Sync>;

/// A fetched HTTP resource: the full body plus the headers the pipeline cares about.
#[derive(Debug, Clone, Default)]
pub struct FetchedResource {
    /// Raw `Content-Disposition` header value, if the server sent one.
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedResource {
    pub fn from_body(body: impl Into<Vec<u8>>) -> Self {
        Self {
            content_disposition: None,
            body: body.into(),
        }
    }
}

/// Opaque identifier of a folder in the cloud store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderId(pub String);

impl FolderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FolderId {
    fn from(s: &str) -> Self {
        FolderId(s.to_string())
    }
}

/// A folder as listed or created in the cloud store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFolder {
    pub id: FolderId,
    pub name: String,
}

/// A file created in the cloud store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
}

/// Plain HTTP GET access, bounded by a per-request timeout.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, failing on transport errors, timeouts and non-success statuses.
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedResource, FetchError>;
}

/// Folder-and-file operations of the cloud store.
///
/// Implementors hold an already authenticated session; one instance is shared by every
/// component for the whole run.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DriveStore: Send + Sync {
    /// List non-trashed folders named exactly `name`.
    ///
    /// With `parent == None` the query is not scoped to any parent.
    async fn find_folders(
        &self,
        name: &str,
        parent: Option<FolderId>,
    ) -> Result<Vec<RemoteFolder>, DriveError>;

    /// Create a folder named `name`, nested under `parent` when given.
    async fn create_folder(
        &self,
        name: &str,
        parent: Option<FolderId>,
    ) -> Result<RemoteFolder, DriveError>;

    /// Upload the file at `local_path` under `parent`, keeping its basename as remote name.
    async fn create_file(
        &self,
        local_path: &Path,
        parent: Option<FolderId>,
    ) -> Result<RemoteFile, DriveError>;
}
