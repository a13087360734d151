#![doc = "Google Drive v3 implementation of the DriveStore seam."]
//
//! # Drive client
//!
//! [`DriveClient`] talks to the Drive v3 REST API with a bearer token obtained once per run
//! from a pre-issued authorized-user credential file (the `token.json` written by Google's
//! OAuth tooling, scope `drive.file`). No interactive flow happens at runtime.
//!
//! - Folders are listed with an exact-name, non-trashed query, optionally scoped to a parent.
//! - Folders are created with the Drive folder mimetype.
//! - Files go through a resumable upload session: one POST opens the session, one PUT
//!   streams the file body from disk.
//!
//! Every request, the token refresh included, is bounded by the client's timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Body, Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};

use crate::config::{DriveConfig, DEFAULT_DRIVE_TIMEOUT_SECS};
use crate::contract::{DriveError, DriveStore, FolderId, RemoteFile, RemoteFolder};

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Authorized-user credential as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedUser {
    /// Last issued access token, used as-is when no refresh material is present.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl AuthorizedUser {
    pub fn from_file(path: &Path) -> Result<Self, DriveError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to read credential file");
            format!("failed to read credential file {}: {e}", path.display())
        })?;
        let user: AuthorizedUser = serde_json::from_str(&raw).map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to parse credential file");
            format!("failed to parse credential file {}: {e}", path.display())
        })?;
        Ok(user)
    }

    fn refresh_material(&self) -> Option<(&str, &str, &str)> {
        Some((
            self.refresh_token.as_deref()?,
            self.client_id.as_deref()?,
            self.client_secret.as_deref()?,
        ))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
}

/// Quote `value` for use inside a single-quoted Drive query string literal.
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Drive `q` expression selecting non-trashed folders named `name`, under `parent` if given.
pub fn folder_query(name: &str, parent: Option<&FolderId>) -> String {
    let mut q = format!(
        "name='{}' and mimeType='{}' and trashed=false",
        escape_query_value(name),
        FOLDER_MIME_TYPE
    );
    if let Some(parent) = parent {
        q.push_str(&format!(" and '{}' in parents", escape_query_value(parent.as_str())));
    }
    q
}

/// Authenticated Drive v3 session, built once per run.
pub struct DriveClient {
    http: Client,
    api_base: String,
    access_token: String,
    timeout: Duration,
}

impl DriveClient {
    pub fn new(http: Client, api_base: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            timeout: Duration::from_secs(DEFAULT_DRIVE_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read the credential at `config.token_path` and obtain an access token.
    ///
    /// With refresh material present the token is exchanged once at the token endpoint;
    /// otherwise the stored access token is used unchanged.
    pub async fn connect(config: &DriveConfig, http: Client) -> Result<Self, DriveError> {
        let user = AuthorizedUser::from_file(&config.token_path)?;
        let access_token = match user.refresh_material() {
            Some((refresh_token, client_id, client_secret)) => {
                let token_uri = user.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);
                let grant = RefreshGrant {
                    token_uri,
                    refresh_token,
                    client_id,
                    client_secret,
                };
                refresh_access_token(&http, &grant, config.timeout()).await?
            }
            None => user.token.clone().ok_or_else(|| {
                error!(path = %config.token_path.display(), "Credential has neither refresh material nor token");
                format!(
                    "credential {} has neither refresh material nor an access token",
                    config.token_path.display()
                )
            })?,
        };
        info!(
            token_path = %config.token_path.display(),
            api_base = %config.api_base,
            "Initialized DriveClient"
        );
        Ok(Self::new(http, config.api_base.as_str(), access_token).with_timeout(config.timeout()))
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.api_base)
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/drive/v3/files", self.api_base)
    }
}

struct RefreshGrant<'a> {
    token_uri: &'a str,
    refresh_token: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

async fn refresh_access_token(
    http: &Client,
    grant: &RefreshGrant<'_>,
    timeout: Duration,
) -> Result<String, DriveError> {
    debug!(token_uri = grant.token_uri, "Refreshing Drive access token");
    let response = http
        .post(grant.token_uri)
        .timeout(timeout)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", grant.refresh_token),
            ("client_id", grant.client_id),
            ("client_secret", grant.client_secret),
        ])
        .send()
        .await?;
    let response = ensure_success(response, "token refresh").await?;
    let token: TokenResponse = response.json().await?;
    info!("Obtained fresh Drive access token");
    Ok(token.access_token)
}

/// Pass successful responses through; turn anything else into an error carrying the body.
async fn ensure_success(response: Response, operation: &str) -> Result<Response, DriveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
    error!(status = %status, operation, "Drive API returned error. Response body: {text}");
    Err(format!("Drive API error during {operation}: {status}: {text}").into())
}

fn parents_of(parent: &Option<FolderId>) -> Vec<&str> {
    parent.iter().map(FolderId::as_str).collect()
}

#[async_trait]
impl DriveStore for DriveClient {
    async fn find_folders(
        &self,
        name: &str,
        parent: Option<FolderId>,
    ) -> Result<Vec<RemoteFolder>, DriveError> {
        let q = folder_query(name, parent.as_ref());
        debug!(q = %q, "Listing folders");
        let response = self
            .http
            .get(self.files_url())
            .timeout(self.timeout)
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", q.as_str()),
                ("fields", "files(id,name)"),
                ("spaces", "drive"),
            ])
            .send()
            .await?;
        let list: FileList = ensure_success(response, "list folders").await?.json().await?;
        debug!(name, count = list.files.len(), "Listed folders");
        Ok(list
            .files
            .into_iter()
            .map(|f| RemoteFolder {
                id: FolderId(f.id),
                name: f.name,
            })
            .collect())
    }

    async fn create_folder(
        &self,
        name: &str,
        parent: Option<FolderId>,
    ) -> Result<RemoteFolder, DriveError> {
        let mut metadata = json!({ "name": name, "mimeType": FOLDER_MIME_TYPE });
        if parent.is_some() {
            metadata["parents"] = json!(parents_of(&parent));
        }
        let response = self
            .http
            .post(self.files_url())
            .timeout(self.timeout)
            .bearer_auth(&self.access_token)
            .query(&[("fields", "id,name")])
            .json(&metadata)
            .send()
            .await?;
        let created: DriveFile = ensure_success(response, "create folder").await?.json().await?;
        info!(name, id = %created.id, "Created Drive folder");
        Ok(RemoteFolder {
            id: FolderId(created.id),
            name: name.to_string(),
        })
    }

    async fn create_file(
        &self,
        local_path: &Path,
        parent: Option<FolderId>,
    ) -> Result<RemoteFile, DriveError> {
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| format!("path has no file name: {}", local_path.display()))?;
        let size = tokio::fs::metadata(local_path).await?.len();

        let mut metadata = json!({ "name": name });
        if parent.is_some() {
            metadata["parents"] = json!(parents_of(&parent));
        }

        // Open the resumable session.
        let session = self
            .http
            .post(self.upload_url())
            .timeout(self.timeout)
            .bearer_auth(&self.access_token)
            .query(&[("uploadType", "resumable"), ("fields", "id,name")])
            .header("X-Upload-Content-Length", size)
            .json(&metadata)
            .send()
            .await?;
        let session = ensure_success(session, "open upload session").await?;
        let session_url = session
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or("upload session response carried no Location header")?;
        debug!(path = %local_path.display(), size, "Opened resumable upload session");

        let file = tokio::fs::File::open(local_path).await?;
        let response = self
            .http
            .put(session_url)
            .timeout(self.timeout)
            .bearer_auth(&self.access_token)
            .header(CONTENT_LENGTH, size)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(Body::from(file))
            .send()
            .await?;
        let uploaded: DriveFile = ensure_success(response, "upload file").await?.json().await?;
        info!(name = %name, id = %uploaded.id, size, "Uploaded file to Drive");
        Ok(RemoteFile {
            id: uploaded.id,
            name: if uploaded.name.is_empty() { name } else { uploaded.name },
        })
    }
}

/// Credential location resolved relative to the working directory, for diagnostics.
pub fn describe_token_path(config: &DriveConfig) -> PathBuf {
    std::env::current_dir()
        .map(|cwd| cwd.join(&config.token_path))
        .unwrap_or_else(|_| config.token_path.clone())
}
