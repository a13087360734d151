//! reqwest-backed [`Fetcher`] and the shared client builder.
//!
//! The proxy is handed to the client explicitly; the process environment is left alone.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, Proxy, Url};
use tracing::{debug, error, info};

use crate::contract::{FetchError, FetchedResource, Fetcher};

/// Upper bound on establishing a TCP (and TLS) connection, for every request of the run.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a client that routes every request through `proxy` when one is given and
/// connects directly otherwise. Whole-request timeouts are set per call.
pub fn build_http_client(proxy: Option<&str>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT);
    builder = match proxy {
        Some(proxy_url) => {
            info!(proxy = proxy_url, "Routing outbound HTTP through proxy");
            builder.proxy(Proxy::all(proxy_url)?)
        }
        None => builder.no_proxy(),
    };
    builder.build()
}

/// Plain GETs over a shared [`Client`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedResource, FetchError> {
        debug!(url = %url, timeout_secs = timeout.as_secs(), "GET");
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url = %url, "Request failed");
                e
            })?;

        let status = response.status();
        let response = response.error_for_status().map_err(|e| {
            error!(status = %status, url = %url, "Server returned error status");
            e
        })?;

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();
        debug!(url = %url, status = %status, size = body.len(), "Fetched resource");

        Ok(FetchedResource {
            content_disposition,
            body,
        })
    }
}
