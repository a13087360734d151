//! Link discovery: find bulletin download links on a region's listing page.

use std::time::Duration;

use reqwest::Url;
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::contract::{FetchError, Fetcher};

const DOWNLOAD_MARKER: &str = "download";
const BULLETIN_MARKER: &str = "bulletin_download";
const TEXT_TITLE_MARKER: &str = ".txt";

/// Fetch the listing page at `page_url` and return its candidate links in document order.
pub async fn discover_links<F>(
    fetcher: &F,
    page_url: &Url,
    timeout: Duration,
) -> Result<Vec<Url>, FetchError>
where
    F: Fetcher + ?Sized,
{
    let page = fetcher.fetch(page_url, timeout).await?;
    let html = String::from_utf8_lossy(&page.body);
    let links = extract_candidate_links(&html, page_url);
    info!(url = %page_url, count = links.len(), "Extracted candidate links from listing page");
    Ok(links)
}

/// Scan `html` for anchors that look like bulletin downloads.
///
/// An anchor qualifies when its href or title mentions a download marker, or when its
/// title names a `.txt` file. Relative hrefs are resolved against `page_url`; anything
/// that does not resolve to an http(s) URL is dropped. Duplicates are kept.
pub fn extract_candidate_links(html: &str, page_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let title = anchor.value().attr("title").unwrap_or("");
        if !is_candidate(href, title) {
            continue;
        }
        match page_url.join(href.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => links.push(url),
            Ok(url) => debug!(href, scheme = url.scheme(), "Skipping non-http link"),
            Err(e) => debug!(href, error = ?e, "Skipping unresolvable link"),
        }
    }
    links
}

fn is_candidate(href: &str, title: &str) -> bool {
    let href = href.to_lowercase();
    let title = title.to_lowercase();
    let has_marker = |s: &str| s.contains(DOWNLOAD_MARKER) || s.contains(BULLETIN_MARKER);
    has_marker(&href) || has_marker(&title) || title.contains(TEXT_TITLE_MARKER)
}
