//! File fetcher: download one candidate link into a region's staging directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::Url;
use tracing::{debug, info};

use crate::contract::{FetchError, Fetcher};

/// Name used when a URL has no usable path segment.
pub const FALLBACK_FILENAME: &str = "download";

/// What happened to one candidate link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The body was written to `path`.
    Saved { filename: String, path: PathBuf },
    /// A file with the derived name was already staged; nothing was written.
    Skipped { filename: String, path: PathBuf },
}

impl FetchOutcome {
    pub fn filename(&self) -> &str {
        match self {
            FetchOutcome::Saved { filename, .. } | FetchOutcome::Skipped { filename, .. } => {
                filename
            }
        }
    }
}

/// Last non-empty path segment of `url`.
pub fn derive_filename(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .and_then(sanitize_filename)
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Extract the filename of a `Content-Disposition` header value.
///
/// The RFC 5987 form (`filename*=UTF-8''%E6%B0%94.txt`) is percent-decoded and wins over a
/// plain `filename=` parameter; quoted and bare plain forms are accepted. Only the basename
/// of the value is kept.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    static PARAM_RES: OnceLock<Option<(Regex, Regex)>> = OnceLock::new();
    let (extended_re, plain_re) = PARAM_RES
        .get_or_init(|| {
            let extended = Regex::new(r#"(?i)filename\*\s*=\s*"?([\w-]+)'[\w-]*'([^";\s]+)"?"#).ok()?;
            let plain = Regex::new(r#"(?i)filename\s*=\s*"?([^";]+)"?"#).ok()?;
            Some((extended, plain))
        })
        .as_ref()?;

    if let Some(caps) = extended_re.captures(header) {
        let charset = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let encoded = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        match decode_extended_value(charset, encoded) {
            Some(name) => return Some(name),
            None => debug!(header, "Undecodable extended filename, trying plain parameter"),
        }
    }

    let raw = plain_re.captures(header)?.get(1)?.as_str();
    sanitize_filename(raw)
}

fn decode_extended_value(charset: &str, encoded: &str) -> Option<String> {
    let bytes: Vec<u8> = percent_decode_str(encoded).collect();
    let decoded = if charset.eq_ignore_ascii_case("utf-8") {
        String::from_utf8(bytes).ok()?
    } else {
        // ISO-8859-1: every byte is the code point of the same value.
        bytes.into_iter().map(char::from).collect()
    };
    sanitize_filename(&decoded)
}

fn sanitize_filename(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let base = trimmed
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(trimmed)
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        None
    } else {
        Some(base.to_string())
    }
}

/// Download `url` into `region_dir` unless a file of the same derived name is already there.
///
/// The URL-derived name is checked before any request is made, so an already staged file
/// costs no network traffic. A `Content-Disposition` filename, when present, overrides the
/// URL-derived name and is checked again before writing.
pub async fn fetch_file<F>(
    fetcher: &F,
    url: &Url,
    region_dir: &Path,
    timeout: Duration,
) -> Result<FetchOutcome, FetchError>
where
    F: Fetcher + ?Sized,
{
    let url_name = derive_filename(url);
    let url_path = region_dir.join(&url_name);
    if url_path.exists() {
        debug!(path = %url_path.display(), "Staged file already exists, not fetching");
        return Ok(FetchOutcome::Skipped {
            filename: url_name,
            path: url_path,
        });
    }

    let resource = fetcher.fetch(url, timeout).await?;

    let filename = resource
        .content_disposition
        .as_deref()
        .and_then(filename_from_content_disposition)
        .unwrap_or(url_name);
    let path = region_dir.join(&filename);
    if path.exists() {
        debug!(path = %path.display(), "Staged file already exists, discarding response");
        return Ok(FetchOutcome::Skipped { filename, path });
    }

    fs::write(&path, &resource.body)?;
    info!(
        url = %url,
        path = %path.display(),
        size = resource.body.len(),
        "Saved downloaded file"
    );
    Ok(FetchOutcome::Saved { filename, path })
}
