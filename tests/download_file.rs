use bulletin_sync::contract::{FetchedResource, MockFetcher};
use bulletin_sync::download::{
    derive_filename, fetch_file, filename_from_content_disposition, FetchOutcome,
    FALLBACK_FILENAME,
};
use reqwest::Url;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

const FILE_URL: &str = "https://wwmiws.wmo.int/files/report.txt";

#[test]
fn test_derive_filename_uses_last_path_segment() {
    let cases = vec![
        ("https://x.example/files/report.txt", "report.txt"),
        ("https://x.example/files/WWIN40/", "WWIN40"),
        ("https://x.example/bulletin_download/42?format=txt", "42"),
        ("https://x.example/", FALLBACK_FILENAME),
    ];
    for (url, expected) in cases {
        let url = Url::parse(url).unwrap();
        assert_eq!(derive_filename(&url), expected, "url: {url}");
    }
}

#[test]
fn test_filename_from_content_disposition_forms() {
    let cases = vec![
        (r#"attachment; filename="WWIN40_DEMS.txt""#, Some("WWIN40_DEMS.txt")),
        ("attachment; filename=bulletin.txt", Some("bulletin.txt")),
        ("attachment; filename=bulletin.txt; size=120", Some("bulletin.txt")),
        ("attachment; filename*=UTF-8''metarea9.txt", Some("metarea9.txt")),
        ("attachment; filename*=UTF-8''%E6%B0%94%E8%B1%A1.txt", Some("气象.txt")),
        (
            r#"attachment; filename="fallback.txt"; filename*=UTF-8''%E6%B0%94.txt"#,
            Some("气.txt"),
        ),
        ("attachment; filename*=UTF-8''..%2F..%2Fescape.txt", Some("escape.txt")),
        ("attachment; filename*=iso-8859-1''caf%E9.txt", Some("café.txt")),
        (
            r#"attachment; filename="plain.txt"; filename*=UTF-8''%FF%FE.txt"#,
            Some("plain.txt"),
        ),
        (r#"attachment; filename="../../etc/passwd""#, Some("passwd")),
        ("inline", None),
        (r#"attachment; filename="""#, None),
    ];
    for (header, expected) in cases {
        assert_eq!(
            filename_from_content_disposition(header).as_deref(),
            expected,
            "header: {header}"
        );
    }
}

#[tokio::test]
async fn test_fetch_file_writes_body_under_url_name() {
    let dir = tempdir().unwrap();
    let url = Url::parse(FILE_URL).unwrap();
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .withf(|url, timeout| url.as_str() == FILE_URL && *timeout == Duration::from_secs(60))
        .times(1)
        .returning(|_, _| Ok(FetchedResource::from_body("SECURITE\n")));

    let outcome = fetch_file(&fetcher, &url, dir.path(), Duration::from_secs(60))
        .await
        .expect("fetch should succeed");

    let expected_path = dir.path().join("report.txt");
    assert_eq!(
        outcome,
        FetchOutcome::Saved {
            filename: "report.txt".to_string(),
            path: expected_path.clone(),
        }
    );
    assert_eq!(fs::read_to_string(expected_path).unwrap(), "SECURITE\n");
}

#[tokio::test]
async fn test_fetch_file_prefers_content_disposition_name() {
    let dir = tempdir().unwrap();
    let url = Url::parse("https://wwmiws.wmo.int/index.php/download/77").unwrap();
    let mut fetcher = MockFetcher::new();
    fetcher.expect_fetch().times(1).returning(|_, _| {
        Ok(FetchedResource {
            content_disposition: Some(r#"attachment; filename="WWIN40.txt""#.to_string()),
            body: b"bulletin".to_vec(),
        })
    });

    let outcome = fetch_file(&fetcher, &url, dir.path(), Duration::from_secs(60))
        .await
        .unwrap();

    assert_eq!(outcome.filename(), "WWIN40.txt");
    assert!(dir.path().join("WWIN40.txt").is_file());
    assert!(!dir.path().join("77").exists());
}

#[tokio::test]
async fn test_fetch_file_skips_without_network_when_staged() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("report.txt"), "old").unwrap();
    let url = Url::parse(FILE_URL).unwrap();

    let mut fetcher = MockFetcher::new();
    fetcher.expect_fetch().never();

    let outcome = fetch_file(&fetcher, &url, dir.path(), Duration::from_secs(60))
        .await
        .unwrap();

    assert!(matches!(outcome, FetchOutcome::Skipped { ref filename, .. } if filename == "report.txt"));
    assert_eq!(fs::read_to_string(dir.path().join("report.txt")).unwrap(), "old");
}

#[tokio::test]
async fn test_fetch_file_skips_when_header_name_is_staged() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("WWIN40.txt"), "old").unwrap();
    let url = Url::parse("https://wwmiws.wmo.int/index.php/download/77").unwrap();

    let mut fetcher = MockFetcher::new();
    fetcher.expect_fetch().times(1).returning(|_, _| {
        Ok(FetchedResource {
            content_disposition: Some("attachment; filename=WWIN40.txt".to_string()),
            body: b"new".to_vec(),
        })
    });

    let outcome = fetch_file(&fetcher, &url, dir.path(), Duration::from_secs(60))
        .await
        .unwrap();

    assert!(matches!(outcome, FetchOutcome::Skipped { .. }));
    assert_eq!(fs::read_to_string(dir.path().join("WWIN40.txt")).unwrap(), "old");
}

#[tokio::test]
async fn test_fetch_file_propagates_fetch_error_and_writes_nothing() {
    let dir = tempdir().unwrap();
    let url = Url::parse(FILE_URL).unwrap();
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .times(1)
        .returning(|_, _| Err("404 Not Found".into()));

    let result = fetch_file(&fetcher, &url, dir.path(), Duration::from_secs(60)).await;

    assert!(result.is_err());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
