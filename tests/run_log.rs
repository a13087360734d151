use bulletin_sync::run_log::{format_line, RunLogger};
use regex::Regex;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_format_line_prefixes_local_timestamp() {
    let line = format_line("download complete: report.txt");
    let re = Regex::new(r"^\[\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\] download complete: report\.txt$")
        .unwrap();
    assert!(re.is_match(&line), "unexpected line: {line}");
}

#[test]
fn test_run_logger_appends_one_line_per_event() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("downloads").join("download_log.txt");
    let log = RunLogger::new(&path);

    log.info("run started");
    log.warn("no download links found for IX_Pakistan");
    log.error("upload failed: report.txt (quota)");

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("] run started"));
    assert!(lines[1].ends_with("] no download links found for IX_Pakistan"));
    assert!(lines[2].ends_with("] upload failed: report.txt (quota)"));
}

#[test]
fn test_run_logger_starts_a_new_file_after_removal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("download_log.txt");
    let log = RunLogger::new(&path);

    log.info("before upload");
    fs::remove_file(&path).unwrap();
    log.info("after upload");

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains("after upload"));
}

#[test]
fn test_run_logger_keeps_utf8_messages_intact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("download_log.txt");
    let log = RunLogger::new(&path);

    log.info("created folder 气象数据");

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("created folder 气象数据"));
}
