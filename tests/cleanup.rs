use bulletin_sync::cleanup::prune_empty_date_dir;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_prune_removes_date_dir_with_only_empty_region_dirs() {
    let tmp = tempdir().unwrap();
    let date_dir = tmp.path().join("气象数据").join("2024-05-17");
    fs::create_dir_all(date_dir.join("IX_Pakistan")).unwrap();
    fs::create_dir_all(date_dir.join("VIII_N_India")).unwrap();

    assert!(prune_empty_date_dir(&date_dir).unwrap());
    assert!(!date_dir.exists());
    assert!(tmp.path().join("气象数据").exists(), "root label dir is kept");
}

#[test]
fn test_prune_removes_completely_empty_date_dir() {
    let tmp = tempdir().unwrap();
    let date_dir = tmp.path().join("2024-05-17");
    fs::create_dir_all(&date_dir).unwrap();

    assert!(prune_empty_date_dir(&date_dir).unwrap());
    assert!(!date_dir.exists());
}

#[test]
fn test_prune_keeps_date_dir_holding_files() {
    let tmp = tempdir().unwrap();
    let date_dir = tmp.path().join("2024-05-17");
    let region_dir = date_dir.join("IX_Pakistan");
    fs::create_dir_all(&region_dir).unwrap();
    fs::create_dir_all(date_dir.join("VIII_N_India")).unwrap();
    fs::write(region_dir.join("report.txt"), "kept after upload failure").unwrap();

    assert!(!prune_empty_date_dir(&date_dir).unwrap());
    assert!(region_dir.join("report.txt").exists());
}

#[test]
fn test_prune_is_a_noop_for_missing_dir() {
    let tmp = tempdir().unwrap();
    assert!(!prune_empty_date_dir(&tmp.path().join("absent")).unwrap());
}
