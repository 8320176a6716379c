// Integration tests for size-triggered rotation and clearing

use proclog::logs::{FileLogger, Logger, MutexLocker, NullLogEventEmitter};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn open(path: &Path, max_size: u64, backups: usize) -> FileLogger {
    FileLogger::open(
        path,
        max_size,
        backups,
        Arc::new(MutexLocker::new()),
        Arc::new(NullLogEventEmitter::new()),
    )
    .unwrap()
}

fn backup(path: &Path, index: usize) -> PathBuf {
    PathBuf::from(format!("{}.{}", path.display(), index))
}

#[test]
fn test_rotation_trigger_and_backup_shift() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("app.log");
    let logger = open(&path, 10, 2);

    logger.write(b"0123456789").unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"");
    assert_eq!(fs::read(backup(&path, 1)).unwrap(), b"0123456789");

    logger.write(b"abc").unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"abc");

    logger.write(b"0123456789A").unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"");
    assert_eq!(fs::read(backup(&path, 1)).unwrap(), b"abc0123456789A");
    assert_eq!(fs::read(backup(&path, 2)).unwrap(), b"0123456789");
    assert!(!backup(&path, 3).exists());
}

#[test]
fn test_backup_count_never_exceeds_retention() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("app.log");
    let logger = open(&path, 8, 3);

    for i in 0..20 {
        logger.write(format!("chunk-{:02}", i).as_bytes()).unwrap();
    }

    for i in 1..=3 {
        assert!(backup(&path, i).exists(), "backup {} should exist", i);
    }
    assert!(!backup(&path, 4).exists());
    assert_eq!(fs::read(backup(&path, 1)).unwrap(), b"chunk-19");
    assert_eq!(fs::read(backup(&path, 3)).unwrap(), b"chunk-17");
}

#[test]
fn test_reopened_logger_continues_size_count() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("app.log");

    let logger = open(&path, 10, 1);
    logger.write(b"012345").unwrap();
    logger.close().unwrap();

    let logger = open(&path, 10, 1);
    logger.write(b"6789").unwrap();
    assert_eq!(fs::read(backup(&path, 1)).unwrap(), b"0123456789");
    assert_eq!(fs::read(&path).unwrap(), b"");
}

#[test]
fn test_clear_all_removes_every_backup() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("app.log");
    let logger = open(&path, 4, 3);

    for chunk in ["aaaa", "bbbb", "cccc", "dd"] {
        logger.write(chunk.as_bytes()).unwrap();
    }
    for i in 1..=3 {
        assert!(backup(&path, i).exists());
    }

    logger.clear_all().unwrap();
    for i in 1..=3 {
        assert!(!backup(&path, i).exists());
    }
    assert_eq!(fs::read(&path).unwrap(), b"");

    logger.clear_all().unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"");
}

#[test]
fn test_round_trip_below_threshold() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("app.log");
    let logger = open(&path, 1024 * 1024, 2);

    let payload: Vec<u8> = (0..=255u8).cycle().take(4000).collect();
    for chunk in payload.chunks(333) {
        logger.write(chunk).unwrap();
    }

    assert_eq!(logger.read_log(0, 0).unwrap(), payload);
}
