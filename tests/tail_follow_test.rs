// Integration tests for offset reads and tail-following

use proclog::error::ErrorKind;
use proclog::logs::{FileLogger, Logger, MutexLocker, NullLogEventEmitter};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn logger_with(dir: &TempDir, content: &[u8]) -> FileLogger {
    let logger = FileLogger::open(
        dir.path().join("app.log"),
        1024 * 1024,
        1,
        Arc::new(MutexLocker::new()),
        Arc::new(NullLogEventEmitter::new()),
    )
    .unwrap();
    logger.write(content).unwrap();
    logger
}

fn fifty_bytes() -> Vec<u8> {
    (0..50u8).map(|i| b'A' + (i % 26)).collect()
}

#[test]
fn test_tail_at_end_then_new_output() {
    let temp_dir = TempDir::new().unwrap();
    let logger = logger_with(&temp_dir, &fifty_bytes());

    let chunk = logger.read_tail_log(50, 5).unwrap();
    assert!(chunk.data.is_empty());
    assert_eq!(chunk.offset, 50);
    assert!(chunk.eof);

    logger.write(b"abcdefghij").unwrap();

    let chunk = logger.read_tail_log(50, 5).unwrap();
    assert_eq!(chunk.data, b"abcde");
    assert_eq!(chunk.offset, 55);
    assert!(!chunk.eof);
}

#[test]
fn test_polling_without_writes_stays_at_end() {
    let temp_dir = TempDir::new().unwrap();
    let logger = logger_with(&temp_dir, &fifty_bytes());

    let mut offset = 0;
    let mut collected = Vec::new();
    loop {
        let chunk = logger.read_tail_log(offset, 7).unwrap();
        offset = chunk.offset;
        if chunk.eof {
            break;
        }
        collected.extend(chunk.data);
    }
    assert_eq!(collected, fifty_bytes());

    for _ in 0..3 {
        let chunk = logger.read_tail_log(offset, 7).unwrap();
        assert!(chunk.data.is_empty());
        assert!(chunk.eof);
        assert_eq!(chunk.offset, offset);
    }
}

#[test]
fn test_follower_sees_concurrent_writer() {
    let temp_dir = TempDir::new().unwrap();
    let logger = Arc::new(logger_with(&temp_dir, b""));

    let writer = {
        let logger = Arc::clone(&logger);
        thread::spawn(move || {
            for i in 0..20 {
                logger.write(format!("line {:02}\n", i).as_bytes()).unwrap();
                thread::sleep(Duration::from_millis(2));
            }
        })
    };

    let expected_len = 20 * "line 00\n".len();
    let mut offset = 0;
    let mut collected = Vec::new();
    while collected.len() < expected_len {
        let chunk = logger.read_tail_log(offset, 16).unwrap();
        offset = chunk.offset;
        if chunk.eof {
            thread::sleep(Duration::from_millis(1));
        } else {
            collected.extend(chunk.data);
        }
    }
    writer.join().unwrap();

    let text = String::from_utf8(collected).unwrap();
    assert!(text.starts_with("line 00\n"));
    assert!(text.ends_with("line 19\n"));
}

#[test]
fn test_negative_offset_and_out_of_range_reads() {
    let temp_dir = TempDir::new().unwrap();
    let content = fifty_bytes();
    let logger = logger_with(&temp_dir, &content);

    assert_eq!(logger.read_log(-10, 0).unwrap(), content[40..].to_vec());
    assert_eq!(logger.read_log(-51, 0).unwrap(), content);
    assert_eq!(logger.read_log(100, 0).unwrap(), b"");
    assert_eq!(logger.read_log(50, 10).unwrap(), b"");
    assert_eq!(logger.read_log(48, 10).unwrap(), content[48..].to_vec());

    assert_eq!(
        logger.read_log(-1, 1).unwrap_err().kind(),
        ErrorKind::InvalidArguments
    );
    assert_eq!(
        logger.read_log(1, -1).unwrap_err().kind(),
        ErrorKind::InvalidArguments
    );
    assert_eq!(
        logger.read_tail_log(-1, 1).unwrap_err().kind(),
        ErrorKind::InvalidArguments
    );
}
