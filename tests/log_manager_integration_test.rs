use proclog::config::{LogConfig, ProgramLogConfig};
use proclog::logs::{LogManager, LogStreamKind};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;

#[tokio::test]
async fn test_log_manager_captures_process_output() {
    let temp_dir = TempDir::new().unwrap();
    let stdout_log = temp_dir.path().join("test-process-out.log");
    let stderr_log = temp_dir.path().join("test-process-err.log");

    let mut config = ProgramLogConfig::new("test-process");
    config.stdout = LogConfig::for_destination(stdout_log.display().to_string());
    config.stderr = LogConfig::for_destination(stderr_log.display().to_string());

    let (mut manager, mut events) = LogManager::with_events();
    manager.open_logs(&config).unwrap();

    // Spawn a process that outputs to both stdout and stderr
    let mut child = Command::new("/bin/sh")
        .arg("-c")
        .arg("echo 'stdout message' && echo 'stderr message' >&2")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let pid = child.id().unwrap();

    let tasks = manager.capture_logs("test-process", &mut child).unwrap();
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    let _ = child.wait().await;

    assert_eq!(std::fs::read(&stdout_log).unwrap(), b"stdout message\n");
    assert_eq!(std::fs::read(&stderr_log).unwrap(), b"stderr message\n");

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.pid, pid);
        received.push((event.kind, event.data));
    }
    assert!(received.contains(&(LogStreamKind::Stdout, "stdout message\n".to_string())));
    assert!(received.contains(&(LogStreamKind::Stderr, "stderr message\n".to_string())));

    manager.close_logs("test-process").unwrap();
    assert!(!manager.has_logs("test-process"));
}

#[tokio::test]
async fn test_redirected_stderr_interleaves_into_one_file() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("combined.log");

    let mut config = ProgramLogConfig::new("combined");
    config.stdout = LogConfig::for_destination(log.display().to_string());
    config.redirect_stderr = true;

    let mut manager = LogManager::new();
    manager.open_logs(&config).unwrap();

    let mut child = Command::new("/bin/sh")
        .arg("-c")
        .arg("echo out; sleep 0.1; echo err >&2")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let tasks = manager.capture_logs("combined", &mut child).unwrap();
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    let _ = child.wait().await;

    let content = manager
        .read_log("combined", LogStreamKind::Stderr, 0, 0)
        .unwrap();
    assert_eq!(content, b"out\nerr\n");
}
