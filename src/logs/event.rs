use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::mpsc;

/// Observer notified with the content of log writes.
///
/// Log-forwarding listeners subscribe through an emitter; which writes
/// trigger a notification depends on the logger variant.
pub trait LogEventEmitter: Send + Sync {
    fn emit_log_event(&self, data: &[u8]);
}

/// Emitter that notifies nobody
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogEventEmitter;

impl NullLogEventEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl LogEventEmitter for NullLogEventEmitter {
    fn emit_log_event(&self, _data: &[u8]) {}
}

/// Which output channel of a program produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStreamKind {
    Stdout,
    Stderr,
}

impl std::fmt::Display for LogStreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogStreamKind::Stdout => write!(f, "stdout"),
            LogStreamKind::Stderr => write!(f, "stderr"),
        }
    }
}

/// A chunk of program output forwarded to log listeners
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub kind: LogStreamKind,
    pub process_name: String,
    pub group_name: String,
    pub pid: u32,
    pub data: String,
    pub timestamp: DateTime<Local>,
}

/// Emitter that turns writes into [`LogEvent`]s on a channel
pub struct ProcessLogEventEmitter {
    kind: LogStreamKind,
    process_name: String,
    group_name: String,
    pid: AtomicU32,
    sender: mpsc::UnboundedSender<LogEvent>,
}

impl ProcessLogEventEmitter {
    /// Create an emitter and the receiving end of its event channel
    pub fn channel(
        kind: LogStreamKind,
        process_name: &str,
        group_name: &str,
    ) -> (Self, mpsc::UnboundedReceiver<LogEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::with_sender(kind, process_name, group_name, sender), receiver)
    }

    /// Create an emitter publishing into an existing channel
    pub fn with_sender(
        kind: LogStreamKind,
        process_name: &str,
        group_name: &str,
        sender: mpsc::UnboundedSender<LogEvent>,
    ) -> Self {
        Self {
            kind,
            process_name: process_name.to_string(),
            group_name: group_name.to_string(),
            pid: AtomicU32::new(0),
            sender,
        }
    }

    /// Update the pid stamped on subsequent events
    pub fn set_pid(&self, pid: u32) {
        self.pid.store(pid, Ordering::Relaxed);
    }

    pub fn pid(&self) -> u32 {
        self.pid.load(Ordering::Relaxed)
    }
}

impl LogEventEmitter for ProcessLogEventEmitter {
    fn emit_log_event(&self, data: &[u8]) {
        let event = LogEvent {
            kind: self.kind,
            process_name: self.process_name.clone(),
            group_name: self.group_name.clone(),
            pid: self.pid(),
            data: String::from_utf8_lossy(data).into_owned(),
            timestamp: Local::now(),
        };

        // Nobody listening is not an error for the writer
        if self.sender.send(event).is_err() {
            tracing::trace!("Dropped log event for {}: no listener", self.process_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_emitter_forwards_events() {
        let (emitter, mut receiver) =
            ProcessLogEventEmitter::channel(LogStreamKind::Stderr, "web", "frontend");
        emitter.set_pid(4242);
        emitter.emit_log_event(b"boom\n");

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.kind, LogStreamKind::Stderr);
        assert_eq!(event.process_name, "web");
        assert_eq!(event.group_name, "frontend");
        assert_eq!(event.pid, 4242);
        assert_eq!(event.data, "boom\n");
    }

    #[test]
    fn test_process_emitter_without_listener() {
        let (emitter, receiver) =
            ProcessLogEventEmitter::channel(LogStreamKind::Stdout, "web", "web");
        drop(receiver);
        emitter.emit_log_event(b"ignored");
    }

    #[test]
    fn test_log_event_serializes_kind_lowercase() {
        let (emitter, mut receiver) =
            ProcessLogEventEmitter::channel(LogStreamKind::Stdout, "api", "api");
        emitter.emit_log_event(b"hello");

        let event = receiver.try_recv().unwrap();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "stdout");
        assert_eq!(json["data"], "hello");
    }
}
