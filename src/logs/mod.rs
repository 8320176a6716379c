// Logs module - capture, rotation and retrieval of program output

mod capture;
mod composite;
mod event;
mod lock;
mod logger;
mod manager;
mod reader;
pub mod syslog;
mod writer;

pub use capture::capture;
pub use composite::{create_logger, new_logger, CompositeLogger, Destination};
pub use event::{
    LogEvent, LogEventEmitter, LogStreamKind, NullLogEventEmitter, ProcessLogEventEmitter,
};
pub use lock::{LockGuard, Locker, MutexLocker, NullLocker};
pub use logger::{Logger, NullLogger, StdLogger, StdTarget, TailChunk};
pub use manager::{LogManager, ProgramLogs};
pub use reader::{read_range, read_tail, resolve_range};
pub use syslog::SysLogger;
pub use writer::FileLogger;
