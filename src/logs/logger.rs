use crate::error::{ProcLogError, Result};
use crate::logs::event::LogEventEmitter;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Result of one tail-follow read
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TailChunk {
    /// Bytes read, possibly empty
    pub data: Vec<u8>,
    /// Offset to pass to the next tail request
    pub offset: i64,
    /// True when the request started at or past the end of the file
    pub eof: bool,
}

/// A destination for the output of a supervised program.
///
/// Every logger accepts writes. Only file-backed loggers keep history, so
/// the read and clear operations fail with [`ProcLogError::NoSuchStream`]
/// (or [`ProcLogError::Unsupported`]) on the other variants.
pub trait Logger: Send + Sync {
    /// Write a chunk of output, returning the number of bytes accepted
    fn write(&self, data: &[u8]) -> Result<usize>;

    /// Release the destination; calling it again is harmless
    fn close(&self) -> Result<()>;

    /// Record the pid of the program producing the output
    fn set_pid(&self, pid: u32);

    /// Read a byte range of the current log.
    ///
    /// A negative `offset` with `length == 0` reads the last `|offset|` bytes.
    /// A non-negative `offset` with `length == 0` reads to the end of file.
    fn read_log(&self, offset: i64, length: i64) -> Result<Vec<u8>>;

    /// Read up to `length` bytes starting at `offset` for tail-following
    fn read_tail_log(&self, offset: i64, length: i64) -> Result<TailChunk>;

    /// Truncate the current log, keeping backups
    fn clear_current(&self) -> Result<()>;

    /// Remove all backups and truncate the current log
    fn clear_all(&self) -> Result<()>;
}

/// Logger that discards everything written to it
pub struct NullLogger {
    emitter: Arc<dyn LogEventEmitter>,
}

impl NullLogger {
    pub fn new(emitter: Arc<dyn LogEventEmitter>) -> Self {
        Self { emitter }
    }
}

impl Logger for NullLogger {
    fn write(&self, data: &[u8]) -> Result<usize> {
        self.emitter.emit_log_event(data);
        Ok(data.len())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn set_pid(&self, _pid: u32) {}

    fn read_log(&self, _offset: i64, _length: i64) -> Result<Vec<u8>> {
        Err(ProcLogError::NoSuchStream)
    }

    fn read_tail_log(&self, _offset: i64, _length: i64) -> Result<TailChunk> {
        Err(ProcLogError::NoSuchStream)
    }

    fn clear_current(&self) -> Result<()> {
        Err(ProcLogError::Unsupported("no log file to clear".to_string()))
    }

    fn clear_all(&self) -> Result<()> {
        Err(ProcLogError::NoSuchStream)
    }
}

/// Which standard stream a [`StdLogger`] forwards to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdTarget {
    Stdout,
    Stderr,
}

/// Logger that passes output through to the supervisor's own stdout/stderr
pub struct StdLogger {
    target: StdTarget,
    writer: Mutex<Box<dyn Write + Send>>,
    emitter: Arc<dyn LogEventEmitter>,
}

impl StdLogger {
    pub fn stdout(emitter: Arc<dyn LogEventEmitter>) -> Self {
        Self::with_writer(StdTarget::Stdout, Box::new(io::stdout()), emitter)
    }

    pub fn stderr(emitter: Arc<dyn LogEventEmitter>) -> Self {
        Self::with_writer(StdTarget::Stderr, Box::new(io::stderr()), emitter)
    }

    /// Create a logger forwarding to an arbitrary writer standing in for `target`
    pub fn with_writer(
        target: StdTarget,
        writer: Box<dyn Write + Send>,
        emitter: Arc<dyn LogEventEmitter>,
    ) -> Self {
        Self {
            target,
            writer: Mutex::new(writer),
            emitter,
        }
    }

    pub fn target(&self) -> StdTarget {
        self.target
    }
}

impl Logger for StdLogger {
    fn write(&self, data: &[u8]) -> Result<usize> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        match writer.write_all(data).and_then(|_| writer.flush()) {
            Ok(()) => Ok(data.len()),
            Err(e) => {
                // Listeners only hear about output this stream failed to pass through
                self.emitter.emit_log_event(data);
                Err(e.into())
            }
        }
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn set_pid(&self, _pid: u32) {}

    fn read_log(&self, _offset: i64, _length: i64) -> Result<Vec<u8>> {
        Err(ProcLogError::NoSuchStream)
    }

    fn read_tail_log(&self, _offset: i64, _length: i64) -> Result<TailChunk> {
        Err(ProcLogError::NoSuchStream)
    }

    fn clear_current(&self) -> Result<()> {
        Err(ProcLogError::Unsupported("no log file to clear".to_string()))
    }

    fn clear_all(&self) -> Result<()> {
        Err(ProcLogError::NoSuchStream)
    }
}
