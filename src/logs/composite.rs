use crate::config::LogConfig;
use crate::error::{ProcLogError, Result};
use crate::logs::event::{LogEventEmitter, NullLogEventEmitter};
use crate::logs::lock::{Locker, NullLocker};
use crate::logs::logger::{Logger, NullLogger, StdLogger, TailChunk};
use crate::logs::syslog::SysLogger;
use crate::logs::writer::FileLogger;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// One entry of a destination specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    Stderr,
    Null,
    Syslog,
    File(PathBuf),
}

impl Destination {
    /// Interpret a single, already trimmed, destination token
    pub fn parse(token: &str) -> Self {
        match token {
            "/dev/stdout" => Destination::Stdout,
            "/dev/stderr" => Destination::Stderr,
            "/dev/null" | "" => Destination::Null,
            "syslog" => Destination::Syslog,
            path => Destination::File(PathBuf::from(path)),
        }
    }

    /// Split a comma-separated specification into destinations, in order
    pub fn parse_list(destinations: &str) -> Vec<Self> {
        destinations.split(',').map(|token| Self::parse(token.trim())).collect()
    }
}

/// Fan-out dispatcher writing to an ordered list of loggers.
///
/// The first logger is the primary: its results are the ones reported for
/// write and close, and it alone serves reads and clears.
#[derive(Default)]
pub struct CompositeLogger {
    loggers: Mutex<Vec<Arc<dyn Logger>>>,
}

impl CompositeLogger {
    pub fn new(loggers: Vec<Arc<dyn Logger>>) -> Self {
        Self {
            loggers: Mutex::new(loggers),
        }
    }

    fn loggers(&self) -> MutexGuard<'_, Vec<Arc<dyn Logger>>> {
        self.loggers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn primary(&self) -> Result<Arc<dyn Logger>> {
        self.loggers()
            .first()
            .cloned()
            .ok_or(ProcLogError::NoSuchStream)
    }

    /// Append a logger to the end of the list
    pub fn add_logger(&self, logger: Arc<dyn Logger>) {
        self.loggers().push(logger);
    }

    /// Remove `logger` (compared by identity); unknown loggers are ignored
    pub fn remove_logger(&self, logger: &Arc<dyn Logger>) {
        let mut loggers = self.loggers();
        if let Some(index) = loggers
            .iter()
            .position(|l| std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(logger)))
        {
            loggers.remove(index);
        }
    }

    pub fn len(&self) -> usize {
        self.loggers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers().is_empty()
    }
}

impl Logger for CompositeLogger {
    fn write(&self, data: &[u8]) -> Result<usize> {
        let loggers = self.loggers();
        let mut result = Ok(0);

        for (i, logger) in loggers.iter().enumerate() {
            if i == 0 {
                result = logger.write(data);
            } else if let Err(e) = logger.write(data) {
                tracing::warn!("Secondary log destination {} failed to write: {}", i, e);
            }
        }

        result
    }

    fn close(&self) -> Result<()> {
        let loggers = self.loggers();
        let mut result = Ok(());

        for (i, logger) in loggers.iter().enumerate() {
            if i == 0 {
                result = logger.close();
            } else if let Err(e) = logger.close() {
                tracing::warn!("Secondary log destination {} failed to close: {}", i, e);
            }
        }

        result
    }

    fn set_pid(&self, pid: u32) {
        for logger in self.loggers().iter() {
            logger.set_pid(pid);
        }
    }

    fn read_log(&self, offset: i64, length: i64) -> Result<Vec<u8>> {
        self.primary()?.read_log(offset, length)
    }

    fn read_tail_log(&self, offset: i64, length: i64) -> Result<TailChunk> {
        self.primary()?.read_tail_log(offset, length)
    }

    fn clear_current(&self) -> Result<()> {
        self.primary()?.clear_current()
    }

    fn clear_all(&self) -> Result<()> {
        self.primary()?.clear_all()
    }
}

/// Build the logger for one destination
pub fn create_logger(
    program_name: &str,
    destination: &Destination,
    config: &LogConfig,
    locker: Arc<dyn Locker>,
    emitter: Arc<dyn LogEventEmitter>,
) -> Result<Arc<dyn Logger>> {
    tracing::debug!("Creating {:?} log destination for {}", destination, program_name);

    let logger: Arc<dyn Logger> = match destination {
        Destination::Stdout => Arc::new(StdLogger::stdout(emitter)),
        Destination::Stderr => Arc::new(StdLogger::stderr(emitter)),
        Destination::Null => Arc::new(NullLogger::new(emitter)),
        Destination::Syslog => Arc::new(SysLogger::new(program_name, &config.props, emitter)),
        Destination::File(path) => Arc::new(FileLogger::open(
            path,
            config.logfile_maxbytes.as_u64(),
            config.logfile_backups,
            locker,
            emitter,
        )?),
    };

    Ok(logger)
}

/// Build the fan-out logger for a program output stream.
///
/// Only the first destination receives `locker` and `emitter`; the others
/// get a [`NullLocker`] and a [`NullLogEventEmitter`] so that listeners hear
/// each write once.
pub fn new_logger(
    program_name: &str,
    config: &LogConfig,
    locker: Arc<dyn Locker>,
    emitter: Arc<dyn LogEventEmitter>,
) -> Result<CompositeLogger> {
    let mut loggers = Vec::new();

    for (i, destination) in Destination::parse_list(&config.logfile).iter().enumerate() {
        if i == 0 {
            loggers.push(create_logger(
                program_name,
                destination,
                config,
                locker.clone(),
                emitter.clone(),
            )?);
            continue;
        }

        // A mirror that cannot be opened is dropped; the primary still works
        match create_logger(
            program_name,
            destination,
            config,
            Arc::new(NullLocker::new()),
            Arc::new(NullLogEventEmitter::new()),
        ) {
            Ok(logger) => loggers.push(logger),
            Err(e) => tracing::warn!(
                "Skipping log destination {:?} for {}: {}",
                destination,
                program_name,
                e
            ),
        }
    }

    Ok(CompositeLogger::new(loggers))
}
