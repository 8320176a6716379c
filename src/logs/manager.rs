use crate::config::ProgramLogConfig;
use crate::error::{ProcLogError, Result};
use crate::logs::capture::capture;
use crate::logs::composite::{new_logger, CompositeLogger};
use crate::logs::event::{
    LogEvent, LogEventEmitter, LogStreamKind, NullLogEventEmitter, ProcessLogEventEmitter,
};
use crate::logs::lock::MutexLocker;
use crate::logs::logger::{Logger, TailChunk};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The output loggers of one program
pub struct ProgramLogs {
    stdout: Arc<CompositeLogger>,
    stderr: Arc<CompositeLogger>,
    emitters: Vec<Arc<ProcessLogEventEmitter>>,
}

impl ProgramLogs {
    /// Logger for one output stream
    pub fn logger(&self, kind: LogStreamKind) -> Arc<CompositeLogger> {
        match kind {
            LogStreamKind::Stdout => Arc::clone(&self.stdout),
            LogStreamKind::Stderr => Arc::clone(&self.stderr),
        }
    }

    /// Whether stderr shares the stdout logger
    pub fn is_redirected(&self) -> bool {
        Arc::ptr_eq(&self.stdout, &self.stderr)
    }

    fn set_pid(&self, pid: u32) {
        for emitter in &self.emitters {
            emitter.set_pid(pid);
        }
        self.stdout.set_pid(pid);
        if !self.is_redirected() {
            self.stderr.set_pid(pid);
        }
    }

    fn close(&self) -> Result<()> {
        let stdout_result = self.stdout.close();
        let stderr_result = if self.is_redirected() {
            Ok(())
        } else {
            self.stderr.close()
        };
        stdout_result.and(stderr_result)
    }
}

/// LogManager owns the output loggers of every supervised program
pub struct LogManager {
    /// Map of program name to its loggers
    programs: HashMap<String, ProgramLogs>,
    /// Where log events are forwarded, if anyone listens
    events: Option<mpsc::UnboundedSender<LogEvent>>,
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LogManager {
    /// Create a manager whose loggers notify nobody
    pub fn new() -> Self {
        Self {
            programs: HashMap::new(),
            events: None,
        }
    }

    /// Create a manager forwarding every primary write as a [`LogEvent`]
    pub fn with_events() -> (Self, mpsc::UnboundedReceiver<LogEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let manager = Self {
            programs: HashMap::new(),
            events: Some(sender),
        };
        (manager, receiver)
    }

    fn emitter_for(
        &self,
        config: &ProgramLogConfig,
        kind: LogStreamKind,
        emitters: &mut Vec<Arc<ProcessLogEventEmitter>>,
    ) -> Arc<dyn LogEventEmitter> {
        match &self.events {
            Some(sender) => {
                let emitter = Arc::new(ProcessLogEventEmitter::with_sender(
                    kind,
                    &config.name,
                    config.group_name(),
                    sender.clone(),
                ));
                emitters.push(Arc::clone(&emitter));
                emitter
            }
            None => Arc::new(NullLogEventEmitter::new()),
        }
    }

    /// Open the loggers of a program, replacing any it already has
    ///
    /// # Returns
    /// * `Ok(())` - Loggers are ready for writes
    /// * `Err(ProcLogError)` - A destination could not be opened
    pub fn open_logs(&mut self, config: &ProgramLogConfig) -> Result<()> {
        config.validate()?;

        if self.programs.contains_key(&config.name) {
            tracing::info!("Reopening logs for program {}", config.name);
            if let Err(e) = self.close_logs(&config.name) {
                tracing::warn!("Failed to close old logs for program {}: {}", config.name, e);
            }
        }

        let mut emitters = Vec::new();

        let stdout_emitter = self.emitter_for(config, LogStreamKind::Stdout, &mut emitters);
        let stdout = Arc::new(new_logger(
            &config.name,
            &config.stdout,
            Arc::new(MutexLocker::new()),
            stdout_emitter,
        )?);

        let stderr = if config.redirect_stderr {
            Arc::clone(&stdout)
        } else {
            let stderr_emitter = self.emitter_for(config, LogStreamKind::Stderr, &mut emitters);
            Arc::new(new_logger(
                &config.name,
                &config.stderr,
                Arc::new(MutexLocker::new()),
                stderr_emitter,
            )?)
        };

        tracing::debug!(
            "Opened logs for program {} (stdout: '{}', stderr: '{}')",
            config.name,
            config.stdout.logfile,
            if config.redirect_stderr { "redirected" } else { config.stderr.logfile.as_str() }
        );

        self.programs.insert(
            config.name.clone(),
            ProgramLogs {
                stdout,
                stderr,
                emitters,
            },
        );
        Ok(())
    }

    /// Close and forget the loggers of a program
    pub fn close_logs(&mut self, name: &str) -> Result<()> {
        let logs = self.programs.remove(name).ok_or(ProcLogError::NoSuchStream)?;
        logs.close()
    }

    /// Close every program's loggers, reporting the first failure
    pub fn close_all(&mut self) -> Result<()> {
        let mut first_error = None;
        for (name, logs) in self.programs.drain() {
            if let Err(e) = logs.close() {
                tracing::error!("Failed to close logs for program {}: {}", name, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn program(&self, name: &str) -> Result<&ProgramLogs> {
        self.programs.get(name).ok_or(ProcLogError::NoSuchStream)
    }

    /// Logger for one output stream of a program
    pub fn logger(&self, name: &str, kind: LogStreamKind) -> Result<Arc<CompositeLogger>> {
        Ok(self.program(name)?.logger(kind))
    }

    /// Record the pid of a (re)started program
    pub fn set_pid(&self, name: &str, pid: u32) -> Result<()> {
        self.program(name)?.set_pid(pid);
        Ok(())
    }

    pub fn read_log(
        &self,
        name: &str,
        kind: LogStreamKind,
        offset: i64,
        length: i64,
    ) -> Result<Vec<u8>> {
        self.logger(name, kind)?.read_log(offset, length)
    }

    pub fn read_tail_log(
        &self,
        name: &str,
        kind: LogStreamKind,
        offset: i64,
        length: i64,
    ) -> Result<TailChunk> {
        self.logger(name, kind)?.read_tail_log(offset, length)
    }

    pub fn clear_current(&self, name: &str, kind: LogStreamKind) -> Result<()> {
        self.logger(name, kind)?.clear_current()
    }

    pub fn clear_all(&self, name: &str, kind: LogStreamKind) -> Result<()> {
        self.logger(name, kind)?.clear_all()
    }

    /// Check if loggers exist for a program
    pub fn has_logs(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    /// Get the number of programs with open loggers
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Route a child's stdout and stderr pipes into the program's loggers
    ///
    /// This spawns one background task per available pipe; each task ends
    /// when the child closes its side.
    pub fn capture_logs(&self, name: &str, child: &mut Child) -> Result<Vec<JoinHandle<Result<u64>>>> {
        let logs = self.program(name)?;
        let mut tasks = Vec::new();

        if let Some(pid) = child.id() {
            logs.set_pid(pid);
        }

        if let Some(stdout) = child.stdout.take() {
            let logger: Arc<dyn Logger> = logs.logger(LogStreamKind::Stdout);
            tasks.push(tokio::spawn(capture(stdout, logger)));
        }

        if let Some(stderr) = child.stderr.take() {
            let logger: Arc<dyn Logger> = logs.logger(LogStreamKind::Stderr);
            tasks.push(tokio::spawn(capture(stderr, logger)));
        }

        if tasks.is_empty() {
            tracing::warn!("Program {} has no piped output to capture", name);
        }

        Ok(tasks)
    }
}
