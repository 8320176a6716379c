// Syslog destination for program output.
//
// The logger itself only knows an opaque writer. On unix the default writer
// hands each line to the local syslog(3) through libc; remote syslog servers
// are out of scope.

use crate::error::{ProcLogError, Result};
use crate::logs::event::LogEventEmitter;
use crate::logs::logger::{Logger, TailChunk};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Property naming the syslog facility (e.g. `daemon`, `local3`)
pub const PROP_FACILITY: &str = "syslog_facility";
/// Property naming the syslog priority (e.g. `info`, `err`)
pub const PROP_PRIORITY: &str = "syslog_priority";
/// Property overriding the tag prefixed to every message
pub const PROP_TAG: &str = "syslog_tag";

/// Logger forwarding program output to syslog
pub struct SysLogger {
    writer: Mutex<Option<Box<dyn Write + Send>>>,
    emitter: Arc<dyn LogEventEmitter>,
}

impl SysLogger {
    /// Create a logger sending to the local syslog, configured from `props`
    pub fn new(
        program_name: &str,
        props: &HashMap<String, String>,
        emitter: Arc<dyn LogEventEmitter>,
    ) -> Self {
        Self::with_writer(default_writer(program_name, props), emitter)
    }

    /// Create a logger over an explicit writer; `None` means not connected
    pub fn with_writer(
        writer: Option<Box<dyn Write + Send>>,
        emitter: Arc<dyn LogEventEmitter>,
    ) -> Self {
        Self {
            writer: Mutex::new(writer),
            emitter,
        }
    }
}

impl Logger for SysLogger {
    fn write(&self, data: &[u8]) -> Result<usize> {
        self.emitter.emit_log_event(data);

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        match writer.as_mut() {
            Some(writer) => {
                writer.write_all(data)?;
                Ok(data.len())
            }
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "not connected to syslog").into()),
        }
    }

    fn close(&self) -> Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(mut writer) = writer.take() {
            writer.flush()?;
        }
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

#[cfg(unix)]
fn default_writer(program_name: &str, props: &HashMap<String, String>) -> Option<Box<dyn Write + Send>> {
    Some(Box::new(LocalSyslog::from_props(program_name, props)))
}

#[cfg(not(unix))]
fn default_writer(_program_name: &str, _props: &HashMap<String, String>) -> Option<Box<dyn Write + Send>> {
    tracing::warn!("Local syslog is not available on this platform");
    None
}

/// Map a facility name to its syslog(3) constant
#[cfg(unix)]
pub fn facility_from_name(name: &str) -> Option<libc::c_int> {
    match name.to_ascii_lowercase().as_str() {
        "kern" => Some(libc::LOG_KERN),
        "user" => Some(libc::LOG_USER),
        "mail" => Some(libc::LOG_MAIL),
        "daemon" => Some(libc::LOG_DAEMON),
        "auth" => Some(libc::LOG_AUTH),
        "syslog" => Some(libc::LOG_SYSLOG),
        "lpr" => Some(libc::LOG_LPR),
        "news" => Some(libc::LOG_NEWS),
        "uucp" => Some(libc::LOG_UUCP),
        "cron" => Some(libc::LOG_CRON),
        "local0" => Some(libc::LOG_LOCAL0),
        "local1" => Some(libc::LOG_LOCAL1),
        "local2" => Some(libc::LOG_LOCAL2),
        "local3" => Some(libc::LOG_LOCAL3),
        "local4" => Some(libc::LOG_LOCAL4),
        "local5" => Some(libc::LOG_LOCAL5),
        "local6" => Some(libc::LOG_LOCAL6),
        "local7" => Some(libc::LOG_LOCAL7),
        _ => None,
    }
}

/// Map a priority name to its syslog(3) constant
#[cfg(unix)]
pub fn priority_from_name(name: &str) -> Option<libc::c_int> {
    match name.to_ascii_lowercase().as_str() {
        "emerg" => Some(libc::LOG_EMERG),
        "alert" => Some(libc::LOG_ALERT),
        "crit" => Some(libc::LOG_CRIT),
        "err" | "error" => Some(libc::LOG_ERR),
        "warning" | "warn" => Some(libc::LOG_WARNING),
        "notice" => Some(libc::LOG_NOTICE),
        "info" => Some(libc::LOG_INFO),
        "debug" => Some(libc::LOG_DEBUG),
        _ => None,
    }
}

/// Writer sending one syslog(3) message per line of output
#[cfg(unix)]
pub struct LocalSyslog {
    facility: libc::c_int,
    priority: libc::c_int,
    tag: String,
}

#[cfg(unix)]
impl LocalSyslog {
    pub fn new(facility: libc::c_int, priority: libc::c_int, tag: impl Into<String>) -> Self {
        Self {
            facility,
            priority,
            tag: tag.into(),
        }
    }

    /// Build from supervisor properties; unknown names fall back to `user`/`info`
    pub fn from_props(program_name: &str, props: &HashMap<String, String>) -> Self {
        let facility = match props.get(PROP_FACILITY) {
            Some(name) => facility_from_name(name).unwrap_or_else(|| {
                tracing::warn!("Unknown syslog facility '{}', using 'user'", name);
                libc::LOG_USER
            }),
            None => libc::LOG_USER,
        };
        let priority = match props.get(PROP_PRIORITY) {
            Some(name) => priority_from_name(name).unwrap_or_else(|| {
                tracing::warn!("Unknown syslog priority '{}', using 'info'", name);
                libc::LOG_INFO
            }),
            None => libc::LOG_INFO,
        };
        let tag = props
            .get(PROP_TAG)
            .cloned()
            .unwrap_or_else(|| program_name.to_string());

        Self::new(facility, priority, tag)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn facility(&self) -> libc::c_int {
        self.facility
    }

    pub fn priority(&self) -> libc::c_int {
        self.priority
    }

    fn send_line(&self, line: &[u8]) {
        let text = String::from_utf8_lossy(line).replace('\0', " ");
        let message = match std::ffi::CString::new(format!("{}: {}", self.tag, text)) {
            Ok(message) => message,
            Err(_) => return,
        };

        // `%s` keeps program output from being read as a format string.
        // SAFETY: both pointers are valid NUL-terminated strings for the call.
        unsafe {
            libc::syslog(
                self.facility | self.priority,
                c"%s".as_ptr(),
                message.as_ptr(),
            );
        }
    }
}

#[cfg(unix)]
impl Write for LocalSyslog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for line in buf.split(|b| *b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if !line.is_empty() {
                self.send_line(line);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
