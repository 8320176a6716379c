use crate::error::Result;
use crate::logs::event::LogEventEmitter;
use crate::logs::lock::Locker;
use crate::logs::logger::{Logger, TailChunk};
use crate::logs::reader;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Handle and running size of the active log file
struct ActiveFile {
    file: Option<File>,
    /// Approximate size; corrected from disk only when it reaches the threshold
    size: u64,
}

/// FileLogger appends program output to a file and rotates it into numbered
/// backups (`<path>.1` newest .. `<path>.<backups>` oldest) once it reaches
/// `max_size` bytes.
pub struct FileLogger {
    /// Path to the active log file
    path: PathBuf,
    /// Size in bytes that triggers rotation; 0 disables rotation
    max_size: u64,
    /// Number of rotated files to keep
    backups: usize,
    active: Mutex<ActiveFile>,
    locker: Arc<dyn Locker>,
    emitter: Arc<dyn LogEventEmitter>,
}

impl FileLogger {
    /// Open (or create) the log file at `path` for appending
    ///
    /// # Arguments
    /// * `path` - Active log file path
    /// * `max_size` - Rotation threshold in bytes, 0 to never rotate
    /// * `backups` - Number of rotated files to keep
    /// * `locker` - Lock shared with the other loggers of the same stream
    /// * `emitter` - Observer notified of every successful write
    pub fn open<P: AsRef<Path>>(
        path: P,
        max_size: u64,
        backups: usize,
        locker: Arc<dyn Locker>,
        emitter: Arc<dyn LogEventEmitter>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        tracing::debug!(
            "Opened log file {} ({} bytes, max {} bytes, {} backups)",
            path.display(),
            size,
            max_size,
            backups
        );

        Ok(Self {
            path,
            max_size,
            backups,
            active: Mutex::new(ActiveFile {
                file: Some(file),
                size,
            }),
            locker,
            emitter,
        })
    }

    /// Path of the backup with the given index (1 is the most recent)
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    /// Get the path to the active log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the maximum log file size before rotation
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Get the number of backups kept
    pub fn backups(&self) -> usize {
        self.backups
    }

    /// Current value of the running size counter
    pub fn tracked_size(&self) -> u64 {
        self.active_file().size
    }

    fn active_file(&self) -> std::sync::MutexGuard<'_, ActiveFile> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the active handle with a freshly truncated file
    fn reopen_truncated(&self, active: &mut ActiveFile) -> io::Result<()> {
        active.file = None;
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.set_len(0)?;
        active.file = Some(file);
        active.size = 0;
        Ok(())
    }

    /// Shift backups up by one and move the active file into slot 1.
    ///
    /// Not crash-atomic: an interruption between renames can leave one
    /// backup slot duplicated or missing.
    fn rotate(&self) {
        if self.backups == 0 {
            return;
        }

        for i in (1..self.backups).rev() {
            let src = self.backup_path(i);
            if src.exists() {
                let dest = self.backup_path(i + 1);
                if let Err(e) = fs::rename(&src, &dest) {
                    tracing::warn!(
                        "Failed to shift log backup {} to {}: {}",
                        src.display(),
                        dest.display(),
                        e
                    );
                }
            }
        }

        let dest = self.backup_path(1);
        if let Err(e) = fs::rename(&self.path, &dest) {
            tracing::warn!(
                "Failed to move log file {} to {}: {}",
                self.path.display(),
                dest.display(),
                e
            );
        }
    }
}

impl Logger for FileLogger {
    fn write(&self, data: &[u8]) -> Result<usize> {
        let _guard = self.locker.lock();
        let mut active = self.active_file();

        let written = match active.file.as_mut() {
            Some(file) => {
                // A partial write reports only the error, not the bytes that landed
                file.write_all(data)?;
                data.len()
            }
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotConnected,
                    format!("log file {} is closed", self.path.display()),
                )
                .into())
            }
        };

        self.emitter.emit_log_event(data);
        active.size += written as u64;

        if self.max_size == 0 || active.size < self.max_size {
            return Ok(written);
        }

        // The counter may have drifted from the file on disk
        active.size = fs::metadata(&self.path)?.len();
        if active.size < self.max_size {
            return Ok(written);
        }

        active.file = None;
        self.rotate();
        match self.reopen_truncated(&mut active) {
            Ok(()) => tracing::info!(
                "Rotated log file {} ({} backups kept)",
                self.path.display(),
                self.backups
            ),
            Err(e) => tracing::error!(
                "Failed to reopen log file {} after rotation: {}",
                self.path.display(),
                e
            ),
        }

        Ok(written)
    }

    fn close(&self) -> Result<()> {
        let _guard = self.locker.lock();
        let mut active = self.active_file();
        if let Some(mut file) = active.file.take() {
            file.flush()?;
        }
        Ok(())
    }

    fn set_pid(&self, _pid: u32) {}

    fn read_log(&self, offset: i64, length: i64) -> Result<Vec<u8>> {
        let _guard = self.locker.lock();
        reader::read_range(&self.path, offset, length)
    }

    fn read_tail_log(&self, offset: i64, length: i64) -> Result<TailChunk> {
        let _guard = self.locker.lock();
        reader::read_tail(&self.path, offset, length)
    }

    fn clear_current(&self) -> Result<()> {
        let _guard = self.locker.lock();
        let mut active = self.active_file();
        self.reopen_truncated(&mut active)?;
        Ok(())
    }

    fn clear_all(&self) -> Result<()> {
        let _guard = self.locker.lock();

        for i in (1..=self.backups).rev() {
            let backup = self.backup_path(i);
            match fs::remove_file(&backup) {
                Ok(()) => tracing::debug!("Removed log backup {}", backup.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        let mut active = self.active_file();
        self.reopen_truncated(&mut active)?;
        Ok(())
    }
}
