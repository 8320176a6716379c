// CLI module - command-line front end to the log-capture core

mod output;

use crate::config::{ByteSize, LogConfig, ProgramLogConfig};
use crate::logs::{
    new_logger, FileLogger, LogManager, Logger, MutexLocker, NullLogEventEmitter,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

/// proclog - capture, rotate and follow program output logs
#[derive(Parser)]
#[command(name = "proclog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy stdin to a destination specification
    Write {
        /// Comma-separated destinations (paths, /dev/stdout, /dev/stderr, /dev/null, syslog)
        destination: String,

        /// Rotation threshold, e.g. 1024, 64KB, 50MB (0 disables rotation)
        #[arg(short, long, default_value = "50MB")]
        max_bytes: ByteSize,

        /// Number of rotated files to keep
        #[arg(short, long, default_value = "10")]
        backups: usize,

        /// Program name used as syslog tag
        #[arg(short, long, default_value = "proclog")]
        name: String,
    },

    /// Read a byte range of a log file
    Read {
        /// Log file path
        file: PathBuf,

        /// Start offset; negative reads the last |offset| bytes
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        offset: i64,

        /// Number of bytes to read (0 reads to end of file)
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        length: i64,
    },

    /// Read from an offset of a log file, optionally following new output
    Tail {
        /// Log file path
        file: PathBuf,

        /// Start offset
        #[arg(short, long, default_value = "0")]
        offset: i64,

        /// Maximum bytes per read
        #[arg(short, long, default_value = "4096")]
        length: i64,

        /// Keep polling for new output
        #[arg(short, long)]
        follow: bool,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "500")]
        interval_ms: u64,
    },

    /// Truncate a log file
    Clear {
        /// Log file path
        file: PathBuf,

        /// Also delete numbered backups
        #[arg(short, long)]
        all: bool,

        /// Number of backups the log keeps
        #[arg(short, long, default_value = "10")]
        backups: usize,
    },

    /// Run a command and capture its output
    Run {
        /// Program log configuration file (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Program to use from the configuration file (defaults to the first)
        #[arg(short, long)]
        program: Option<String>,

        /// Stdout destination when no configuration file is given
        #[arg(long, default_value = "/dev/stdout")]
        stdout: String,

        /// Stderr destination when no configuration file is given
        #[arg(long, default_value = "/dev/stderr")]
        stderr: String,

        /// Print forwarded log events as JSON lines on stderr
        #[arg(long)]
        events: bool,

        /// Command to run followed by its arguments
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

impl Cli {
    /// Run the CLI application
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        cli.execute().await
    }

    /// Execute the parsed command
    async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Write {
                destination,
                max_bytes,
                backups,
                name,
            } => {
                let config = LogConfig {
                    logfile: destination,
                    logfile_maxbytes: max_bytes,
                    logfile_backups: backups,
                    ..LogConfig::default()
                };
                tokio::task::spawn_blocking(move || write_stdin(&name, &config)).await?
            }

            Commands::Read {
                file,
                offset,
                length,
            } => {
                let logger = open_file_logger(&file, 0)?;
                let data = logger.read_log(offset, length)?;
                output::print_data(&data)?;
                Ok(())
            }

            Commands::Tail {
                file,
                offset,
                length,
                follow,
                interval_ms,
            } => tail(&file, offset, length, follow, Duration::from_millis(interval_ms)).await,

            Commands::Clear { file, all, backups } => {
                let logger = open_file_logger(&file, backups)?;
                if all {
                    logger.clear_all()?;
                    output::print_success(&format!("Cleared {} and its backups", file.display()));
                } else {
                    logger.clear_current()?;
                    output::print_success(&format!("Cleared {}", file.display()));
                }
                Ok(())
            }

            Commands::Run {
                config,
                program,
                stdout,
                stderr,
                events,
                command,
            } => {
                let program_config = match config {
                    Some(path) => select_program(&path, program.as_deref())?,
                    None => {
                        let mut program_config =
                            ProgramLogConfig::new(program.unwrap_or_else(|| command[0].clone()));
                        program_config.stdout = LogConfig::for_destination(stdout);
                        program_config.stderr = LogConfig::for_destination(stderr);
                        program_config
                    }
                };
                run_command(&program_config, &command, events).await
            }
        }
    }
}

/// Open a file log for inspection; reads never rotate
fn open_file_logger(file: &Path, backups: usize) -> Result<FileLogger> {
    if !file.exists() {
        bail!("Log file does not exist: {}", file.display());
    }
    FileLogger::open(
        file,
        0,
        backups,
        Arc::new(MutexLocker::new()),
        Arc::new(NullLogEventEmitter::new()),
    )
    .with_context(|| format!("Failed to open log file {}", file.display()))
}

fn write_stdin(name: &str, config: &LogConfig) -> Result<()> {
    let logger = new_logger(
        name,
        config,
        Arc::new(MutexLocker::new()),
        Arc::new(NullLogEventEmitter::new()),
    )?;

    let mut stdin = std::io::stdin().lock();
    let mut buf = vec![0u8; 8 * 1024];
    loop {
        let n = stdin.read(&mut buf).context("Failed to read stdin")?;
        if n == 0 {
            break;
        }
        logger.write(&buf[..n])?;
    }

    logger.close()?;
    Ok(())
}

async fn tail(file: &Path, mut offset: i64, length: i64, follow: bool, interval: Duration) -> Result<()> {
    let logger = open_file_logger(file, 0)?;

    loop {
        let chunk = logger.read_tail_log(offset, length)?;
        if chunk.eof && chunk.offset < offset {
            output::print_notice(&format!("{}: file truncated", file.display()));
        }
        offset = chunk.offset;

        if !chunk.data.is_empty() {
            output::print_data(&chunk.data)?;
            continue;
        }

        if !follow {
            return Ok(());
        }
        tokio::time::sleep(interval).await;
    }
}

fn select_program(path: &Path, program: Option<&str>) -> Result<ProgramLogConfig> {
    let configs = ProgramLogConfig::from_file(path)?;
    match program {
        Some(name) => configs
            .into_iter()
            .find(|c| c.name == name)
            .with_context(|| format!("Program '{}' not found in {}", name, path.display())),
        None => configs
            .into_iter()
            .next()
            .with_context(|| format!("No programs in {}", path.display())),
    }
}

async fn run_command(config: &ProgramLogConfig, command: &[String], events: bool) -> Result<()> {
    let mut manager = if events {
        let (manager, mut receiver) = LogManager::with_events();
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                output::print_event(&event);
            }
        });
        manager
    } else {
        LogManager::new()
    };

    manager.open_logs(config)?;

    let mut child = tokio::process::Command::new(&command[0])
        .args(&command[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to spawn {}", command[0]))?;

    tracing::info!(
        "Started {} (pid {})",
        config.name,
        child.id().map_or_else(|| "unknown".to_string(), |pid| pid.to_string())
    );

    let tasks = manager.capture_logs(&config.name, &mut child)?;
    let status = child.wait().await.context("Failed to wait for child")?;

    for task in tasks {
        if let Err(e) = task.await? {
            tracing::warn!("Output capture for {} ended early: {}", config.name, e);
        }
    }
    manager.close_all()?;

    if status.success() {
        output::print_success(&format!("{} exited with {}", config.name, status));
        Ok(())
    } else {
        bail!("{} exited with {}", config.name, status)
    }
}
