// Output formatting and display for CLI

use crate::logs::LogEvent;
use colored::*;
use std::io::{self, Write};

/// Copy log bytes to stdout untouched
pub fn print_data(data: &[u8]) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(data)?;
    stdout.flush()
}

/// Print a success message to stderr
pub fn print_success(message: &str) {
    eprintln!("{}", format!("✓ {}", message).green().bold());
}

/// Print a notice to stderr
pub fn print_notice(message: &str) {
    eprintln!("{}", message.yellow());
}

/// Print a forwarded log event as one JSON line on stderr
pub fn print_event(event: &LogEvent) {
    match serde_json::to_string(event) {
        Ok(line) => eprintln!("{}", line),
        Err(e) => tracing::warn!("Failed to serialize log event: {}", e),
    }
}
