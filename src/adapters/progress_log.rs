use crate::domain::ports::ProgressLog;
use crate::utils::error::Result;
use chrono::{Local, NaiveDateTime};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

pub const DEFAULT_LOG_FILE: &str = "code_log.txt";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `[YYYY-MM-DD HH:MM:SS] message` followed by a blank line.
pub fn format_entry(timestamp: NaiveDateTime, message: &str) -> String {
    format!("[{}] {}\n\n", timestamp.format(TIMESTAMP_FORMAT), message)
}

/// Appends timestamped entries to a text file, creating it on first use.
#[derive(Debug, Clone)]
pub struct FileProgressLog {
    path: PathBuf,
}

impl FileProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProgressLog for FileProgressLog {
    fn log(&self, message: &str) -> Result<()> {
        tracing::debug!("{}", message);
        let entry = format_entry(Local::now().naive_local(), message);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())?;
        Ok(())
    }
}

/// Keeps messages in memory; used where the filesystem should stay untouched.
#[derive(Debug, Default)]
pub struct MemoryProgressLog {
    entries: Mutex<Vec<String>>,
}

impl MemoryProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl ProgressLog for MemoryProgressLog {
    fn log(&self, message: &str) -> Result<()> {
        tracing::debug!("{}", message);
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(message.to_string());
        }
        Ok(())
    }
}
