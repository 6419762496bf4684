//! Daily-rotating request log.
//!
//! One line per HTTP request, appended to `log/YYYY_MM_DD.log` for the local
//! calendar day of the entry. The target file is re-derived on every write;
//! there is no rotation timer.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate};
use parking_lot::Mutex;

use crate::diag::ServiceLogger;

mod middleware;

pub use middleware::log_requests;

pub const FIELD_SEPARATOR: &str = " | ";

pub struct LogEntry<'a> {
    pub at: DateTime<Local>,
    pub latency: Duration,
    pub status: u16,
    pub ip: &'a str,
    pub method: &'a str,
    pub path: &'a str,
    pub response_len: u64,
    pub message: Option<&'a str>,
}

impl LogEntry<'_> {
    /// Fixed single-line record, newline included.
    pub fn format_line(&self) -> String {
        let mut line = format!(
            "{} | {:?} | {:>4} | {} | {} | {} | {}",
            self.at.format("%Y/%m/%d - %H:%M:%S"),
            self.latency,
            self.status,
            self.ip,
            self.method,
            self.path,
            self.response_len,
        );
        if let Some(message) = self.message {
            line.push_str(FIELD_SEPARATOR);
            // Keep the record on one line whatever the error text contains.
            line.push_str(&message.replace(['\r', '\n'], " "));
        }
        line.push('\n');
        line
    }
}

pub fn day_file_name(day: NaiveDate) -> String {
    format!("{}.log", day.format("%Y_%m_%d"))
}

pub struct RequestLog {
    dir: PathBuf,
    state: Mutex<LogState>,
    diag: ServiceLogger,
}

struct LogState {
    day: NaiveDate,
    file: Option<File>,
    closed: bool,
}

impl RequestLog {
    /// Create the log directory and open today's file.
    ///
    /// Failing here is a startup failure; once running, write failures are
    /// only reported on the diagnostic channel.
    pub fn open(dir: impl Into<PathBuf>, diag: ServiceLogger) -> io::Result<Self> {
        Self::open_at(dir, diag, Local::now())
    }

    pub fn open_at(
        dir: impl Into<PathBuf>,
        diag: ServiceLogger,
        now: DateTime<Local>,
    ) -> io::Result<Self> {
        let dir = dir.into();
        let day = now.date_naive();
        let file = open_day_file(&dir, day)?;
        Ok(Self {
            dir,
            state: Mutex::new(LogState {
                day,
                file: Some(file),
                closed: false,
            }),
            diag,
        })
    }

    /// Path of the file the next entry for `day` goes to.
    pub fn path_for_day(&self, day: NaiveDate) -> PathBuf {
        self.dir.join(day_file_name(day))
    }

    /// Append one entry. Never fails from the caller's point of view.
    pub fn record(&self, entry: &LogEntry<'_>) {
        if let Err(error) = self.append(entry.at.date_naive(), &entry.format_line()) {
            self.diag
                .warn(format_args!("request log write failed: {error}"));
        }
    }

    fn append(&self, day: NaiveDate, line: &str) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }
        if state.day != day || state.file.is_none() {
            // Drop the old handle first so a failed open leaves no stale file.
            state.file = None;
            state.file = Some(open_day_file(&self.dir, day)?);
            state.day = day;
        }
        let Some(file) = state.file.as_mut() else {
            return Ok(());
        };
        file.write_all(line.as_bytes())?;
        file.flush()
    }

    /// Release the file handle. Entries recorded afterwards are dropped.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.file = None;
    }
}

fn open_day_file(dir: &Path, day: NaiveDate) -> io::Result<File> {
    std::fs::create_dir_all(dir)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(day_file_name(day)))
}
