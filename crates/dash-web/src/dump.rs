//! Debug dumps of request/response pairs (enabled with `--debug`).
//!
//! Each successful data request is written to its own
//! `log/{timestamp}.dump` file. Failures are returned to the caller, which
//! is expected to ignore them.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use axum::http::request::Parts;
use chrono::{DateTime, Local, Offset};

const OPEN_MARK: &str = ">>>>>>>>>>>>>>>>>";
const CLOSE_MARK: &str = "<<<<<<<<<<<<<<<<<";
const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, Clone)]
pub struct DumpSink {
    dir: PathBuf,
}

impl DumpSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write_exchange(&self, request_dump: &str, response_body: &str) -> io::Result<PathBuf> {
        self.write_exchange_at(Local::now(), request_dump, response_body)
    }

    pub fn write_exchange_at(
        &self,
        now: DateTime<Local>,
        request_dump: &str,
        response_body: &str,
    ) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let stem = dump_file_stem(now);
        let text = format_exchange(request_dump, response_body);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{stem}.dump")
            } else {
                format!("{stem}-{attempt}.dump")
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(text.as_bytes())?;
                    return Ok(path);
                }
                Err(error) if error.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(error) => return Err(error),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free dump file name for {stem}"),
        ))
    }
}

/// `2024-03-09T07-05-01-000000042+02-00`, or `...Z` for UTC.
pub fn dump_file_stem(now: DateTime<Local>) -> String {
    let offset_secs = now.offset().fix().local_minus_utc();
    let zone = if offset_secs == 0 {
        "Z".to_string()
    } else {
        let sign = if offset_secs < 0 { '-' } else { '+' };
        let abs = offset_secs.unsigned_abs();
        format!("{sign}{:02}-{:02}", abs / 3600, (abs % 3600) / 60)
    };
    format!("{}{zone}", now.format("%Y-%m-%dT%H-%M-%S-%9f"))
}

pub fn format_exchange(request_dump: &str, response_body: &str) -> String {
    format!(
        "Request:\n{OPEN_MARK}\n{request_dump}\n{CLOSE_MARK}\n\nResponse:\n{OPEN_MARK}\n{response_body}\n{CLOSE_MARK}\n"
    )
}

/// Wire-style rendering of a request: request line, headers, blank line, body.
pub fn dump_request(parts: &Parts, body: &[u8]) -> String {
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let mut out = format!("{} {target} {:?}\r\n", parts.method, parts.version);
    for (name, value) in &parts.headers {
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(&String::from_utf8_lossy(value.as_bytes()));
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    out.push_str(&String::from_utf8_lossy(body));
    out
}
