use std::time::Duration;

use rusqlite::{Connection, OpenFlags};

use crate::error::DataError;

mod query;

pub use query::is_interrupt_error;

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection descriptor for the report database.
///
/// No handle is kept: every request opens its own connection and drops it
/// when the request finishes.
#[derive(Debug, Clone)]
pub struct Db {
    dsn: String,
    query_timeout: Duration,
}

impl Db {
    pub fn new(dsn: impl Into<String>, query_timeout: Duration) -> Self {
        Self {
            dsn: dsn.into(),
            query_timeout,
        }
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Open a fresh connection. The database file is never created here.
    pub fn open(&self) -> Result<Connection, DataError> {
        Connection::open_with_flags(
            &self.dsn,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|error| DataError::Connection(format!("open {}: {error}", self.dsn)))
    }
}
