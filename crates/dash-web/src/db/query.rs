use std::time::Instant;

use dash_sqlite_json::statement_columns;
use rusqlite::{Connection, Rows};

use crate::db::Db;
use crate::error::DataError;

/// Progress handler callback interval (in SQLite virtual-machine ops).
const PROGRESS_HANDLER_OPS: i32 = 1000;

impl Db {
    /// Run `template` with `binds` as its positional parameters and hand the
    /// cursor to `consume`.
    ///
    /// Connection, statement and cursor all live inside this call and are
    /// released on every return path.
    pub fn run_template<T, F>(
        &self,
        template: &str,
        binds: &[String],
        consume: F,
    ) -> Result<T, DataError>
    where
        F: FnOnce(&[String], Rows<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.open()?;
        let deadline = Instant::now() + self.query_timeout();
        install_progress_handler(&conn, deadline);

        let mut stmt = conn
            .prepare(template)
            .map_err(|error| DataError::Prepare(error.to_string()))?;

        let expected = stmt.parameter_count();
        if expected != binds.len() {
            return Err(DataError::Execution(format!(
                "statement expects {expected} parameters, {} supplied",
                binds.len()
            )));
        }
        for (index, value) in binds.iter().enumerate() {
            stmt.raw_bind_parameter(index + 1, value.as_str())
                .map_err(|error| {
                    DataError::Execution(format!("bind param {}: {error}", index + 1))
                })?;
        }

        let columns = statement_columns(&stmt);
        let rows = stmt.raw_query();
        consume(&columns, rows).map_err(|error| self.execution_error(&error))
    }

    fn execution_error(&self, error: &rusqlite::Error) -> DataError {
        if is_interrupt_error(error) {
            DataError::Execution(format!(
                "query timed out after {} ms",
                self.query_timeout().as_millis()
            ))
        } else {
            DataError::Execution(error.to_string())
        }
    }
}

fn install_progress_handler(conn: &Connection, deadline: Instant) {
    conn.progress_handler(
        PROGRESS_HANDLER_OPS,
        Some(move || Instant::now() > deadline),
    );
}

pub fn is_interrupt_error(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ErrorCode::OperationInterrupted,
                ..
            },
            _
        )
    )
}
