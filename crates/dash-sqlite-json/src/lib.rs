//! SQLite row projection helpers for dash report endpoints.
//!
//! Every row becomes one flat JSON object keyed by column name. Byte
//! sequences coming out of the driver (`TEXT` and `BLOB`) are always emitted
//! as JSON strings; every other storage class keeps its native JSON shape.

use rusqlite::types::ValueRef;
use serde_json::{Map, Number, Value as JsonValue};

/// One serialized database row.
pub type ResultRow = Map<String, JsonValue>;

/// All rows of one query, in cursor order.
pub type ResultSet = Vec<ResultRow>;

pub fn sqlite_value_ref_to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(v) => JsonValue::Number(v.into()),
        ValueRef::Real(v) => Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => bytes_to_json(bytes),
    }
}

fn bytes_to_json(bytes: &[u8]) -> JsonValue {
    JsonValue::String(String::from_utf8_lossy(bytes).into_owned())
}

/// Project a single row into a JSON object using the statement's column names.
///
/// `columns` must be in statement column order. When two columns share a
/// name the later one wins.
pub fn row_to_json_object(
    columns: &[String],
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<ResultRow> {
    let mut entry = Map::new();
    for (index, column) in columns.iter().enumerate() {
        let value = row.get_ref(index)?;
        entry.insert(column.clone(), sqlite_value_ref_to_json(value));
    }
    Ok(entry)
}

/// Drain a forward-only cursor into a result set.
///
/// A cursor with no rows yields an empty vector, which serializes as `[]`.
pub fn collect_rows(columns: &[String], mut rows: rusqlite::Rows<'_>) -> rusqlite::Result<ResultSet> {
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(row_to_json_object(columns, row)?);
    }
    Ok(out)
}

/// Column names of a prepared statement, in statement order.
pub fn statement_columns(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
    stmt.column_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}
