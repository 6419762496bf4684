use axum::extract::{Path, Query, Request, State};
use axum::response::{IntoResponse, Response};
use dash_sqlite_json::{ResultSet, collect_rows};
use tracing::debug;

use crate::app::AppState;
use crate::db::Db;
use crate::dump::{DumpSink, dump_request};
use crate::error::DataError;
use crate::params::bind_list;
use crate::store::TemplateStore;
use crate::util::http::{internal_error, json_rows_ok};

const DUMP_BODY_LIMIT_BYTES: usize = 8 * 1024 * 1024;

/// GET /data/{name}
pub async fn api_data(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(bag): Query<Vec<(String, String)>>,
    request: Request,
) -> Response {
    let templates = state.templates.clone();
    let db = state.db.clone();
    let dataset = name.clone();
    let result =
        tokio::task::spawn_blocking(move || dispatch_blocking(&templates, &db, &dataset, &bag))
            .await;

    let rows = match result {
        Ok(Ok(rows)) => rows,
        Ok(Err(error)) => {
            if error != DataError::NotFound {
                state
                    .diag
                    .warn(format_args!("data request for {name:?} failed: {error}"));
            }
            return error.into_response();
        }
        Err(error) => return internal_error(format!("query worker join error: {error}")),
    };

    let body = match serde_json::to_string(&rows) {
        Ok(body) => body,
        Err(error) => return internal_error(format!("json encode error: {error}")),
    };
    debug!(dataset = %name, row_count = rows.len(), "data request served");

    if let Some(sink) = state.dump.clone() {
        write_dump(sink, request, body.clone()).await;
    }
    json_rows_ok(body)
}

/// GET /data and /data/ (no dataset name)
pub async fn api_data_unnamed() -> Response {
    DataError::NotFound.into_response()
}

/// Load the template, bind the query parameters and serialize every row.
///
/// An empty or unsafe dataset name fails before any connection is opened.
pub fn dispatch_blocking(
    templates: &TemplateStore,
    db: &Db,
    name: &str,
    bag: &[(String, String)],
) -> Result<ResultSet, DataError> {
    let template = templates.load(name)?;
    let binds = bind_list(bag);
    db.run_template(&template, &binds, collect_rows)
}

async fn write_dump(sink: std::sync::Arc<DumpSink>, request: Request, response_body: String) {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, DUMP_BODY_LIMIT_BYTES)
        .await
        .unwrap_or_default();
    let request_dump = dump_request(&parts, &body);
    let written =
        tokio::task::spawn_blocking(move || sink.write_exchange(&request_dump, &response_body))
            .await;
    if let Ok(Err(error)) = written {
        debug!(%error, "debug dump not written");
    }
}
