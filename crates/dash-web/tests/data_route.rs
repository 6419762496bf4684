use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use dash_web::app::{AppState, build_router};
use dash_web::db::Db;
use dash_web::diag::ServiceLogger;
use dash_web::layout::Layout;
use dash_web::reqlog::RequestLog;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

struct Fixture {
    dir: TempDir,
    db_path: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        std::fs::create_dir_all(root.join("Data")).expect("Data dir");
        std::fs::create_dir_all(root.join("templates")).expect("templates dir");
        std::fs::create_dir_all(root.join("static").join("js")).expect("static dir");

        std::fs::write(
            root.join("Data").join("orders.sql"),
            "SELECT id, name, payload FROM orders WHERE id >= ? AND name <> ? ORDER BY id",
        )
        .expect("orders template");
        std::fs::write(
            root.join("Data").join("all_orders.sql"),
            "SELECT id, name FROM orders ORDER BY id",
        )
        .expect("all_orders template");
        std::fs::write(
            root.join("Data").join("broken.sql"),
            "SELEC id FROM orders",
        )
        .expect("broken template");
        std::fs::write(
            root.join("templates").join("report.html"),
            "<h1>{{.title}}</h1>",
        )
        .expect("view");
        std::fs::write(
            root.join("static").join("js").join("app.js"),
            "console.log('dash');",
        )
        .expect("js");

        let db_path = root.join("reports.sqlite");
        let conn = rusqlite::Connection::open(&db_path).expect("create db");
        conn.execute_batch(
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, name TEXT NOT NULL, payload BLOB);
             INSERT INTO orders (id, name, payload) VALUES
               (1, 'alpha', X'6869'),
               (2, 'beta', NULL),
               (3, 'gamma', X'6F6B');",
        )
        .expect("seed db");

        Self { dir, db_path }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn router(&self, dsn: &str, debug: bool) -> Router {
        let layout = Layout::new(self.root().to_path_buf());
        let diag = ServiceLogger::discard("test");
        let request_log =
            Arc::new(RequestLog::open(layout.log_dir(), diag.clone()).expect("request log"));
        let db = Db::new(dsn, Duration::from_secs(5));
        build_router(AppState::new(layout, db, request_log, debug, diag))
    }

    fn default_router(&self) -> Router {
        self.router(self.db_path.to_str().expect("utf-8 path"), false)
    }

    fn log_lines(&self) -> Vec<String> {
        files_with_extension(&self.root().join("log"), "log")
            .iter()
            .flat_map(|path| {
                std::fs::read_to_string(path)
                    .expect("read log")
                    .lines()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

fn files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect()
}

async fn get(router: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = router
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (
        status,
        headers,
        String::from_utf8(body.to_vec()).expect("utf-8 body"),
    )
}

#[tokio::test]
async fn data_route_returns_rows_as_json() {
    let fixture = Fixture::new();
    let (status, headers, body) = get(
        fixture.default_router(),
        "/data/orders?PARAM_1=1&PARAM_2=beta&ignored=x",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .expect("content type")
            .starts_with("application/json")
    );
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let rows: Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(
        rows,
        json!([
            {"id": 1, "name": "alpha", "payload": "hi"},
            {"id": 3, "name": "gamma", "payload": "ok"},
        ])
    );
}

#[tokio::test]
async fn empty_result_is_an_empty_array() {
    let fixture = Fixture::new();
    let (status, _, body) = get(
        fixture.default_router(),
        "/data/orders?PARAM_1=100&PARAM_2=none",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn missing_dataset_name_is_not_found_without_touching_the_database() {
    let fixture = Fixture::new();
    let missing_db = fixture.root().join("nope.sqlite");
    let router = fixture.router(missing_db.to_str().expect("utf-8 path"), false);

    for uri in ["/data/", "/data"] {
        let (status, _, _) = get(router.clone(), uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
    assert!(!missing_db.exists());
}

#[tokio::test]
async fn missing_template_logs_exactly_one_line_with_the_error() {
    let fixture = Fixture::new();
    let (status, headers, body) = get(fixture.default_router(), "/data/unknown").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .expect("content type")
            .starts_with("text/plain")
    );
    assert!(body.starts_with("Internal server error: Read file error"), "{body}");

    let lines = fixture.log_lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    let fields: Vec<&str> = lines[0].split(" | ").collect();
    assert_eq!(fields.len(), 8, "{fields:?}");
    assert_eq!(fields[2].trim(), "500");
    assert_eq!(fields[4], "GET");
    assert_eq!(fields[5], "/data/unknown");
    assert!(fields[7].starts_with("Read file error"), "{}", fields[7]);
}

#[tokio::test]
async fn parameter_count_mismatch_is_a_query_failure() {
    let fixture = Fixture::new();
    let (status, _, body) = get(fixture.default_router(), "/data/orders?PARAM_1=1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Query failed"), "{body}");

    let lines = fixture.log_lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    let fields: Vec<&str> = lines[0].split(" | ").collect();
    assert_eq!(fields.len(), 8, "{fields:?}");
    assert_eq!(fields[2].trim(), "500");
    assert!(fields[7].starts_with("Query failed:"), "{}", fields[7]);
}

#[tokio::test]
async fn malformed_template_logs_one_prepare_error_line() {
    let fixture = Fixture::new();
    let (status, _, body) = get(fixture.default_router(), "/data/broken").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Internal server error: Prepare error:"), "{body}");

    let lines = fixture.log_lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    let fields: Vec<&str> = lines[0].split(" | ").collect();
    assert_eq!(fields.len(), 8, "{fields:?}");
    assert_eq!(fields[5], "/data/broken");
    assert!(fields[7].starts_with("Prepare error:"), "{}", fields[7]);
}

#[tokio::test]
async fn unreachable_database_is_a_connection_error() {
    let fixture = Fixture::new();
    let missing_db = fixture.root().join("nope.sqlite");
    let router = fixture.router(missing_db.to_str().expect("utf-8 path"), false);
    let (status, _, body) = get(router, "/data/all_orders").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Connection error"), "{body}");
}

#[tokio::test]
async fn concurrent_requests_write_whole_log_lines() {
    let fixture = Fixture::new();
    let router = fixture.default_router();
    const REQUESTS: usize = 40;

    let mut handles = Vec::with_capacity(REQUESTS);
    for i in 0..REQUESTS {
        let router = router.clone();
        let uri = if i % 2 == 0 {
            "/data/all_orders".to_string()
        } else {
            format!("/data/missing_{i}")
        };
        handles.push(tokio::spawn(async move { get(router, &uri).await.0 }));
    }
    for handle in handles {
        handle.await.expect("request task");
    }

    let lines = fixture.log_lines();
    assert_eq!(lines.len(), REQUESTS);
    for line in &lines {
        let fields: Vec<&str> = line.split(" | ").collect();
        assert!(fields.len() >= 7, "{line}");
        assert!(fields[2].trim().parse::<u16>().is_ok(), "{line}");
    }
}

#[tokio::test]
async fn debug_mode_dumps_the_exchange() {
    let fixture = Fixture::new();
    let router = fixture.router(fixture.db_path.to_str().expect("utf-8 path"), true);
    let (status, _, body) = get(router, "/data/all_orders").await;
    assert_eq!(status, StatusCode::OK);

    let dumps = files_with_extension(&fixture.root().join("log"), "dump");
    assert_eq!(dumps.len(), 1, "{dumps:?}");
    let text = std::fs::read_to_string(&dumps[0]).expect("read dump");
    assert!(text.contains("GET /data/all_orders"), "{text}");
    assert!(text.contains(&body), "{text}");
}

#[tokio::test]
async fn views_render_with_escaped_query_values() {
    let fixture = Fixture::new();
    let (status, _, body) = get(fixture.default_router(), "/report?title=%3Cb%3EQ1%3C%2Fb%3E").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<h1>&lt;b&gt;Q1&lt;/b&gt;</h1>");

    let (status, _, _) = get(fixture.default_router(), "/missing-page").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_scripts_are_served() {
    let fixture = Fixture::new();
    let (status, _, body) = get(fixture.default_router(), "/js/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "console.log('dash');");
}
