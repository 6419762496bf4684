use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::get;
use tower_http::services::ServeDir;

use crate::api::data::{api_data, api_data_unnamed};
use crate::api::view::api_view;
use crate::config::Settings;
use crate::db::Db;
use crate::diag::ServiceLogger;
use crate::dump::DumpSink;
use crate::layout::Layout;
use crate::reqlog::{RequestLog, log_requests};
use crate::store::TemplateStore;
use crate::util::http::render_unexpected_errors;
use crate::views::ViewStore;

#[derive(Clone)]
pub struct AppState {
    pub layout: Arc<Layout>,
    pub db: Arc<Db>,
    pub templates: Arc<TemplateStore>,
    pub views: Arc<ViewStore>,
    pub request_log: Arc<RequestLog>,
    pub dump: Option<Arc<DumpSink>>,
    pub diag: ServiceLogger,
}

impl AppState {
    pub fn new(
        layout: Layout,
        db: Db,
        request_log: Arc<RequestLog>,
        debug: bool,
        diag: ServiceLogger,
    ) -> Self {
        let templates = TemplateStore::new(layout.data_dir());
        let views = ViewStore::new(layout.templates_dir());
        let dump = debug.then(|| Arc::new(DumpSink::new(layout.log_dir())));
        Self {
            layout: Arc::new(layout),
            db: Arc::new(db),
            templates: Arc::new(templates),
            views: Arc::new(views),
            request_log,
            dump,
            diag,
        }
    }

    /// Open the request log under the layout's `log/` directory and build
    /// the state. Failing to open the log is a startup error.
    pub fn from_settings(settings: &Settings, diag: ServiceLogger) -> Result<Self, String> {
        let log_dir = settings.layout.log_dir();
        let request_log = RequestLog::open(&log_dir, diag.clone()).map_err(|e| {
            format!("failed to open request log in {}: {e}", log_dir.display())
        })?;
        Ok(Self::new(
            settings.layout.clone(),
            Db::new(settings.dsn.clone(), settings.query_timeout),
            Arc::new(request_log),
            settings.debug,
            diag,
        ))
    }
}

pub fn build_router(state: AppState) -> Router {
    let static_js = ServeDir::new(state.layout.static_js_dir());
    Router::new()
        .route("/data", get(api_data_unnamed))
        .route("/data/", get(api_data_unnamed))
        .route("/data/{name}", get(api_data))
        .nest_service("/js", static_js)
        .fallback(api_view)
        .layer(middleware::from_fn(render_unexpected_errors))
        .layer(middleware::from_fn_with_state(
            state.request_log.clone(),
            log_requests,
        ))
        .with_state(state)
}
