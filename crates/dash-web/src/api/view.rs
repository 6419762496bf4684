use axum::extract::{Query, State};
use axum::http::{Method, Uri};
use axum::response::{Html, IntoResponse, Response};

use crate::app::AppState;
use crate::params::first_values;
use crate::util::http::{internal_error, not_found};
use crate::views::ViewError;

/// GET /{path}: render a page template with the query parameters as data.
pub async fn api_view(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Query(bag): Query<Vec<(String, String)>>,
) -> Response {
    if method != Method::GET {
        return not_found();
    }
    let path = uri.path().trim_start_matches('/').to_string();
    if path.is_empty() {
        return not_found();
    }

    let views = state.views.clone();
    let data = first_values(&bag);
    match tokio::task::spawn_blocking(move || views.render(&path, &data)).await {
        Ok(Ok(page)) => Html(page).into_response(),
        Ok(Err(ViewError::NotFound)) => not_found(),
        Ok(Err(error)) => internal_error(error.to_string()),
        Err(error) => internal_error(format!("view worker join error: {error}")),
    }
}
