use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Per-request error slot.
///
/// Handlers attach it to a failing response; the request logger takes it
/// back out for the entry's message field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError(pub String);

const UNEXPECTED_INTERNAL_ERROR: &str = "(Unexpected) internal server error";

pub fn render_internal_error(detail: Option<&str>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => format!("Internal server error: {detail}"),
        _ => UNEXPECTED_INTERNAL_ERROR.to_string(),
    }
}

pub fn internal_error(detail: impl Into<String>) -> Response {
    let detail = detail.into();
    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_internal_error(Some(&detail)),
    )
        .into_response();
    response.extensions_mut().insert(RequestError(detail));
    response
}

pub fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Not Found",
    )
        .into_response()
}

/// JSON rows response with the no-cache and CORS headers report clients
/// expect.
pub fn json_rows_ok(body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::PRAGMA, "no-cache"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        body,
    )
        .into_response()
}

/// Replace the body of any 500 that carries no recorded detail.
pub async fn render_unexpected_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::INTERNAL_SERVER_ERROR
        || response.extensions().get::<RequestError>().is_some()
    {
        return response;
    }
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    Response::from_parts(parts, render_internal_error(None).into())
}
