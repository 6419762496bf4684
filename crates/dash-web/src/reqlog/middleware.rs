use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::HttpBody;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Local;

use crate::reqlog::{LogEntry, RequestLog};
use crate::util::http::RequestError;

/// Records one log entry per request, error responses included.
///
/// The handler's error slot is taken out of the response here, so the
/// detail is consumed exactly once.
pub async fn log_requests(
    State(log): State<Arc<RequestLog>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let ip = client_ip(&request);

    let mut response = next.run(request).await;

    let message = response.extensions_mut().remove::<RequestError>();
    let response_len = response_len(&response);
    log.record(&LogEntry {
        at: Local::now(),
        latency: started.elapsed(),
        status: response.status().as_u16(),
        ip: &ip,
        method: &method,
        path: &path,
        response_len,
        message: message.as_ref().map(|error| error.0.as_str()),
    });
    response
}

fn client_ip(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn response_len(response: &Response) -> u64 {
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .or_else(|| response.body().size_hint().exact())
        .unwrap_or(0)
}
