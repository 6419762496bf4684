use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;
use tracing::{error, info, warn};

use crate::app::{AppState, build_router};
use crate::reqlog::RequestLog;

mod tls;

pub use tls::{load_tls_acceptor, serve_tls};

pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// A listener serving the router in a background task.
pub struct RunningServer {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    local_addr: SocketAddr,
    request_log: Arc<RequestLog>,
}

/// Bind `addr` and start serving. Returns once the listener is bound; a bind
/// failure is returned to the caller.
pub async fn start(
    state: AppState,
    addr: SocketAddr,
    tls: Option<TlsAcceptor>,
) -> Result<RunningServer, String> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind HTTP on {addr}: {e}"))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| format!("failed to read bound address: {e}"))?;
    let request_log = state.request_log.clone();
    let app = build_router(state);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = match tls {
        Some(acceptor) => {
            info!(%local_addr, "dash HTTPS listener ready");
            tokio::spawn(serve_tls(listener, acceptor, app, shutdown_rx))
        }
        None => {
            info!(%local_addr, "dash HTTP listener ready");
            tokio::spawn(async move {
                let served = axum::serve(
                    listener,
                    app.into_make_service_with_connect_info::<SocketAddr>(),
                )
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
                if let Err(e) = served {
                    error!(%e, "HTTP server error");
                }
            })
        }
    };

    Ok(RunningServer {
        shutdown: Some(shutdown_tx),
        task,
        local_addr,
        request_log,
    })
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signal shutdown, wait up to [`SHUTDOWN_GRACE`] for in-flight
    /// requests and open connections to finish, then release the request
    /// log. Connections still open after the grace period are aborted, so
    /// no request is served once the log is closed.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut self.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(%e, "server task ended abnormally"),
            Err(_) => {
                warn!(
                    grace_ms = SHUTDOWN_GRACE.as_millis() as u64,
                    "graceful shutdown timed out, aborting server task"
                );
                self.task.abort();
                let _ = (&mut self.task).await;
            }
        }
        self.request_log.close();
    }
}
