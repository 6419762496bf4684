use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Dispatch;

/// Diagnostic channel of the running service.
///
/// This is separate from the request log. The handle is cloned into every
/// component that reports lifecycle or failure messages; all of them go
/// through one exclusive lock so messages from the lifecycle hooks and from
/// request paths never interleave.
#[derive(Clone)]
pub struct ServiceLogger {
    inner: Arc<Mutex<LoggerInner>>,
}

struct LoggerInner {
    display_name: String,
    dispatch: Dispatch,
}

impl ServiceLogger {
    pub fn new(display_name: impl Into<String>, dispatch: Dispatch) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LoggerInner {
                display_name: display_name.into(),
                dispatch,
            })),
        }
    }

    /// A logger that drops everything. Used by tests and tools.
    pub fn discard(display_name: impl Into<String>) -> Self {
        Self::new(display_name, Dispatch::none())
    }

    pub fn display_name(&self) -> String {
        self.inner.lock().display_name.clone()
    }

    pub fn info(&self, message: impl fmt::Display) {
        let inner = self.inner.lock();
        tracing::dispatcher::with_default(&inner.dispatch, || {
            tracing::info!(service = %inner.display_name, "{message}");
        });
    }

    pub fn warn(&self, message: impl fmt::Display) {
        let inner = self.inner.lock();
        tracing::dispatcher::with_default(&inner.dispatch, || {
            tracing::warn!(service = %inner.display_name, "{message}");
        });
    }

    pub fn error(&self, message: impl fmt::Display) {
        let inner = self.inner.lock();
        tracing::dispatcher::with_default(&inner.dispatch, || {
            tracing::error!(service = %inner.display_name, "{message}");
        });
    }
}

impl fmt::Debug for ServiceLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceLogger")
            .field("display_name", &self.display_name())
            .finish_non_exhaustive()
    }
}
