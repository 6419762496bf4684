use std::net::SocketAddr;

use crate::app::AppState;
use crate::config::{Settings, service_name};
use crate::diag::ServiceLogger;
use crate::server::{RunningServer, load_tls_acceptor, start};

/// Start/stop hooks for the report server.
///
/// Interactive runs call `start`, wait for an interrupt and call `stop`. A
/// service manager drives the same two hooks.
pub struct Program {
    settings: Settings,
    logger: ServiceLogger,
    running: Option<RunningServer>,
}

impl Program {
    pub fn new(settings: Settings, logger: ServiceLogger) -> Self {
        Self {
            settings,
            logger,
            running: None,
        }
    }

    /// Bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(RunningServer::local_addr)
    }

    pub async fn start(&mut self, interactive: bool) -> Result<(), String> {
        if self.running.is_some() {
            return Err(format!(
                "service \"{}\" is already running",
                self.logger.display_name()
            ));
        }
        let name = self.logger.display_name();
        if interactive {
            self.logger
                .info(format_args!("Service \"{name}\" is running in terminal."));
        } else {
            self.logger.info(format_args!(
                "Service \"{name}\" is running as {}.",
                service_name(self.settings.port)
            ));
        }

        let state = AppState::from_settings(&self.settings, self.logger.clone())?;
        let tls = match self.settings.tls_paths() {
            Some(paths) => Some(load_tls_acceptor(&paths.cert, &paths.key)?),
            None => {
                self.logger.warn(format_args!(
                    "no TLS certificate found (looked for {} and {}), serving plain HTTP",
                    self.settings.layout.default_cert().display(),
                    self.settings.layout.default_key().display()
                ));
                None
            }
        };

        let running = start(state, self.settings.listen_addr(), tls).await?;
        self.logger.info(format_args!(
            "Service \"{name}\" is started on {}.",
            running.local_addr()
        ));
        self.running = Some(running);
        Ok(())
    }

    /// No-op when not running.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        let name = self.logger.display_name();
        self.logger.info(format_args!("Service \"{name}\" is stopping."));
        running.stop().await;
        self.logger.info(format_args!("Service \"{name}\" is stopped."));
    }
}
