use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::db::DEFAULT_QUERY_TIMEOUT;
use crate::layout::Layout;

pub const DEFAULT_PORT: u16 = 9999;

const SERVICE_DISPLAY_NAME_PREFIX: &str = "Dash HTTP Server on Port";
const SERVICE_NAME_PREFIX: &str = "DashHTTPServer_";

/// Everything the server needs once flags and environment are resolved.
#[derive(Debug, Clone)]
pub struct Settings {
    pub layout: Layout,
    pub port: u16,
    pub dsn: String,
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
    pub debug: bool,
    pub query_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Settings {
    pub fn new(layout: Layout, dsn: impl Into<String>) -> Self {
        Self {
            layout,
            port: DEFAULT_PORT,
            dsn: dsn.into(),
            cert: None,
            key: None,
            debug: false,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn service_display_name(&self) -> String {
        service_display_name(self.port)
    }

    /// Explicit cert/key when both are given, otherwise `cert.pem`/`key.pem`
    /// from the root when both exist. `None` means plain HTTP.
    pub fn tls_paths(&self) -> Option<TlsPaths> {
        if let (Some(cert), Some(key)) = (&self.cert, &self.key) {
            return Some(TlsPaths {
                cert: cert.clone(),
                key: key.clone(),
            });
        }
        let cert = self.layout.default_cert();
        let key = self.layout.default_key();
        (cert.is_file() && key.is_file()).then_some(TlsPaths { cert, key })
    }
}

pub fn service_display_name(port: u16) -> String {
    format!("{SERVICE_DISPLAY_NAME_PREFIX} {port}")
}

pub fn service_name(port: u16) -> String {
    format!("{SERVICE_NAME_PREFIX}{port}")
}
