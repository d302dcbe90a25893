// Shared transport configuration for building reqwest::Client instances.
//
// The controller's JSON API is plain HTTP on port 8080 by default; HTTPS
// deployments usually run with self-signed certificates.

use std::time::Duration;

use crate::error::Error;

pub const DEFAULT_MGR_PORT: u16 = 8080;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout. Convergence waits are bounded separately by
    /// the core crate; this only caps a single HTTP exchange.
    pub timeout: Duration,
    /// Accept any certificate (for self-signed HTTPS controllers).
    pub accept_invalid_certs: bool,
    /// Add `suppress_preexec_cli` / `suppress_preexec_method` to every
    /// command body so the controller skips its pre-exec echo.
    pub suppress_preexec: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
            suppress_preexec: true,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("lfctl/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }
}

/// Build the controller base URL from a host (or full URL) and port.
///
/// `--mgr` accepts either a bare host (`192.168.100.1`) or a URL
/// (`http://lf1:8080`). A bare host gets `http://` and `port`; a URL keeps
/// its own scheme and port.
pub fn manager_url(mgr: &str, port: u16) -> Result<url::Url, Error> {
    if mgr.starts_with("http://") || mgr.starts_with("https://") {
        return Ok(url::Url::parse(mgr)?);
    }
    Ok(url::Url::parse(&format!("http://{mgr}:{port}/"))?)
}
