use thiserror::Error;

/// Top-level error type for the `lfctl-api` crate.
///
/// Covers every failure mode of the control API transport: connection
/// problems, non-2xx command responses, and undecodable bodies.
/// `lfctl-core` wraps these without retrying.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP client construction failed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Controller ──────────────────────────────────────────────────
    /// The controller answered a query or command with a non-2xx status.
    #[error("Controller rejected call (HTTP {status_code}): {body}")]
    RemoteCall { status_code: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error a caller might retry.
    ///
    /// This crate never retries on its own.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::RemoteCall { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }

    /// HTTP status of a rejected call, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RemoteCall { status_code, .. } => Some(*status_code),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
