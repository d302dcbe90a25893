//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use lfctl_config::ConfigError;
use lfctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    /// Validation, controller, and convergence-timeout failures alike.
    pub const FAILURE: i32 = 1;
    /// Argument parsing failures, reported by clap itself.
    pub const USAGE: i32 = 2;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the manager at {url}")]
    #[diagnostic(
        code(lfctl::connection_failed),
        help(
            "Check that the manager is running and its JSON API port is open.\n\
             Override with --mgr HOST --mgr_port PORT."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: lfctl_api::Error,
    },

    #[error("Controller rejected the call (HTTP {status}): {message}")]
    #[diagnostic(code(lfctl::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unexpected controller response: {message}")]
    #[diagnostic(
        code(lfctl::bad_response),
        help("The controller's answer did not have the expected shape. Re-run with --debug.")
    )]
    BadResponse { message: String },

    // ── Convergence ──────────────────────────────────────────────────
    #[error("{entity} {what} after {elapsed}")]
    #[diagnostic(
        code(lfctl::timeout),
        help(
            "The command was accepted but the controller never showed the change.\n\
             Raise the timeouts under [defaults] or check the controller's event log:\n\
             lfctl events list"
        )
    )]
    Timeout {
        entity: String,
        what: String,
        elapsed: String,
    },

    #[error("Name '{name}' cannot be reused: {reason}")]
    #[diagnostic(
        code(lfctl::stale_name),
        help(
            "The old entity is still known to the controller.\n\
             Remove it first, or clear leftovers with: lfctl phantom sweep"
        )
    )]
    StaleName { name: String, reason: String },

    #[error("{message}")]
    #[diagnostic(code(lfctl::lifecycle))]
    Lifecycle { message: String },

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(lfctl::not_found),
        help("Run: lfctl {list_command} to see what the controller reports")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lfctl::validation))]
    Validation { field: String, reason: String },

    #[error("Unknown flag '{flag}' in {namespace}")]
    #[diagnostic(
        code(lfctl::unknown_flag),
        help("Flag names are case sensitive and belong to exactly one namespace.")
    )]
    UnknownFlag { namespace: String, flag: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(lfctl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Config file: {path}"
        )
    )]
    ProfileNotFound {
        name: String,
        available: String,
        path: String,
    },

    #[error(transparent)]
    #[diagnostic(code(lfctl::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON rendering failed: {0}")]
    #[diagnostic(code(lfctl::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    #[diagnostic(code(lfctl::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        exit_code::FAILURE
    }
}

fn human(elapsed: Duration) -> String {
    humantime::format_duration(elapsed).to_string()
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name, available } => CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
                path: lfctl_config::config_path().display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MalformedEid { input, reason } => CliError::Validation {
                field: "eid".into(),
                reason: format!("'{input}': {reason}"),
            },

            CoreError::UnknownFlag { namespace, flag } => CliError::UnknownFlag {
                namespace: namespace.to_string(),
                flag,
            },

            CoreError::FlagTable { namespace, reason } => CliError::Validation {
                field: format!("{namespace} table"),
                reason,
            },

            CoreError::Validation { field, reason } => CliError::Validation { field, reason },

            err @ (CoreError::InvalidTransition { .. } | CoreError::Unsupported { .. }) => {
                CliError::Lifecycle {
                    message: err.to_string(),
                }
            }

            CoreError::CreationTimeout { entity, elapsed } => CliError::Timeout {
                entity,
                what: "did not appear".into(),
                elapsed: human(elapsed),
            },

            CoreError::StillPresent { entity, elapsed } => CliError::Timeout {
                entity,
                what: "was still present".into(),
                elapsed: human(elapsed),
            },

            CoreError::ConvergenceTimeout {
                entity,
                target,
                elapsed,
            } => CliError::Timeout {
                entity,
                what: format!("did not reach {target}"),
                elapsed: human(elapsed),
            },

            CoreError::StaleName { name, reason } => CliError::StaleName { name, reason },

            CoreError::MalformedResponse { context, message } => CliError::BadResponse {
                message: format!("{context}: {message}"),
            },

            CoreError::Remote(lfctl_api::Error::RemoteCall { status_code, body }) => {
                CliError::ApiError {
                    status: status_code,
                    message: body,
                }
            }

            CoreError::Remote(source) => CliError::ConnectionFailed {
                url: source_url(&source),
                source,
            },
        }
    }
}

fn source_url(err: &lfctl_api::Error) -> String {
    match err {
        lfctl_api::Error::Transport(e) => e
            .url()
            .map_or_else(|| "(unknown)".into(), ToString::to_string),
        _ => "(unknown)".into(),
    }
}
