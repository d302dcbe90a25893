// ── Core error types ──
//
// Errors raised by the orchestration layer. Local validation failures
// (identifiers, flags, transitions) are raised before any network call.
// Transport failures from `lfctl-api` are wrapped, never retried.

use std::time::Duration;

use thiserror::Error;

use crate::flags::Namespace;
use crate::lifecycle::LifecycleState;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Local validation ─────────────────────────────────────────────
    #[error("Malformed EID '{input}': {reason}")]
    MalformedEid { input: String, reason: String },

    #[error("Unknown flag '{flag}' in namespace {namespace}")]
    UnknownFlag { namespace: Namespace, flag: String },

    #[error("Invalid flag table {namespace}: {reason}")]
    FlagTable { namespace: Namespace, reason: String },

    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Cannot {action} {entity} while it is {state}")]
    InvalidTransition {
        entity: String,
        state: LifecycleState,
        action: &'static str,
    },

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    // ── Convergence ──────────────────────────────────────────────────
    #[error("{entity} did not appear within {elapsed:?}")]
    CreationTimeout { entity: String, elapsed: Duration },

    #[error("{entity} still present after {elapsed:?}")]
    StillPresent { entity: String, elapsed: Duration },

    #[error("{entity} did not reach {target} within {elapsed:?}")]
    ConvergenceTimeout {
        entity: String,
        target: String,
        elapsed: Duration,
    },

    #[error("Name '{name}' cannot be reused: {reason}")]
    StaleName { name: String, reason: String },

    // ── Controller data ──────────────────────────────────────────────
    #[error("Unexpected controller response for {context}: {message}")]
    MalformedResponse { context: String, message: String },

    // ── Transport (wrapped, not retried) ─────────────────────────────
    #[error(transparent)]
    Remote(#[from] lfctl_api::Error),
}

impl CoreError {
    pub(crate) fn malformed(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            context: context.into(),
            message: message.into(),
        }
    }
}
