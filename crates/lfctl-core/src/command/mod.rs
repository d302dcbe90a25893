// ── Command dispatch ──
//
// Every mutation is a POST of a typed body to `/cli-json/{NAME}`. A
// successful post only means the controller accepted the command.

pub mod requests;

use lfctl_api::RemoteClient;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::CoreError;

/// A command body with its `/cli-json` name.
pub trait CliCommand: Serialize {
    const NAME: &'static str;

    fn path() -> String {
        format!("/cli-json/{}", Self::NAME)
    }
}

/// Serialize and post a command. No retry.
pub async fn post_command<C, R>(client: &C, command: &R) -> Result<Value, CoreError>
where
    C: RemoteClient,
    R: CliCommand + Sync,
{
    let body = serde_json::to_value(command).map_err(|e| CoreError::Validation {
        field: R::NAME.into(),
        reason: e.to_string(),
    })?;
    debug!(command = R::NAME, "posting command");
    Ok(client.post(&R::path(), &body).await?)
}
