// The transport boundary consumed by the orchestration layer.
//
// Everything above this trait deals in parsed JSON and `Option` absence;
// everything below it deals in HTTP.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Error;

/// Query-string pairs for [`RemoteClient::get`].
pub type Query<'a> = &'a [(&'a str, &'a str)];

/// Issues queries and commands against the controller.
///
/// Implementations are stateless per call: no session affinity, no hidden
/// request queue. The controller is the only source of truth.
pub trait RemoteClient: Send + Sync {
    /// Query a path.
    ///
    /// Returns `Ok(None)` when the controller reports the entity absent.
    /// Absence is an expected outcome of convergence polling, not an error.
    fn get(
        &self,
        path: &str,
        query: Query<'_>,
    ) -> impl Future<Output = Result<Option<Value>, Error>> + Send;

    /// Post a command body.
    ///
    /// A successful return only means the controller accepted the command;
    /// it may apply it asynchronously.
    fn post(&self, path: &str, body: &Value) -> impl Future<Output = Result<Value, Error>> + Send;
}

#[allow(clippy::manual_async_fn)]
impl<T> RemoteClient for Arc<T>
where
    T: RemoteClient + ?Sized,
{
    fn get(
        &self,
        path: &str,
        query: Query<'_>,
    ) -> impl Future<Output = Result<Option<Value>, Error>> + Send {
        async move { (**self).get(path, query).await }
    }

    fn post(&self, path: &str, body: &Value) -> impl Future<Output = Result<Value, Error>> + Send {
        async move { (**self).post(path, body).await }
    }
}

#[allow(clippy::manual_async_fn)]
impl<T> RemoteClient for &T
where
    T: RemoteClient + ?Sized,
{
    fn get(
        &self,
        path: &str,
        query: Query<'_>,
    ) -> impl Future<Output = Result<Option<Value>, Error>> + Send {
        async move { (**self).get(path, query).await }
    }

    fn post(&self, path: &str, body: &Value) -> impl Future<Output = Result<Value, Error>> + Send {
        async move { (**self).post(path, body).await }
    }
}
