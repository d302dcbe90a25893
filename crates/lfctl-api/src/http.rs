// HTTP implementation of the control API boundary
//
// Wraps `reqwest::Client` with URL construction, absence detection, and
// command-body decoration. Queries map "not there" answers to `None`;
// commands map non-2xx answers to `Error::RemoteCall`. Nothing is retried.

use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::remote::{Query, RemoteClient};
use crate::transport::TransportConfig;

/// Raw HTTP client for the controller's JSON API.
///
/// Holds no per-call state beyond the connection pool inside
/// `reqwest::Client`, so it can be shared freely between components.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
    suppress_preexec: bool,
}

impl HttpClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the controller root, e.g. `http://192.168.100.1:8080/`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: normalize_base(base_url),
            suppress_preexec: transport.suppress_preexec,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url: normalize_base(base_url),
            suppress_preexec: false,
        }
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Resolve an API path (`/port/1/1/sta0000`, `cli-json/add_sta`)
    /// against the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── Body helpers ─────────────────────────────────────────────────

    fn decorate(&self, body: &Value) -> Value {
        let mut body = body.clone();
        if self.suppress_preexec {
            if let Value::Object(map) = &mut body {
                map.insert("suppress_preexec_cli".into(), Value::Bool(true));
                map.insert("suppress_preexec_method".into(), Value::Bool(true));
            }
        }
        body
    }
}

impl RemoteClient for HttpClient {
    async fn get(&self, path: &str, query: Query<'_>) -> Result<Option<Value>, Error> {
        let mut url = self.url(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            trace!(path, "controller reports entity absent");
            return Ok(None);
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        if !status.is_success() {
            return Err(Error::RemoteCall {
                status_code: status.as_u16(),
                body: preview(&body),
            });
        }

        parse_optional(&body)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, Error> {
        let url = self.url(path)?;
        debug!("POST {}", url);
        trace!(body = %body, "command body");

        let resp = self
            .http
            .post(url)
            .json(&self.decorate(body))
            .send()
            .await
            .map_err(Error::Transport)?;
        let status = resp.status();
        let text = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::RemoteCall {
                status_code: status.as_u16(),
                body: preview(&text),
            });
        }

        Ok(parse_optional(&text)?.unwrap_or(Value::Null))
    }
}

fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Decode a response body, mapping empty bodies and JSON `null` to `None`.
fn parse_optional(body: &str) -> Result<Option<Value>, Error> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })?;
    Ok(if value.is_null() { None } else { Some(value) })
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = normalize_base(Url::parse("http://lf1:8080/api").unwrap());
        assert_eq!(url.as_str(), "http://lf1:8080/api/");
    }

    #[test]
    fn null_and_empty_bodies_are_absent() {
        assert!(parse_optional("").unwrap().is_none());
        assert!(parse_optional("  \n").unwrap().is_none());
        assert!(parse_optional("null").unwrap().is_none());
        assert!(parse_optional("{}").unwrap().is_some());
    }

    #[test]
    fn malformed_body_keeps_raw_text() {
        match parse_optional("{not json") {
            Err(Error::Deserialization { body, .. }) => assert_eq!(body, "{not json"),
            other => panic!("expected Deserialization error, got: {other:?}"),
        }
    }

    #[test]
    fn decorate_adds_suppress_keys_only_to_objects() {
        let client = HttpClient {
            http: reqwest::Client::new(),
            base_url: Url::parse("http://lf1:8080/").unwrap(),
            suppress_preexec: true,
        };
        let body = client.decorate(&serde_json::json!({ "shelf": 1 }));
        assert_eq!(body["suppress_preexec_cli"], Value::Bool(true));
        assert_eq!(body["shelf"], 1);

        let scalar = client.decorate(&Value::from(3));
        assert_eq!(scalar, Value::from(3));
    }
}
