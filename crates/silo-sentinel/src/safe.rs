//! HTTP client for the Safe REST surface.
//!
//! A thin wrapper over `reqwest` that attaches a fresh correlation id to
//! every request and treats the request timeout as the caller's deadline.
//! Connectivity and timeout failures come back wrapped with operation
//! context; callers may retry those.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::Value;

/// Header carrying the transport-verified peer identity. Only honored by
/// a dev listener without an mTLS terminator in front.
pub const PEER_ID_HEADER: &str = "x-silo-peer-id";

/// Header carrying the per-request correlation id.
pub const CORRELATION_ID_HEADER: &str = "x-silo-correlation-id";

/// Client for the Safe server.
pub struct SafeClient {
    http: reqwest::Client,
    addr: String,
    peer_id: Option<String>,
}

impl SafeClient {
    /// Build a client for the given server address.
    ///
    /// The timeout bounds the whole request; when it fires the operation
    /// failed as far as the operator is concerned.
    pub fn new(addr: String, peer_id: Option<String>, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            addr,
            peer_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.addr)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, self.url(path))
            .header(CORRELATION_ID_HEADER, uuid::Uuid::new_v4().to_string());
        if let Some(ref id) = self.peer_id {
            builder = builder.header(PEER_ID_HEADER, id);
        }
        builder
    }

    /// Verify Safe is reachable and accepting operator calls by listing
    /// secrets and expecting success.
    pub async fn check(&self) -> Result<()> {
        self.get("/v1/sentinel/secrets").await.map(|_| ())
    }

    /// GET a path, returning the parsed JSON body (Null when empty).
    pub async fn get(&self, path: &str) -> Result<Value> {
        let resp = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .with_context(|| format!("GET {path}: request failed"))?;
        handle_response(resp).await
    }

    /// PUT a JSON body to a path.
    pub async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        let resp = self
            .request(reqwest::Method::PUT, path)
            .json(body)
            .send()
            .await
            .with_context(|| format!("PUT {path}: request failed"))?;
        handle_response(resp).await
    }

    /// DELETE with a JSON body.
    pub async fn delete(&self, path: &str, body: &Value) -> Result<Value> {
        let resp = self
            .request(reqwest::Method::DELETE, path)
            .json(body)
            .send()
            .await
            .with_context(|| format!("DELETE {path}: request failed"))?;
        handle_response(resp).await
    }
}

async fn handle_response(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let body = resp.text().await.context("failed to read response body")?;
    if !status.is_success() {
        match status {
            reqwest::StatusCode::SERVICE_UNAVAILABLE => {
                bail!("Safe is not ready (root key unset)")
            }
            reqwest::StatusCode::UNAUTHORIZED => {
                bail!("not authorized — is your identity in the sentinel namespace?")
            }
            _ => bail!("server returned {status}: {body}"),
        }
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).context("failed to parse response JSON")
}
