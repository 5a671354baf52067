//! HTTP access to the hub with one error shape for every failure.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{header, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::defaults::Defaults;
use crate::error::{Error, Result};

/// Query string pairs. Optional values that are `None` are never added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query(Vec<(&'static str, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    pub fn opt<T: ToString>(self, key: &'static str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }
}

/// Read/write access to the hub's versioned HTTP API.
#[async_trait]
pub trait HubTransport: Send + Sync {
    /// One GET of `/v1{path}`.
    async fn read(&self, path: &str, query: &Query) -> Result<Value>;

    /// One POST of a binary payload to `/v1{path}`.
    async fn write(&self, path: &str, body: Vec<u8>) -> Result<Value>;
}

/// Retry budget for transient failures (connection errors, timeouts, 502/503/504).
/// Writes only retry connection errors.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: Defaults::RETRY_ATTEMPTS,
            base_delay: Defaults::RETRY_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { attempts: 1, base_delay: Duration::ZERO }
    }

    /// Exponential backoff plus up to one `base_delay` of jitter.
    fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_millis() as u64;
        let exp = base.saturating_mul(1u64 << (attempt - 1).min(10));
        let jitter = if base == 0 { 0 } else { rand::thread_rng().gen_range(0..=base) };
        Duration::from_millis(exp + jitter)
    }
}

pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(hub_url: &str) -> Result<Self> {
        Self::with_options(hub_url, Defaults::REQUEST_TIMEOUT, RetryPolicy::default())
    }

    pub fn with_options(hub_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("building HTTP client: {e}")))?;
        Ok(Self {
            base_url: hub_url.trim_end_matches('/').to_string(),
            client,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }

    /// Non-idempotent requests are resent only when the connection was never
    /// established; a timed-out or 5xx POST may already have been merged.
    async fn send_with_retry<F>(&self, what: &str, idempotent: bool, make_request: F) -> Result<Value>
    where
        F: Fn() -> RequestBuilder,
    {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let retry_reason = match make_request().send().await {
                Ok(resp) if resp.status().is_success() => return decode_body(resp).await,
                Ok(resp) => {
                    let status = resp.status();
                    let err = normalize_error(resp).await;
                    if !idempotent || !is_retryable_status(status) || attempt >= attempts {
                        return Err(err);
                    }
                    err.to_string()
                }
                Err(e) => {
                    let transient = e.is_connect() || (idempotent && e.is_timeout());
                    if !transient || attempt >= attempts {
                        return Err(Error::Transport(format!("{what}: {e}")));
                    }
                    e.to_string()
                }
            };

            let delay = self.retry.delay(attempt);
            warn!(%what, attempt, ?delay, reason = %retry_reason, "hub request failed, retrying");
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl HubTransport for HttpTransport {
    async fn read(&self, path: &str, query: &Query) -> Result<Value> {
        let url = self.url(path);
        debug!(%url, query = ?query.pairs(), "hub GET");
        self.send_with_retry(path, true, || self.client.get(&url).query(query.pairs()))
            .await
    }

    async fn write(&self, path: &str, body: Vec<u8>) -> Result<Value> {
        let url = self.url(path);
        debug!(%url, bytes = body.len(), "hub POST");
        self.send_with_retry(path, false, || {
            self.client
                .post(&url)
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .body(body.clone())
        })
        .await
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

async fn decode_body(resp: Response) -> Result<Value> {
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| Error::Transport(format!("reading hub response: {e}")))?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|e| Error::decode(format!("hub response: {e}")))
}

async fn normalize_error(resp: Response) -> Error {
    let status = resp.status();
    let reason = status.canonical_reason().unwrap_or("").to_string();
    let body = resp.text().await.unwrap_or_default();
    let mut detail = error_detail(&body, &reason);
    if detail.is_empty() {
        detail = format!("HTTP {}", status.as_u16());
    }
    Error::Network { status: status.as_u16(), detail }
}

/// Human-readable detail from a hub error body.
///
/// `{errCode, detail|message}` gives `"errCode: detail"`; a body with only
/// `detail`/`message` gives that text; other JSON is echoed compactly; a
/// non-JSON body is returned trimmed; an empty body falls back to `reason`.
pub fn error_detail(body: &str, reason: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => {
            let field = |k: &str| {
                map.get(k)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            let message = field("detail").or_else(|| field("message"));
            match (field("errCode"), message) {
                (Some(code), Some(m)) => format!("{code}: {m}"),
                (Some(code), None) => code,
                (None, Some(m)) => m,
                (None, None) => Value::Object(map).to_string(),
            }
        }
        Ok(other) => other.to_string(),
        Err(_) => {
            let raw = body.trim();
            if raw.is_empty() {
                reason.to_string()
            } else {
                raw.to_string()
            }
        }
    }
}
