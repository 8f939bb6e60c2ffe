//! HTTP client trait and implementations.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::FetchError;

use super::rate_limiter::RateLimiter;

/// Trait for HTTP clients, enabling mockability in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a URL and decode the body as JSON.
    async fn get_json(&self, url: &str) -> Result<JsonValue, FetchError>;

    /// GET a URL and stream the body into `dest`, returning the number of bytes written.
    ///
    /// On failure no partial file is left behind.
    async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}

/// Parse a URL and require an http or https scheme.
pub fn parse_http_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::UnsupportedScheme(other.to_string())),
    }
}

const USER_AGENT: &str = "Mozilla/5.0 (compatible; Vitrine/1.0)";

/// Configuration for ReqwestClient.
#[derive(Clone)]
pub struct ReqwestClientBuilder {
    rate_limit_ms: u64,
    timeout: Duration,
}

impl Default for ReqwestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestClientBuilder {
    /// Create a new builder with default settings (20s timeout, no rate limiting).
    pub fn new() -> Self {
        Self {
            rate_limit_ms: 0,
            timeout: Duration::from_secs(20),
        }
    }

    /// Set the rate limit delay in milliseconds. 0 disables rate limiting.
    pub fn rate_limit_ms(mut self, ms: u64) -> Self {
        self.rate_limit_ms = ms;
        self
    }

    /// Set the request timeout. Applies to the whole request, body included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the ReqwestClient.
    pub fn build(self) -> Result<ReqwestClient, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(ReqwestClient {
            inner,
            rate_limiter: RateLimiter::new(Duration::from_millis(self.rate_limit_ms)),
        })
    }
}

/// Production HTTP client backed by reqwest.
pub struct ReqwestClient {
    /// reqwest pools connections internally; one client per pipeline.
    inner: reqwest::Client,
    /// Per-host rate limiter.
    rate_limiter: RateLimiter,
}

impl ReqwestClient {
    /// Create a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, reqwest::Error> {
        ReqwestClientBuilder::new().build()
    }

    /// Get a builder for custom configuration.
    pub fn builder() -> ReqwestClientBuilder {
        ReqwestClientBuilder::new()
    }

    async fn send(&self, url: Url) -> Result<reqwest::Response, FetchError> {
        if let Some(host) = url.host_str() {
            self.rate_limiter.wait(host).await;
        }

        // The query string can carry API keys; keep it out of traces.
        tracing::debug!(
            host = url.host_str().unwrap_or(""),
            path = url.path(),
            scheme = url.scheme(),
            "network: GET"
        );
        let response = self.inner.get(url).send().await?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "network: request failed");
            return Err(FetchError::Status(response.status().as_u16()));
        }

        Ok(response)
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_json(&self, url: &str) -> Result<JsonValue, FetchError> {
        let parsed = parse_http_url(url)?;
        let response = self.send(parsed).await?;
        response
            .json::<JsonValue>()
            .await
            .map_err(|e| FetchError::InvalidBody(e.without_url().to_string()))
    }

    async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let parsed = parse_http_url(url)?;
        let mut response = self.send(parsed).await?;

        let guard = PartialFile::new(dest);
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);
        guard.keep();

        tracing::debug!(url, bytes = written, path = %dest.display(), "network: downloaded");
        Ok(written)
    }
}

/// Removes a download target on drop unless `keep` was called.
///
/// Covers early returns and futures dropped mid-stream (e.g. by a timeout).
struct PartialFile<'a> {
    path: &'a Path,
    complete: bool,
}

impl<'a> PartialFile<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            complete: false,
        }
    }

    fn keep(mut self) {
        self.complete = true;
    }
}

impl Drop for PartialFile<'_> {
    fn drop(&mut self) {
        if !self.complete {
            let _ = std::fs::remove_file(self.path);
        }
    }
}

/// Mock response for testing.
#[derive(Clone)]
pub enum MockResponse {
    Json(JsonValue),
    Bytes(Vec<u8>),
    /// Non-success HTTP status.
    Status(u16),
    /// Transport-level failure.
    Error(String),
    /// Never completes; for exercising timeouts.
    Hang,
    /// Writes these bytes to the download target, then never completes.
    Stall(Vec<u8>),
}

/// Mock HTTP client for testing.
pub struct MockClient {
    responses: HashMap<String, MockResponse>,
    requests: AtomicUsize,
}

impl MockClient {
    /// Create a new empty mock client.
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            requests: AtomicUsize::new(0),
        }
    }

    /// Add a response for a URL.
    pub fn with_response(mut self, url: &str, response: MockResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    /// Add a JSON response for a URL.
    pub fn with_json(self, url: &str, json: JsonValue) -> Self {
        self.with_response(url, MockResponse::Json(json))
    }

    /// Add a bytes response for a URL.
    pub fn with_bytes(self, url: &str, bytes: Vec<u8>) -> Self {
        self.with_response(url, MockResponse::Bytes(bytes))
    }

    /// Add a non-success status for a URL.
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_response(url, MockResponse::Status(status))
    }

    /// Add a transport error for a URL.
    pub fn with_error(self, url: &str, error: &str) -> Self {
        self.with_response(url, MockResponse::Error(error.to_string()))
    }

    /// Number of requests made so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    async fn respond(&self, url: &str) -> Result<MockResponse, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        parse_http_url(url)?;

        match self.responses.get(url) {
            Some(MockResponse::Status(status)) => Err(FetchError::Status(*status)),
            Some(MockResponse::Error(e)) => Err(FetchError::Io(std::io::Error::other(e.clone()))),
            Some(MockResponse::Hang) => std::future::pending().await,
            Some(response) => Ok(response.clone()),
            None => Err(FetchError::Status(404)),
        }
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn get_json(&self, url: &str) -> Result<JsonValue, FetchError> {
        match self.respond(url).await? {
            MockResponse::Json(json) => Ok(json),
            MockResponse::Bytes(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| FetchError::InvalidBody(e.to_string()))
            }
            _ => Err(FetchError::InvalidBody("unexpected mock response".to_string())),
        }
    }

    async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let (bytes, stall) = match self.respond(url).await? {
            MockResponse::Bytes(bytes) => (bytes, false),
            MockResponse::Json(json) => (json.to_string().into_bytes(), false),
            MockResponse::Stall(bytes) => (bytes, true),
            _ => return Err(FetchError::InvalidBody("unexpected mock response".to_string())),
        };

        let guard = PartialFile::new(dest);
        tokio::fs::write(dest, &bytes).await?;
        if stall {
            std::future::pending::<()>().await;
        }
        guard.keep();
        Ok(bytes.len() as u64)
    }
}
