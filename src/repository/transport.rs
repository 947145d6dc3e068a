// src/repository/transport.rs

//! Network retrieval for repository index files
//!
//! The fetcher only needs "give me the bytes at this URL", so retrieval sits
//! behind the [`Transport`] trait. [`HttpTransport`] is the real
//! implementation; tests script responses with their own transports.

use crate::error::{self, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_ENCODING;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default timeout for HTTP requests (30 seconds)
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every index request
pub const USER_AGENT: &str = concat!("cyweb/", env!("CARGO_PKG_VERSION"));

/// A completed HTTP exchange, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// Value of the `Content-Encoding` header, if any
    pub content_encoding: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    /// A 200 response with the given body and no content encoding
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_encoding: None,
            body: body.into(),
        }
    }

    /// An empty response with the given status
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            content_encoding: None,
            body: Vec::new(),
        }
    }

    pub fn with_content_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.content_encoding = Some(encoding.into());
        self
    }

    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the server declared the body as gzip-encoded
    pub fn is_gzip_encoded(&self) -> bool {
        self.content_encoding
            .as_deref()
            .is_some_and(|e| e.trim().eq_ignore_ascii_case("gzip"))
    }
}

/// The request never produced a response (DNS, connect, TLS, timeout, ...)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Network retrieval capability
pub trait Transport: Send + Sync {
    /// Retrieve `url`
    ///
    /// Non-2xx statuses are returned as responses, not errors; only failures
    /// to get any response at all are reported as [`TransportError`].
    fn get(&self, url: &str) -> std::result::Result<Response, TransportError>;
}

/// Transport settings
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: HTTP_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// [`Transport`] backed by a blocking reqwest client
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(&FetchConfig::default())
    }

    pub fn with_config(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| error::Error::InitError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> std::result::Result<Response, TransportError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TransportError(format!("Failed to download {}: {}", url, e)))?;

        let status = response.status().as_u16();
        let content_encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .map_err(|e| TransportError(format!("Failed to read response from {}: {}", url, e)))?;

        debug!("{} -> HTTP {} ({} bytes)", url, status, body.len());
        Ok(Response {
            status,
            content_encoding,
            body: body.to_vec(),
        })
    }
}
