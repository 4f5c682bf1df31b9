//! # HTTP Transport
//!
//! Sends one JSON request to the REST backend and returns the JSON answer.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         One Request                                     │
//! │                                                                         │
//! │  ApiRequest { GET, "/products/p1" }                                     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  base_url + path ──► reqwest (Content-Type: application/json)           │
//! │        │                                                                │
//! │        ├── no response ────────► QueryError::Network / Timeout          │
//! │        │                                                                │
//! │        ├── 2xx, empty body ────► Value::Null                            │
//! │        ├── 2xx, JSON body ─────► Value                                  │
//! │        ├── 2xx, not JSON ──────► QueryError::Decode                     │
//! │        │                                                                │
//! │        └── non-2xx ────────────► QueryError::Http { status, message }   │
//! │                                  message = body.message                 │
//! │                                         or "Something went wrong"       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Retrying is the caller's business; this layer sends exactly once.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::QueryConfig;
use crate::error::{map_reqwest_error, QueryError, QueryResult, DEFAULT_ERROR_MESSAGE};

// =============================================================================
// Request
// =============================================================================

/// HTTP verbs the backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// True when sending the request twice has the same effect as once.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Method::Get | Method::Put | Method::Delete)
    }

    fn as_reqwest(&self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A request relative to the backend base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute path, e.g. `/products/p1`.
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path, None)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path, Some(body))
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path, Some(body))
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Patch, path, Some(body))
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path, None)
    }

    fn new(method: Method, path: impl Into<String>, body: Option<Value>) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            body,
        }
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

// =============================================================================
// Transport Trait
// =============================================================================

/// Sends requests to the backend.
///
/// The query client only talks to this trait, so tests can script responses
/// without a server.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: &ApiRequest) -> QueryResult<Value>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// [`Transport`] over HTTP using reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Builds a transport from the loaded configuration.
    pub fn new(config: &QueryConfig) -> QueryResult<Self> {
        Self::with_base_url(config.base_url()?, config.request_timeout())
    }

    /// Builds a transport for an explicit base URL.
    pub fn with_base_url(base_url: Url, timeout: Option<Duration>) -> QueryResult<Self> {
        let mut builder =
            Client::builder().user_agent(concat!("stockbook/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| QueryError::InvalidConfig(e.to_string()))?;

        Ok(HttpTransport { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins the base URL and a resource path, keeping any base path prefix.
    ///
    /// Fails when parsing would rewrite the path (`.` or `..` segments), since
    /// the request would then reach a different resource.
    fn url_for(&self, path: &str) -> QueryResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let url = Url::parse(&format!("{}/{}", base, path))?;

        let expected = format!("{}/{}", self.base_url.path().trim_end_matches('/'), path);
        if url.path() != expected {
            return Err(QueryError::Encode(format!(
                "path /{} does not address a single resource",
                path
            )));
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> QueryResult<Value> {
        let url = self.url_for(&request.path)?;
        debug!(method = %request.method, %url, "Sending request");

        let mut builder = self
            .http
            .request(request.method.as_reqwest(), url)
            .header("content-type", "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let res = builder.send().await.map_err(map_reqwest_error)?;
        let status = res.status();
        let text = res.text().await.map_err(map_reqwest_error)?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| QueryError::Decode(e.to_string()));
        }

        Err(QueryError::Http {
            status: status.as_u16(),
            message: error_message(&text),
        })
    }
}

/// Picks the backend's `message` out of an error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
}
