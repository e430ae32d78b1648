//! Resilient request execution.
//!
//! This module wraps a single network call with a per-attempt deadline and a
//! bounded exponential backoff retry policy. The actual I/O sits behind the
//! [`Transport`] trait so the executor can be driven by `reqwest` in
//! production and by scripted transports in tests.

pub mod backoff;
pub mod executor;
pub mod http;

pub use backoff::RetryPolicy;
pub use executor::{AttemptObserver, RequestAttempt, RequestExecutor};
pub use http::HttpTransport;

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::FailureReason;

/// HTTP method of a request. The backend only uses these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// Method, headers and body of a request. Opaque to the executor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    /// A bodiless GET.
    pub fn get() -> Self {
        Self::default()
    }

    /// A POST with a JSON body.
    pub fn post(body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body),
        }
    }
}

/// A response as seen by the executor: status plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FailureReason> {
        serde_json::from_str(&self.body).map_err(|e| FailureReason::decode(e.to_string()))
    }
}

/// Performs a single network call.
///
/// Implementations return `Ok` for any response that arrived, whatever its
/// status, and `Err(FailureReason::Network)` when no response arrived.
/// Deadlines are enforced by the executor, not the transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request to `target` (an absolute URL).
    async fn send(&self, target: &str, options: &RequestOptions)
        -> Result<ApiResponse, FailureReason>;
}
