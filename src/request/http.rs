//! `reqwest`-backed transport.

use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;

use super::{ApiResponse, Method, RequestOptions, Transport};
use crate::error::FailureReason;

/// Transport that sends requests with a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with a default client.
    pub fn new() -> Result<Self, FailureReason> {
        let client = Client::builder()
            .user_agent(concat!("redsol/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FailureReason::network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        target: &str,
        options: &RequestOptions,
    ) -> Result<ApiResponse, FailureReason> {
        let mut request = match options.method {
            Method::Get => self.client.get(target),
            Method::Post => self.client.post(target),
        };
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FailureReason::network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FailureReason::network(format!("Failed to read response body: {}", e)))?;
        trace!(target_url = target, status, bytes = body.len(), "Response received");

        Ok(ApiResponse { status, body })
    }
}
