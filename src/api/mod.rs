//! Typed client for the ISP management backend.
//!
//! Every endpoint goes through the [`RequestExecutor`], so all of them share
//! the same deadline and retry policy. Failures come back as raw
//! [`FailureReason`]s; classification is left to the caller.

pub mod models;

pub use models::*;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::{ApiConfig, ConfigError};
use crate::error::FailureReason;
use crate::request::{RequestExecutor, RequestOptions, Transport};

/// Result type for API calls.
pub type ApiResult<T> = Result<T, FailureReason>;

/// Client for both API surfaces.
#[derive(Debug, Clone)]
pub struct ApiClient {
    executor: RequestExecutor,
    base: Url,
    v2_base: Url,
    timeout: Duration,
    max_retries: u32,
}

fn parse_base(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value)
        .ok()
        .filter(|url| !url.cannot_be_a_base())
        .ok_or_else(|| ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        })
}

impl ApiClient {
    /// Creates a client from configuration and a transport.
    pub fn new(config: &ApiConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        let executor = RequestExecutor::new(transport).with_policy(config.retry_policy());
        Self::with_executor(config, executor)
    }

    /// Creates a client around an existing executor.
    pub fn with_executor(config: &ApiConfig, executor: RequestExecutor) -> Result<Self, ConfigError> {
        Ok(Self {
            executor,
            base: parse_base("api.base_url", &config.base_url)?,
            v2_base: parse_base("api.v2_base_url", &config.v2_base_url)?,
            timeout: config.timeout(),
            max_retries: config.max_retries,
        })
    }

    /// Joins path segments onto a base URL, percent-encoding each segment.
    fn endpoint(base: &Url, segments: &[&str]) -> Url {
        let mut url = base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn call<T: DeserializeOwned>(&self, url: Url, options: RequestOptions) -> ApiResult<T> {
        debug!(url = %url, method = %options.method, "API call");
        let response = self
            .executor
            .execute(url.as_str(), &options, self.timeout, self.max_retries)
            .await?;
        response.json()
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        self.call(url, RequestOptions::get()).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, url: Url, body: &B) -> ApiResult<T> {
        let body = serde_json::to_value(body).map_err(|e| FailureReason::decode(e.to_string()))?;
        self.call(url, RequestOptions::post(body)).await
    }

    /// `GET /dashboard`
    pub async fn dashboard(&self) -> ApiResult<DashboardSummary> {
        self.get(Self::endpoint(&self.base, &["dashboard"])).await
    }

    /// `POST /chat`
    pub async fn chat(&self, request: &ChatRequest) -> ApiResult<ChatReply> {
        self.post(Self::endpoint(&self.base, &["chat"]), request).await
    }

    /// `GET /clients`
    pub async fn clients(&self) -> ApiResult<Listing<Client>> {
        self.get(Self::endpoint(&self.base, &["clients"])).await
    }

    /// `GET /clients?search=<term>`
    pub async fn search_clients(&self, term: &str) -> ApiResult<Listing<Client>> {
        let mut url = Self::endpoint(&self.base, &["clients"]);
        url.query_pairs_mut().append_pair("search", term);
        self.get(url).await
    }

    /// `POST /clients`
    pub async fn create_client(&self, client: &NewClient) -> ApiResult<Ack> {
        self.post(Self::endpoint(&self.base, &["clients"]), client)
            .await
    }

    /// `GET /prospects`
    pub async fn prospects(&self) -> ApiResult<Listing<Prospect>> {
        self.get(Self::endpoint(&self.base, &["prospects"])).await
    }

    /// `GET /auth/users`
    pub async fn owners(&self) -> ApiResult<Vec<Owner>> {
        let response: OwnersResponse = self
            .get(Self::endpoint(&self.base, &["auth", "users"]))
            .await?;
        Ok(response.owners)
    }

    /// `POST /auth/login`
    pub async fn login(&self, owner_name: &str) -> ApiResult<LoginResponse> {
        self.post(
            Self::endpoint(&self.base, &["auth", "login"]),
            &LoginRequest { owner_name },
        )
        .await
    }

    /// `POST /auth/logout`
    pub async fn logout(&self, session_id: &str) -> ApiResult<Ack> {
        self.post(
            Self::endpoint(&self.base, &["auth", "logout"]),
            &LogoutRequest { session_id },
        )
        .await
    }

    /// `GET /system/status` (v2)
    pub async fn system_status(&self) -> ApiResult<SystemStatus> {
        self.get(Self::endpoint(&self.v2_base, &["system", "status"]))
            .await
    }

    /// `GET /context/{user}` (v2)
    pub async fn context(&self, user: &str) -> ApiResult<UserContext> {
        self.get(Self::endpoint(&self.v2_base, &["context", user]))
            .await
    }

    /// `GET /dashboard/{user}` (v2)
    pub async fn user_dashboard(&self, user: &str) -> ApiResult<UserDashboard> {
        self.get(Self::endpoint(&self.v2_base, &["dashboard", user]))
            .await
    }

    /// `GET /insights/{user}` (v2)
    pub async fn insights(&self, user: &str) -> ApiResult<Vec<Insight>> {
        let response: InsightsResponse = self
            .get(Self::endpoint(&self.v2_base, &["insights", user]))
            .await?;
        Ok(response.into_insights())
    }

    /// `POST /system/refresh` (v2)
    pub async fn refresh(&self) -> ApiResult<RefreshResult> {
        self.post(
            Self::endpoint(&self.v2_base, &["system", "refresh"]),
            &serde_json::json!({}),
        )
        .await
    }

    /// `POST /chat/enhanced` (v2)
    pub async fn enhanced_chat(&self, request: &EnhancedChatRequest<'_>) -> ApiResult<EnhancedChatReply> {
        self.post(Self::endpoint(&self.v2_base, &["chat", "enhanced"]), request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_segments() {
        let base = Url::parse("http://localhost:8000/api").unwrap();
        let url = ApiClient::endpoint(&base, &["auth", "login"]);
        assert_eq!(url.as_str(), "http://localhost:8000/api/auth/login");
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let base = Url::parse("http://localhost:8000/api/").unwrap();
        let url = ApiClient::endpoint(&base, &["dashboard"]);
        assert_eq!(url.as_str(), "http://localhost:8000/api/dashboard");
    }

    #[test]
    fn test_endpoint_encodes_user_segment() {
        let base = Url::parse("http://localhost:8000/api/v2").unwrap();
        let url = ApiClient::endpoint(&base, &["context", "josé luis"]);
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/v2/context/jos%C3%A9%20luis"
        );
    }

    #[test]
    fn test_invalid_base_rejected() {
        let mut config = ApiConfig::default();
        config.base_url = "mailto:someone".to_string();
        let transport = Arc::new(crate::request::HttpTransport::new().unwrap());
        assert!(ApiClient::new(&config, transport).is_err());
    }
}
