//! ConsoleApi - SafeSight Backend Adapter
//!
//! ## Responsibilities
//!
//! - Login / identity checks against `/auth`
//! - Telemetry and event log fetches for the sidebar
//! - AI analysis submission
//! - Every request bounded by the client timeout

use crate::error::{Error, Result};
use crate::models::{
    AnalysisReport, AnalyzeRequest, ErrorDetail, SecurityEvent, TelemetrySample, TokenResponse,
    User,
};
use async_trait::async_trait;
use std::time::Duration;

/// Backend operations consumed by the console
///
/// `ConsoleApi` is the HTTP implementation; tests substitute in-memory fakes.
#[async_trait]
pub trait ConsoleBackend: Send + Sync {
    /// `POST /auth/login` (form-encoded)
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse>;

    /// `GET /auth/me` with bearer token
    async fn current_user(&self, token: &str) -> Result<User>;

    /// `GET /telemetry`
    async fn telemetry(&self) -> Result<TelemetrySample>;

    /// `GET /events`
    async fn events(&self) -> Result<Vec<SecurityEvent>>;

    /// `POST /analyze`
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisReport>;
}

/// SafeSight backend client
pub struct ConsoleApi {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ConsoleApi {
    /// Create new client with the default 10s timeout
    pub fn new(base_url: String) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    /// Create new client with custom timeout
    pub fn with_timeout(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Map a non-success response to `Error::Api`
    async fn reject(resp: reqwest::Response) -> Error {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorDetail>(&body)
            .map(|d| d.detail)
            .unwrap_or(body);
        Error::Api { status, message }
    }
}

#[async_trait]
impl ConsoleBackend for ConsoleApi {
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let resp = self
            .client
            .post(self.url("/auth/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        if resp.status().is_client_error() {
            let body = resp.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorDetail>(&body)
                .map(|d| d.detail)
                .unwrap_or_else(|_| "Login failed".to_string());
            return Err(Error::Unauthorized(detail));
        }
        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }

        Ok(resp.json().await?)
    }

    async fn current_user(&self, token: &str) -> Result<User> {
        let resp = self
            .client
            .get(self.url("/auth/me"))
            .bearer_auth(token)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }

        Ok(resp.json().await?)
    }

    async fn telemetry(&self) -> Result<TelemetrySample> {
        let resp = self.client.get(self.url("/telemetry")).send().await?;

        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }

        Ok(resp.json().await?)
    }

    async fn events(&self) -> Result<Vec<SecurityEvent>> {
        let resp = self.client.get(self.url("/events")).send().await?;

        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }

        Ok(resp.json().await?)
    }

    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisReport> {
        let resp = self
            .client
            .post(self.url("/analyze"))
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let err = Self::reject(resp).await;
            tracing::warn!(camera_id = %request.camera_id, error = %err, "Analysis rejected by backend");
            return Err(err);
        }

        Ok(resp.json().await?)
    }
}
