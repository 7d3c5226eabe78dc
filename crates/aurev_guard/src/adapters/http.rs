//! Shared JSON-over-HTTP plumbing for sibling services.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Result of probing a sibling service's health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn up(data: serde_json::Value) -> Self {
        Self {
            healthy: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn down(error: impl ToString) -> Self {
        Self {
            healthy: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// A reqwest client bound to one sibling service.
#[derive(Debug, Clone)]
pub struct AgentHttp {
    service: String,
    base_url: String,
    http: reqwest::Client,
}

impl AgentHttp {
    pub fn new(service: impl Into<String>, base_url: impl Into<String>, timeout_ms: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            service: service.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(format!("{} did not answer in time", self.service))
        } else {
            Error::upstream(&self.service, err)
        }
    }

    async fn read_json(&self, resp: reqwest::Response) -> Result<serde_json::Value> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::UpstreamStatus {
                service: self.service.clone(),
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        resp.json()
            .await
            .map_err(|e| Error::upstream(&self.service, format!("invalid JSON response: {}", e)))
    }

    /// GET `path`, optionally overriding the client timeout.
    pub async fn get_json(
        &self,
        path: &str,
        correlation_id: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value> {
        let mut req = self.http.get(self.url(path));
        if let Some(id) = correlation_id {
            req = req.header(CORRELATION_ID_HEADER, id);
        }
        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }
        let resp = req.send().await.map_err(|e| self.transport_error(e))?;
        self.read_json(resp).await
    }

    /// POST a JSON body to `path`. The correlation id doubles as the
    /// request id seen by the sibling.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        correlation_id: Option<&str>,
    ) -> Result<serde_json::Value> {
        let mut req = self.http.post(self.url(path)).json(body);
        if let Some(id) = correlation_id {
            req = req
                .header(CORRELATION_ID_HEADER, id)
                .header(crate::middleware::REQUEST_ID_HEADER, id);
        }
        let resp = req.send().await.map_err(|e| self.transport_error(e))?;
        self.read_json(resp).await
    }

    /// Probe `GET /health`.
    pub async fn check_health(&self, timeout: Duration) -> HealthStatus {
        match self.get_json("/health", None, Some(timeout)).await {
            Ok(data) => HealthStatus::up(data),
            Err(e) => {
                tracing::warn!(service = %self.service, error = %e, "Health check failed");
                HealthStatus::down(e)
            }
        }
    }
}
