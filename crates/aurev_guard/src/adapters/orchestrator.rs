//! Masumi orchestrator client.
//!
//! The orchestrator routes named workflows (`ai_predict`, `settle`, …) to
//! the registered agents. Routing is retried with linear backoff, except
//! when the orchestrator rejects the request outright.

use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use super::http::{AgentHttp, HealthStatus};
use crate::config::AgentEndpoints;
use crate::error::{Error, Result};

pub const WORKFLOW_AI_PREDICT: &str = "ai_predict";
pub const WORKFLOW_SETTLE: &str = "settle";

/// A successfully routed workflow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub workflow: String,
    pub correlation_id: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct RouteRequest<'a> {
    workflow: &'a str,
    payload: &'a serde_json::Value,
    correlation_id: &'a str,
    timestamp: String,
}

pub fn new_correlation_id() -> String {
    format!("corr-{}", Uuid::new_v4())
}

#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    http: AgentHttp,
    route_path: String,
    retries: u32,
    backoff: Duration,
    health_timeout: Duration,
}

impl OrchestratorClient {
    pub fn new(endpoints: &AgentEndpoints) -> Self {
        Self {
            http: AgentHttp::new(
                "orchestrator",
                &endpoints.orchestrator_url,
                endpoints.orchestrator_timeout_ms,
            ),
            route_path: endpoints.orchestrator_route_path.clone(),
            retries: endpoints.orchestrator_retries.max(1),
            backoff: Duration::from_millis(endpoints.orchestrator_backoff_ms),
            health_timeout: Duration::from_millis(endpoints.health_timeout_ms),
        }
    }

    pub async fn check_health(&self) -> HealthStatus {
        let id = new_correlation_id();
        match self
            .http
            .get_json("/masumi/health", Some(&id), Some(self.health_timeout))
            .await
        {
            Ok(data) => HealthStatus::up(data),
            Err(e) => {
                warn!(error = %e, "Orchestrator health check failed");
                HealthStatus::down(e)
            }
        }
    }

    pub async fn list_agents(&self) -> Result<serde_json::Value> {
        let id = new_correlation_id();
        self.http.get_json("/masumi/agents", Some(&id), None).await
    }

    /// Route `workflow` with `payload`, retrying transient failures.
    pub async fn route(&self, workflow: &str, payload: serde_json::Value) -> Result<RouteResult> {
        let correlation_id = new_correlation_id();
        let mut last_error = None;

        for attempt in 1..=self.retries {
            info!(
                workflow,
                attempt,
                retries = self.retries,
                correlation_id = %correlation_id,
                "Routing workflow"
            );
            let body = RouteRequest {
                workflow,
                payload: &payload,
                correlation_id: &correlation_id,
                timestamp: Utc::now().to_rfc3339(),
            };

            match self
                .http
                .post_json(&self.route_path, &body, Some(&correlation_id))
                .await
            {
                Ok(data) => {
                    info!(workflow, correlation_id = %correlation_id, "Workflow completed");
                    return Ok(RouteResult {
                        workflow: workflow.to_string(),
                        correlation_id,
                        data,
                    });
                }
                Err(e) => {
                    warn!(workflow, attempt, error = %e, "Routing attempt failed");
                    let rejected = e.is_client_rejection();
                    last_error = Some(e);
                    if rejected {
                        break;
                    }
                    if attempt < self.retries {
                        tokio::time::sleep(self.backoff * attempt).await;
                    }
                }
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts made".to_string());
        Err(Error::upstream(
            "orchestrator",
            format!("Failed to route workflow '{}': {}", workflow, reason),
        ))
    }

    pub async fn predict(&self, address: Option<&str>, features: &serde_json::Value) -> Result<RouteResult> {
        self.route(
            WORKFLOW_AI_PREDICT,
            serde_json::json!({ "address": address, "features": features }),
        )
        .await
    }

    pub async fn settle_payment(
        &self,
        payment_id: &str,
        features: &serde_json::Value,
        decision: serde_json::Value,
    ) -> Result<RouteResult> {
        self.route(
            WORKFLOW_SETTLE,
            serde_json::json!({
                "payment_id": payment_id,
                "features": features,
                "decision": decision,
            }),
        )
        .await
    }
}
