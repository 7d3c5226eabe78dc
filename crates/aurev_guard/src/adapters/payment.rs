//! Payment agent adapter.
//!
//! Settlement validation goes to the payment agent directly (`POST
//! /validate_settle`) or through the orchestrator's `settle` workflow.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::http::{AgentHttp, HealthStatus};
use super::orchestrator::{new_correlation_id, OrchestratorClient};
use crate::config::AgentEndpoints;
use crate::domain::RiskLevel;
use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettleRequest {
    pub transaction_id: String,
    #[serde(default)]
    pub features: Value,
}

/// Risk context attached to a compliance-aware settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSummary {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub is_anomaly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleValidation {
    pub payment_status: String,
    pub is_valid: bool,
    pub payment_id: Option<String>,
    pub checked_features: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub fallback: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceValidation {
    pub success: bool,
    pub payment_id: String,
    pub payment_validation: SettleValidation,
    pub compliance_decision: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub fallback: bool,
}

#[derive(Clone)]
pub struct PaymentAgentAdapter {
    http: AgentHttp,
    orchestrator: Arc<OrchestratorClient>,
    use_orchestrator: bool,
    health_timeout: Duration,
}

impl PaymentAgentAdapter {
    pub fn new(endpoints: &AgentEndpoints, orchestrator: Arc<OrchestratorClient>) -> Self {
        Self {
            http: AgentHttp::new(
                "payment-agent",
                &endpoints.payment_agent_url,
                endpoints.payment_agent_timeout_ms,
            ),
            orchestrator,
            use_orchestrator: endpoints.use_orchestrator,
            health_timeout: Duration::from_millis(endpoints.health_timeout_ms),
        }
    }

    pub async fn check_health(&self) -> HealthStatus {
        self.http.check_health(self.health_timeout).await
    }

    pub async fn validate_settle(
        &self,
        request: &SettleRequest,
        use_orchestrator: Option<bool>,
    ) -> Result<Value> {
        if use_orchestrator.unwrap_or(self.use_orchestrator) {
            info!(transaction_id = %request.transaction_id, "Validating settlement through orchestrator");
            let routed = self
                .orchestrator
                .settle_payment(
                    &request.transaction_id,
                    &request.features,
                    Value::Object(Default::default()),
                )
                .await?;
            Ok(routed.data)
        } else {
            info!(transaction_id = %request.transaction_id, "Validating settlement directly");
            let correlation_id = new_correlation_id();
            self.http
                .post_json("/validate_settle", request, Some(&correlation_id))
                .await
        }
    }

    pub fn parse_result(data: &Value) -> SettleValidation {
        let status = data
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        SettleValidation {
            is_valid: status == "valid",
            payment_status: status,
            payment_id: data
                .get("payment_id")
                .or_else(|| data.get("transaction_id"))
                .and_then(Value::as_str)
                .map(str::to_string),
            checked_features: data
                .get("checked_features")
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default())),
            raw_data: Some(data.clone()),
            error: None,
            fallback: false,
        }
    }

    /// Validate and normalize; unreachable agents yield a pending result.
    pub async fn get_settle_validation(
        &self,
        request: &SettleRequest,
        use_orchestrator: Option<bool>,
    ) -> SettleValidation {
        match self.validate_settle(request, use_orchestrator).await {
            Ok(data) => Self::parse_result(&data),
            Err(e) => {
                error!(error = %e, "Settlement validation failed, using fallback");
                SettleValidation {
                    payment_status: "pending".to_string(),
                    is_valid: false,
                    payment_id: Some(request.transaction_id.clone()),
                    checked_features: request.features.clone(),
                    raw_data: None,
                    error: Some(e.to_string()),
                    fallback: true,
                }
            }
        }
    }

    /// Settle through the orchestrator with the AI risk assessment attached.
    /// Any failure is treated as a rejection.
    pub async fn validate_with_compliance(
        &self,
        request: &SettleRequest,
        risk: &RiskSummary,
    ) -> ComplianceValidation {
        let decision = serde_json::json!({
            "risk_score": risk.risk_score,
            "risk_level": risk.risk_level,
            "is_anomaly": risk.is_anomaly,
        });
        match self
            .orchestrator
            .settle_payment(&request.transaction_id, &request.features, decision)
            .await
        {
            Ok(routed) => ComplianceValidation {
                success: true,
                payment_id: request.transaction_id.clone(),
                payment_validation: Self::parse_result(&routed.data),
                compliance_decision: routed
                    .data
                    .get("decision")
                    .and_then(Value::as_str)
                    .unwrap_or("approved")
                    .to_string(),
                correlation_id: Some(routed.correlation_id),
                error: None,
                fallback: false,
            },
            Err(e) => {
                error!(error = %e, "Compliance validation failed");
                ComplianceValidation {
                    success: false,
                    payment_id: request.transaction_id.clone(),
                    payment_validation: SettleValidation {
                        payment_status: "failed".to_string(),
                        is_valid: false,
                        payment_id: Some(request.transaction_id.clone()),
                        checked_features: Value::Object(Default::default()),
                        raw_data: None,
                        error: Some(e.to_string()),
                        fallback: true,
                    },
                    compliance_decision: "rejected".to_string(),
                    correlation_id: None,
                    error: Some(e.to_string()),
                    fallback: true,
                }
            }
        }
    }
}
