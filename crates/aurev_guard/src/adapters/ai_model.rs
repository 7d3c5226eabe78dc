//! AI model agent adapter.
//!
//! Predictions are requested either directly from the agent (`POST
//! /predict`) or through the orchestrator's `ai_predict` workflow. The agent
//! reports a 0..=4 risk class and an isolation-forest style anomaly flag
//! where `-1` marks an anomaly.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::http::{AgentHttp, HealthStatus};
use super::orchestrator::{new_correlation_id, OrchestratorClient};
use crate::config::AgentEndpoints;
use crate::domain::RiskLevel;
use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub features: Value,
}

/// Normalized prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPrediction {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub anomaly_flag: i64,
    pub is_anomaly: bool,
    pub graph_features: Value,
    pub anomaly_score: Value,
    pub shap_explanation: Option<Value>,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub fallback: bool,
}

impl ModelPrediction {
    /// Neutral prediction used when the agent is unavailable.
    pub fn fallback(error: impl ToString) -> Self {
        Self {
            risk_score: 50.0,
            risk_level: RiskLevel::Medium,
            anomaly_flag: 1,
            is_anomaly: false,
            graph_features: Value::Object(Default::default()),
            anomaly_score: Value::Object(Default::default()),
            shap_explanation: None,
            confidence: 0.0,
            raw_data: None,
            error: Some(error.to_string()),
            fallback: true,
        }
    }
}

fn parse_confidence(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.5),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.5),
        _ => 0.5,
    }
}

fn parse_risk_object(obj: &Value) -> ModelPrediction {
    // Orchestrator replies wrap the agent output one level deeper.
    let pred = obj
        .get("prediction")
        .or_else(|| obj.get("data").filter(|d| d.is_object()))
        .unwrap_or(obj);
    let risk_score = pred.get("risk_score").and_then(Value::as_f64).unwrap_or(0.0);
    let anomaly_flag = pred
        .get("anomaly_flag")
        .and_then(Value::as_i64)
        .filter(|f| *f != 0)
        .unwrap_or(1);

    ModelPrediction {
        risk_score,
        risk_level: RiskLevel::from_model_class(risk_score.trunc() as i64),
        anomaly_flag,
        is_anomaly: anomaly_flag == -1,
        graph_features: pred
            .get("graph_features")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default())),
        anomaly_score: pred
            .get("anomaly_score")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default())),
        shap_explanation: pred.get("shap_explanation").filter(|v| !v.is_null()).cloned(),
        confidence: parse_confidence(pred.get("confidence")),
        raw_data: Some(pred.clone()),
        error: None,
        fallback: false,
    }
}

#[derive(Clone)]
pub struct AiModelAdapter {
    http: AgentHttp,
    orchestrator: Arc<OrchestratorClient>,
    use_orchestrator: bool,
    health_timeout: Duration,
}

impl AiModelAdapter {
    pub fn new(endpoints: &AgentEndpoints, orchestrator: Arc<OrchestratorClient>) -> Self {
        Self {
            http: AgentHttp::new("ai-model", &endpoints.ai_agent_url, endpoints.ai_agent_timeout_ms),
            orchestrator,
            use_orchestrator: endpoints.use_orchestrator,
            health_timeout: Duration::from_millis(endpoints.health_timeout_ms),
        }
    }

    pub async fn check_health(&self) -> HealthStatus {
        self.http.check_health(self.health_timeout).await
    }

    /// Request a prediction. `use_orchestrator` overrides the configured route.
    pub async fn predict(
        &self,
        request: &PredictRequest,
        use_orchestrator: Option<bool>,
    ) -> Result<Value> {
        if use_orchestrator.unwrap_or(self.use_orchestrator) {
            info!("Requesting prediction through orchestrator");
            let routed = self
                .orchestrator
                .predict(request.address.as_deref(), &request.features)
                .await?;
            Ok(routed.data)
        } else {
            info!("Requesting prediction directly");
            let correlation_id = new_correlation_id();
            self.http
                .post_json("/predict", request, Some(&correlation_id))
                .await
        }
    }

    /// Normalize either a nested `{prediction: …}` or a flat response.
    pub fn parse_result(data: &Value) -> ModelPrediction {
        if data.get("prediction").is_some() {
            parse_risk_object(&data["prediction"])
        } else {
            if data.get("risk_score").is_none() && data.get("anomaly_flag").is_none() {
                warn!(response = %data, "Unrecognized prediction response");
            }
            parse_risk_object(data)
        }
    }

    /// Predict and normalize, falling back to a neutral prediction on error.
    pub async fn get_prediction(
        &self,
        request: &PredictRequest,
        use_orchestrator: Option<bool>,
    ) -> ModelPrediction {
        match self.predict(request, use_orchestrator).await {
            Ok(data) => Self::parse_result(&data),
            Err(e) => {
                error!(error = %e, "Prediction failed, using fallback");
                ModelPrediction::fallback(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_flat_response() {
        let p = AiModelAdapter::parse_result(&json!({
            "risk_score": 3,
            "anomaly_flag": -1,
            "confidence": "0.8"
        }));
        assert_eq!(p.risk_score, 3.0);
        assert_eq!(p.risk_level, RiskLevel::High);
        assert!(p.is_anomaly);
        assert_eq!(p.confidence, 0.8);
        assert!(!p.fallback);
    }

    #[test]
    fn test_parse_nested_response() {
        let p = AiModelAdapter::parse_result(&json!({
            "prediction": { "prediction": { "risk_score": 1, "anomaly_flag": 1, "confidence": 0.9 } }
        }));
        assert_eq!(p.risk_level, RiskLevel::Low);
        assert!(!p.is_anomaly);
        assert_eq!(p.confidence, 0.9);
    }

    #[test]
    fn test_parse_defaults() {
        let p = AiModelAdapter::parse_result(&json!({"unexpected": true}));
        assert_eq!(p.risk_score, 0.0);
        assert_eq!(p.risk_level, RiskLevel::VeryLow);
        assert_eq!(p.anomaly_flag, 1);
        assert_eq!(p.confidence, 0.5);

        let out_of_range = AiModelAdapter::parse_result(&json!({"risk_score": 9}));
        assert_eq!(out_of_range.risk_level, RiskLevel::Unknown);
    }

    #[test]
    fn test_fallback_prediction() {
        let p = ModelPrediction::fallback("down");
        assert_eq!(p.risk_score, 50.0);
        assert_eq!(p.risk_level, RiskLevel::Medium);
        assert_eq!(p.confidence, 0.0);
        assert!(p.fallback);
        assert_eq!(p.error.as_deref(), Some("down"));
    }
}
