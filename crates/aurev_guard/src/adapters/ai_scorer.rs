//! Client for the address scoring service behind `/scan/address`.

use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use super::http::AgentHttp;
use crate::config::AgentEndpoints;
use crate::domain::{fallback_score, AiScore, RiskLevel};
use crate::error::Result;

/// Lenient view of the scorer's reply; numeric fields may arrive as floats.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreResponse {
    risk_score: f64,
    #[serde(default)]
    risk_level: Option<RiskLevel>,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    features: serde_json::Value,
    #[serde(default)]
    model_hash: String,
    #[serde(default)]
    timestamp: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AiScorerClient {
    http: AgentHttp,
}

impl AiScorerClient {
    pub fn new(endpoints: &AgentEndpoints) -> Self {
        Self {
            http: AgentHttp::new("ai-scorer", &endpoints.ai_stub_url, endpoints.ai_stub_timeout_ms),
        }
    }

    async fn request(&self, address: &str) -> Result<AiScore> {
        let data = self
            .http
            .post_json("/ai/score", &serde_json::json!({ "address": address }), None)
            .await?;
        let resp: ScoreResponse = serde_json::from_value(data)?;
        let risk_score = resp.risk_score.round().clamp(0.0, 100.0) as u8;
        Ok(AiScore {
            address: address.to_string(),
            risk_score,
            risk_level: resp
                .risk_level
                .unwrap_or_else(|| RiskLevel::from_score(risk_score)),
            explanation: resp.explanation,
            features: resp.features,
            model_hash: resp.model_hash,
            timestamp: resp.timestamp.unwrap_or_else(|| Utc::now().to_rfc3339()),
        })
    }

    /// Score `address`; the flag is `true` when the fallback score was used.
    pub async fn score(&self, address: &str) -> (AiScore, bool) {
        match self.request(address).await {
            Ok(score) => (score, false),
            Err(e) => {
                warn!(%address, error = %e, "AI scoring unavailable, using fallback");
                (fallback_score(address), true)
            }
        }
    }
}
