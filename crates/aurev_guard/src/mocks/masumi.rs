use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::simulate_latency;
use crate::domain::RiskLevel;

pub const MASUMI_AGENT_ID: &str = "masumi-agent-001";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDecision {
    pub agent_id: String,
    pub risk_assessment: RiskAssessment,
    pub agent_timestamp: String,
}

/// Simulated Masumi decision agent.
#[derive(Debug, Clone)]
pub struct MasumiMock {
    delay_ms: u64,
}

impl MasumiMock {
    pub fn new(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    pub async fn get_agent_decision(&self, risk_score: f64, address: &str) -> AgentDecision {
        simulate_latency(self.delay_ms).await;
        let level = RiskLevel::from_agent_score(risk_score);
        tracing::debug!(%address, risk_score, risk_level = %level, "Masumi assessment");
        AgentDecision {
            agent_id: MASUMI_AGENT_ID.to_string(),
            risk_assessment: RiskAssessment {
                risk_level: level,
                confidence: 0.95,
                recommendation: level.recommendation().to_string(),
            },
            agent_timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_decision_bands() {
        let mock = MasumiMock::new(0);
        let critical = mock.get_agent_decision(85.0, "addr_a").await;
        assert_eq!(critical.agent_id, MASUMI_AGENT_ID);
        assert_eq!(critical.risk_assessment.risk_level, RiskLevel::Critical);
        assert_eq!(critical.risk_assessment.recommendation, "Block immediately");

        let low = mock.get_agent_decision(10.0, "addr_a").await;
        assert_eq!(low.risk_assessment.risk_level, RiskLevel::Low);
        assert_eq!(low.risk_assessment.confidence, 0.95);
    }
}
