use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::simulate_latency;
use crate::domain::proof::{random_base36, random_hex};

#[derive(Debug, Clone)]
pub struct ContractLogRequest {
    pub action: Option<String>,
    pub address: String,
    pub risk_score: u8,
    pub decision: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub action: String,
    pub address: String,
    pub timestamp: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractLog {
    pub contract_id: String,
    pub unsigned_tx_hex: String,
    pub log_entry: LogEntry,
    pub validation_status: String,
}

/// Simulated Aiken compliance validator.
#[derive(Debug, Clone)]
pub struct AikenMock {
    delay_ms: u64,
}

impl AikenMock {
    pub fn new(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    /// Build an unsigned transaction logging the decision on-chain.
    pub async fn generate_contract_log(&self, request: &ContractLogRequest) -> ContractLog {
        simulate_latency(self.delay_ms).await;
        tracing::debug!(
            address = %request.address,
            risk_score = request.risk_score,
            decision = %request.decision,
            "Generating contract log"
        );
        ContractLog {
            contract_id: format!("contract_{}", random_base36(9)),
            unsigned_tx_hex: format!("84a4{}", random_hex(128)),
            log_entry: LogEntry {
                action: request
                    .action
                    .clone()
                    .unwrap_or_else(|| "compliance_log".to_string()),
                address: request.address.clone(),
                timestamp: Utc::now().to_rfc3339(),
                status: "pending_signature".to_string(),
            },
            validation_status: "passed".to_string(),
        }
    }
}
