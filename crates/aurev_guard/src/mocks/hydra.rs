use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::simulate_latency;
use crate::domain::proof::random_base36;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydraState {
    pub state_key: String,
    pub value: serde_json::Value,
    pub proof_data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnChainAnchor {
    pub tx_hash: String,
    pub block_height: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydraSnapshot {
    pub snapshot_id: String,
    pub status: String,
    pub confirmed_at: String,
    pub on_chain_anchor: OnChainAnchor,
}

/// Simulated Hydra L2 head.
#[derive(Debug, Clone)]
pub struct HydraMock {
    delay_ms: u64,
}

impl HydraMock {
    pub fn new(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    pub async fn query_state(&self, state_key: &str) -> HydraState {
        simulate_latency(self.delay_ms).await;
        let mut rng = rand::rng();
        HydraState {
            state_key: state_key.to_string(),
            value: serde_json::json!({
                "complianceScore": rng.random_range(0..100),
                "lastUpdated": Utc::now().to_rfc3339(),
                "nodeId": format!("hydra-node-{}", rng.random_range(0..10)),
            }),
            proof_data: serde_json::json!({
                "headId": format!("head_{}", random_base36(20)),
                "utxo": rng.random_range(0..1000),
            }),
        }
    }

    /// Commit `data` to the head and settle the snapshot on L1.
    pub async fn submit_snapshot(&self, data: &serde_json::Value) -> HydraSnapshot {
        simulate_latency(self.delay_ms).await;
        tracing::debug!(snapshot = %data, "Submitting Hydra snapshot");
        HydraSnapshot {
            snapshot_id: format!("snap_{}", random_base36(15)),
            status: "submitted".to_string(),
            confirmed_at: Utc::now().to_rfc3339(),
            on_chain_anchor: OnChainAnchor {
                tx_hash: format!("tx{}", random_base36(60)),
                block_height: 8_000_000 + rand::rng().random_range(0..1000),
            },
        }
    }
}
