use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::simulate_latency;
use crate::domain::proof::random_base36;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInfo {
    pub address: String,
    /// Lovelace.
    pub balance: u64,
    pub tx_count: u32,
    pub staking_address: String,
    pub first_tx: String,
    pub last_tx: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockTransaction {
    pub tx_hash: String,
    pub block_height: u64,
    pub timestamp: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressTransactions {
    pub address: String,
    pub transactions: Vec<MockTransaction>,
}

/// Simulated Blockfrost chain queries.
#[derive(Debug, Clone)]
pub struct BlockfrostMock {
    delay_ms: u64,
}

impl BlockfrostMock {
    pub fn new(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    pub async fn get_address_info(&self, address: &str) -> AddressInfo {
        simulate_latency(self.delay_ms).await;
        let mut rng = rand::rng();
        AddressInfo {
            address: address.to_string(),
            balance: rng.random_range(0..10_000_000),
            tx_count: rng.random_range(0..500),
            staking_address: format!("stake1{}", random_base36(50)),
            first_tx: "2021-01-15T12:30:00Z".to_string(),
            last_tx: Utc::now().to_rfc3339(),
        }
    }

    /// `limit` transactions, one per day going back from now.
    pub async fn get_address_transactions(&self, address: &str, limit: usize) -> AddressTransactions {
        simulate_latency(self.delay_ms).await;
        let mut rng = rand::rng();
        let now = Utc::now();
        let transactions = (0..limit)
            .map(|i| MockTransaction {
                tx_hash: format!("tx{}", random_base36(60)),
                block_height: 8_000_000 + i as u64,
                timestamp: (now - Duration::days(i as i64)).to_rfc3339(),
                amount: rng.random_range(0..5_000_000),
            })
            .collect();
        AddressTransactions {
            address: address.to_string(),
            transactions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_address_transactions() {
        let mock = BlockfrostMock::new(0);
        let txs = mock.get_address_transactions("addr_a", 5).await;
        assert_eq!(txs.transactions.len(), 5);
        assert_eq!(txs.transactions[0].block_height, 8_000_000);
        assert_eq!(txs.transactions[4].block_height, 8_000_004);
        assert!(txs.transactions.iter().all(|t| t.amount < 5_000_000));
    }

    #[tokio::test]
    async fn test_address_info() {
        let info = BlockfrostMock::new(0).get_address_info("addr_a").await;
        assert_eq!(info.address, "addr_a");
        assert!(info.staking_address.starts_with("stake1"));
        assert_eq!(info.first_tx, "2021-01-15T12:30:00Z");
    }
}
