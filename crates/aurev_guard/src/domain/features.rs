//! Wallet activity and per-wallet feature engineering.
//!
//! Transactions are reduced to one value (lovelace sent to outputs) and one
//! counterparty each, then aggregated over the 24 hours ending at the most
//! recent transaction.

use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

const RATIO_EPSILON: f64 = 1e-9;
const DAY_SECS: i64 = 24 * 60 * 60;

/// A native-asset quantity; Blockfrost encodes quantities as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAmount {
    pub unit: String,
    pub quantity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxIo {
    pub address: String,
    #[serde(default)]
    pub amount: Vec<AssetAmount>,
}

impl TxIo {
    pub fn lovelace(&self) -> u64 {
        self.amount
            .iter()
            .filter(|a| a.unit == "lovelace")
            .filter_map(|a| a.quantity.parse::<u64>().ok())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainTransaction {
    pub tx_hash: String,
    /// Unix seconds.
    pub block_time: i64,
    pub block_height: u64,
    pub fees: u64,
    pub size: u64,
    pub inputs: Vec<TxIo>,
    pub outputs: Vec<TxIo>,
}

impl ChainTransaction {
    /// Total lovelace across outputs.
    pub fn value(&self) -> u64 {
        self.outputs.iter().map(TxIo::lovelace).sum()
    }

    /// First address on either side that isn't the wallet itself.
    pub fn counterparty(&self, wallet: &str) -> &str {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .map(|io| io.address.as_str())
            .find(|a| *a != wallet)
            .unwrap_or("unknown")
    }
}

/// Transactions fetched for one wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletActivity {
    pub wallet_address: String,
    pub transaction_count: usize,
    pub transactions: Vec<ChainTransaction>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl WalletActivity {
    pub fn new(wallet_address: impl Into<String>, transactions: Vec<ChainTransaction>) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            transaction_count: transactions.len(),
            transactions,
            timestamp: Utc::now().to_rfc3339(),
            note: None,
        }
    }
}

/// The eight features the AI model agent expects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletFeatures {
    pub tx_count_24h: u64,
    pub total_value_24h: f64,
    pub largest_value_24h: f64,
    pub std_value_24h: f64,
    pub unique_counterparts_24h: u64,
    pub entropy_of_destinations: f64,
    pub share_of_daily_volume: f64,
    pub relative_max_vs_global: f64,
}

impl WalletFeatures {
    /// Plausible random features, used by the simulated pipeline.
    pub fn random() -> Self {
        let mut rng = rand::rng();
        Self {
            tx_count_24h: rng.random_range(0..50),
            total_value_24h: rng.random_range(0..10_000_000) as f64,
            largest_value_24h: rng.random_range(0..5_000_000) as f64,
            std_value_24h: rng.random_range(0..500_000) as f64,
            unique_counterparts_24h: rng.random_range(0..30),
            entropy_of_destinations: rng.random_range(0.0..5.0),
            share_of_daily_volume: rng.random::<f64>(),
            relative_max_vs_global: rng.random::<f64>(),
        }
    }

    /// Features as a JSON object with the wallet address merged in.
    pub fn to_payload(&self, wallet_address: &str) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}));
        if let Some(map) = value.as_object_mut() {
            map.insert(
                "wallet_address".to_string(),
                serde_json::Value::String(wallet_address.to_string()),
            );
        }
        value
    }
}

/// Shannon entropy (natural log) of a set of category counts.
fn entropy<'a>(counts: impl Iterator<Item = &'a usize>) -> f64 {
    let counts: Vec<f64> = counts.map(|c| *c as f64).collect();
    let total: f64 = counts.iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    counts
        .iter()
        .map(|c| c / total)
        .filter(|p| *p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Aggregate a wallet's activity into [`WalletFeatures`].
pub fn build_wallet_features(wallet_address: &str, activity: &WalletActivity) -> WalletFeatures {
    let txs = &activity.transactions;
    let Some(latest) = txs.iter().map(|t| t.block_time).max() else {
        return WalletFeatures::default();
    };
    let window_start = latest - DAY_SECS;

    let window: Vec<&ChainTransaction> = txs
        .iter()
        .filter(|t| t.block_time > window_start)
        .collect();
    let values: Vec<f64> = window.iter().map(|t| t.value() as f64).collect();

    let mut counterparties: HashMap<&str, usize> = HashMap::new();
    for tx in &window {
        *counterparties.entry(tx.counterparty(wallet_address)).or_default() += 1;
    }

    let total = values.iter().sum::<f64>();
    let largest = values.iter().cloned().fold(0.0, f64::max);
    let sample_volume: f64 = txs.iter().map(|t| t.value() as f64).sum();
    let sample_max = txs.iter().map(|t| t.value() as f64).fold(0.0, f64::max);

    WalletFeatures {
        tx_count_24h: window.len() as u64,
        total_value_24h: total,
        largest_value_24h: largest,
        std_value_24h: sample_std(&values),
        unique_counterparts_24h: counterparties.len() as u64,
        entropy_of_destinations: entropy(counterparties.values()),
        share_of_daily_volume: total / (sample_volume + RATIO_EPSILON),
        relative_max_vs_global: largest / (sample_max + RATIO_EPSILON),
    }
}

/// Fifteen made-up transactions, used when live chain data is unavailable.
pub fn synthetic_activity(wallet_address: &str) -> WalletActivity {
    let mut rng = rand::rng();
    let now = Utc::now().timestamp();
    let lovelace = |q: u64| {
        vec![AssetAmount {
            unit: "lovelace".to_string(),
            quantity: q.to_string(),
        }]
    };

    let transactions = (0..15u64)
        .map(|i| ChainTransaction {
            tx_hash: format!("mock_tx_{}_{}", i, rng.random_range(1000..10_000)),
            block_time: now - (i as i64) * 600,
            block_height: 1_000_000 + i,
            fees: rng.random_range(150_000..300_000),
            size: rng.random_range(200..1_000),
            inputs: vec![TxIo {
                address: wallet_address.to_string(),
                amount: lovelace(rng.random_range(1_000_000..5_000_000)),
            }],
            outputs: vec![TxIo {
                address: "addr_test_mock_dest".to_string(),
                amount: lovelace(rng.random_range(500_000..2_000_000)),
            }],
        })
        .collect();

    let mut activity = WalletActivity::new(wallet_address, transactions);
    activity.note = Some("Using mock data: live chain data unavailable".to_string());
    activity
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "addr_test1wallet";

    fn tx(hash: &str, time: i64, to: &str, lovelace: u64) -> ChainTransaction {
        ChainTransaction {
            tx_hash: hash.to_string(),
            block_time: time,
            block_height: 1,
            fees: 170_000,
            size: 300,
            inputs: vec![TxIo {
                address: WALLET.to_string(),
                amount: vec![],
            }],
            outputs: vec![TxIo {
                address: to.to_string(),
                amount: vec![AssetAmount {
                    unit: "lovelace".to_string(),
                    quantity: lovelace.to_string(),
                }],
            }],
        }
    }

    #[test]
    fn test_empty_activity_is_all_zero() {
        let activity = WalletActivity::new(WALLET, vec![]);
        assert_eq!(build_wallet_features(WALLET, &activity), WalletFeatures::default());
    }

    #[test]
    fn test_window_and_aggregates() {
        let t = 1_700_000_000;
        let activity = WalletActivity::new(
            WALLET,
            vec![
                tx("a", t, "addr_x", 100),
                tx("b", t - 60, "addr_y", 300),
                tx("c", t - 120, "addr_x", 200),
                // outside the 24h window
                tx("d", t - DAY_SECS - 1, "addr_z", 400),
            ],
        );
        let f = build_wallet_features(WALLET, &activity);
        assert_eq!(f.tx_count_24h, 3);
        assert_eq!(f.total_value_24h, 600.0);
        assert_eq!(f.largest_value_24h, 300.0);
        assert!((f.std_value_24h - 100.0).abs() < 1e-9);
        assert_eq!(f.unique_counterparts_24h, 2);
        assert!((f.share_of_daily_volume - 0.6).abs() < 1e-6);
        assert!((f.relative_max_vs_global - 0.75).abs() < 1e-6);

        let expected_entropy = -(2.0f64 / 3.0) * (2.0f64 / 3.0).ln() - (1.0f64 / 3.0) * (1.0f64 / 3.0).ln();
        assert!((f.entropy_of_destinations - expected_entropy).abs() < 1e-9);
    }

    #[test]
    fn test_single_tx_has_zero_std() {
        let activity = WalletActivity::new(WALLET, vec![tx("a", 10, "addr_x", 5)]);
        let f = build_wallet_features(WALLET, &activity);
        assert_eq!(f.std_value_24h, 0.0);
        assert_eq!(f.entropy_of_destinations, 0.0);
    }

    #[test]
    fn test_counterparty_falls_back_to_unknown() {
        let self_send = tx("a", 10, WALLET, 5);
        assert_eq!(self_send.counterparty(WALLET), "unknown");
    }

    #[test]
    fn test_synthetic_activity() {
        let activity = synthetic_activity(WALLET);
        assert_eq!(activity.transaction_count, 15);
        assert!(activity.note.is_some());
        let f = build_wallet_features(WALLET, &activity);
        assert_eq!(f.tx_count_24h, 15);
        assert_eq!(f.unique_counterparts_24h, 1);
    }

    #[test]
    fn test_payload_includes_wallet() {
        let payload = WalletFeatures::random().to_payload(WALLET);
        assert_eq!(payload["wallet_address"], WALLET);
        assert!(payload["tx_count_24h"].as_u64().unwrap() < 50);
    }
}
