//! Per-address scan history.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::RiskLevel;

/// A complete address scan, as returned to the caller and kept in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub request_id: String,
    pub address: String,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub explanation: String,
    pub features: Value,
    pub model_hash: String,
    pub timestamp: String,
    pub transaction_count: usize,
    pub balance: u64,
    pub first_seen: String,
    pub last_activity: String,
    pub fallback: bool,
}

#[derive(Clone, Default)]
pub struct HistoryStore {
    entries: Arc<RwLock<HashMap<String, Vec<ScanRecord>>>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_scan(&self, record: ScanRecord) {
        self.entries
            .write()
            .await
            .entry(record.address.clone())
            .or_default()
            .push(record);
    }

    /// Scans of `address`, oldest first. Empty when never scanned.
    pub async fn get_history(&self, address: &str) -> Vec<ScanRecord> {
        self.entries
            .read()
            .await
            .get(address)
            .cloned()
            .unwrap_or_default()
    }

    /// Forget an address; returns how many entries were dropped.
    pub async fn clear_history(&self, address: &str) -> usize {
        self.entries
            .write()
            .await
            .remove(address)
            .map(|v| v.len())
            .unwrap_or(0)
    }
}
