//! Decision bundle storage
//!
//! A bundle is created by a scan and then enriched by the agent decision,
//! contract logging and anchoring steps. Bundles live in one table keyed by
//! request id; the address and proof id indexes only point into it, so every
//! lookup path sees the same record.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{AiScore, RiskLevel};
use crate::error::{Error, Result};

/// Lifecycle of a decision bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Scored,
    Approved,
    Rejected,
    ProofGenerated,
    Anchored,
}

/// Everything recorded about one compliance check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionBundle {
    pub request_id: String,
    pub address: String,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub explanation: String,
    pub features: serde_json::Value,
    pub model_hash: String,
    pub masumi_decision: Option<String>,
    pub proof_id: Option<String>,
    pub decision_hash: Option<String>,
    pub contract_id: Option<String>,
    pub unsigned_tx_hex: Option<String>,
    pub signed_tx_hex: Option<String>,
    pub anchored_tx_id: Option<String>,
    pub anchor_strategy: Option<String>,
    pub status: DecisionStatus,
    pub timestamp: String,
}

impl DecisionBundle {
    /// A freshly scored bundle.
    pub fn from_score(request_id: impl Into<String>, score: &AiScore) -> Self {
        Self {
            request_id: request_id.into(),
            address: score.address.clone(),
            risk_score: score.risk_score,
            risk_level: score.risk_level,
            explanation: score.explanation.clone(),
            features: score.features.clone(),
            model_hash: score.model_hash.clone(),
            masumi_decision: None,
            proof_id: None,
            decision_hash: None,
            contract_id: None,
            unsigned_tx_hex: None,
            signed_tx_hex: None,
            anchored_tx_id: None,
            anchor_strategy: None,
            status: DecisionStatus::Scored,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Default)]
struct Tables {
    by_request: HashMap<String, DecisionBundle>,
    latest_by_address: HashMap<String, String>,
    by_proof: HashMap<String, String>,
}

impl Tables {
    fn resolve(&self, key: &str) -> Option<&String> {
        self.by_proof
            .get(key)
            .or_else(|| self.by_request.get_key_value(key).map(|(k, _)| k))
            .or_else(|| self.latest_by_address.get(key))
    }
}

/// In-memory decision bundle store.
#[derive(Clone, Default)]
pub struct DecisionStore {
    tables: Arc<RwLock<Tables>>,
}

impl DecisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new bundle, making it the latest for its address.
    ///
    /// Request ids are never reused: a bundle already stored under the same
    /// id is left in place and the insert fails with a conflict.
    pub async fn insert(&self, bundle: DecisionBundle) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.by_request.contains_key(&bundle.request_id) {
            return Err(Error::Conflict(format!(
                "Request id already used by another scan: {}",
                bundle.request_id
            )));
        }
        tables
            .latest_by_address
            .insert(bundle.address.clone(), bundle.request_id.clone());
        if let Some(proof_id) = &bundle.proof_id {
            tables
                .by_proof
                .insert(proof_id.clone(), bundle.request_id.clone());
        }
        tables.by_request.insert(bundle.request_id.clone(), bundle);
        Ok(())
    }

    /// Look up a bundle by proof id, request id or address, in that order.
    pub async fn get(&self, key: &str) -> Option<DecisionBundle> {
        let tables = self.tables.read().await;
        let request_id = tables.resolve(key)?;
        tables.by_request.get(request_id).cloned()
    }

    /// Apply `f` to the bundle resolved by `key` and return the updated copy.
    ///
    /// The closure may fail, in which case the bundle is left untouched.
    pub async fn update<F>(&self, key: &str, f: F) -> Result<DecisionBundle>
    where
        F: FnOnce(&mut DecisionBundle) -> Result<()>,
    {
        let mut tables = self.tables.write().await;
        let request_id = tables
            .resolve(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Decision bundle not found: {}", key)))?;
        let bundle = tables
            .by_request
            .get_mut(&request_id)
            .ok_or_else(|| Error::NotFound(format!("Decision bundle not found: {}", key)))?;

        let mut updated = bundle.clone();
        f(&mut updated)?;
        if updated.request_id != bundle.request_id || updated.address != bundle.address {
            return Err(Error::Conflict(
                "A decision bundle cannot change its request id or address".to_string(),
            ));
        }
        if bundle.proof_id.is_some() && updated.proof_id != bundle.proof_id {
            return Err(Error::Conflict(
                "A proof was already generated for this decision".to_string(),
            ));
        }
        *bundle = updated.clone();

        if let Some(proof_id) = &updated.proof_id {
            tables.by_proof.insert(proof_id.clone(), request_id);
        }
        Ok(updated)
    }
}
