//! Proof identifiers and the decision hash.

use chrono::Utc;
use rand::Rng;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Inputs committed to by a decision hash.
#[derive(Debug, Clone)]
pub struct DecisionCommitment<'a> {
    pub request_id: &'a str,
    pub address: &'a str,
    pub risk_score: u8,
    pub explanation: &'a str,
    pub features: &'a Value,
    pub model_hash: &'a str,
    pub masumi_decision: &'a str,
    pub proof_id: &'a str,
}

/// Rebuild `value` with every object's keys in sorted order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Compact JSON with recursively sorted keys.
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}

/// Lowercase hex SHA-256 over the canonical JSON of the commitment.
pub fn decision_hash(c: &DecisionCommitment<'_>) -> String {
    let payload = serde_json::json!({
        "address": c.address,
        "explanation": c.explanation,
        "features": c.features,
        "masumiDecision": c.masumi_decision,
        "modelHash": c.model_hash,
        "proofId": c.proof_id,
        "requestId": c.request_id,
        "riskScore": c.risk_score,
    });
    hex::encode(Sha256::digest(canonical_json(&payload).as_bytes()))
}

pub fn new_proof_id() -> String {
    format!("proof-{}", Uuid::new_v4())
}

fn random_from(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

/// `len` random lowercase base36 characters.
pub fn random_base36(len: usize) -> String {
    random_from(b"0123456789abcdefghijklmnopqrstuvwxyz", len)
}

pub fn random_hex(len: usize) -> String {
    random_from(b"0123456789abcdef", len)
}

/// Mock L1 anchoring transaction id.
pub fn new_anchor_tx_id() -> String {
    let mut bytes = [0u8; 8];
    rand::rng().fill(&mut bytes);
    format!(
        "ANCHOR_TX_{}_{}",
        Utc::now().timestamp_millis(),
        hex::encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn commitment<'a>(features: &'a Value, decision: &'a str) -> DecisionCommitment<'a> {
        DecisionCommitment {
            request_id: "req-1",
            address: "addr_test1xyz",
            risk_score: 42,
            explanation: "Moderate activity pattern",
            features,
            model_hash: "model-v1-2025-01-01",
            masumi_decision: decision,
            proof_id: "proof-abc",
        }
    }

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let value = json!({"b": 1, "a": {"z": true, "m": [ {"y": 1, "x": 2} ]}});
        assert_eq!(
            canonical_json(&value),
            r#"{"a":{"m":[{"x":2,"y":1}],"z":true},"b":1}"#
        );
    }

    #[test]
    fn test_decision_hash_stable_under_key_order() {
        let f1 = json!({"velocity": 0.5, "tx_count_24h": 3});
        let f2 = json!({"tx_count_24h": 3, "velocity": 0.5});
        let h1 = decision_hash(&commitment(&f1, "APPROVED"));
        let h2 = decision_hash(&commitment(&f2, "APPROVED"));
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_decision_hash_commits_to_decision() {
        let f = json!({});
        assert_ne!(
            decision_hash(&commitment(&f, "APPROVED")),
            decision_hash(&commitment(&f, "REJECTED"))
        );
    }

    #[test]
    fn test_identifiers() {
        assert!(new_proof_id().starts_with("proof-"));
        let anchor = new_anchor_tx_id();
        assert!(anchor.starts_with("ANCHOR_TX_"));
        assert_eq!(anchor.rsplit('_').next().unwrap().len(), 16);
    }

    #[test]
    fn test_random_alphabets() {
        let b36 = random_base36(40);
        assert_eq!(b36.len(), 40);
        assert!(b36.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));

        let hex = random_hex(64);
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
