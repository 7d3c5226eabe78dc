//! Decision bundle flow: agent decision, contract log, lookup and anchoring
//!
//! A bundle moves `scored → approved|rejected → proof_generated → anchored`.
//! Once a proof exists the decision it commits to is fixed; replaying the
//! same step returns the recorded result instead of minting a new one.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::ApiJson;
use crate::domain::proof::{decision_hash, new_anchor_tx_id, new_proof_id, DecisionCommitment};
use crate::domain::RiskLevel;
use crate::error::{Error, Result};
use crate::middleware::RequestId;
use crate::mocks::{ContractLogRequest, RiskAssessment};
use crate::state::AppState;
use crate::store::{DecisionBundle, DecisionStatus};

pub const DECISION_APPROVED: &str = "APPROVED";
pub const DECISION_REJECTED: &str = "REJECTED";

pub const STRATEGY_L1: &str = "l1";
pub const STRATEGY_HYDRA: &str = "hydra";

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::BadRequest(format!("{} is required", name)))
}

fn required_score(score: Option<f64>) -> Result<f64> {
    match score {
        Some(s) if s.is_finite() && (0.0..=100.0).contains(&s) => Ok(s),
        Some(_) => Err(Error::BadRequest(
            "riskScore must be between 0 and 100".to_string(),
        )),
        None => Err(Error::BadRequest("riskScore is required".to_string())),
    }
}

fn bundle_not_found() -> Error {
    Error::NotFound("Decision bundle not found".to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub request_id: Option<String>,
    pub address: Option<String>,
    pub risk_score: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    pub masumi_request_id: String,
    pub status: String,
    pub decision: String,
    pub agent_id: String,
    pub risk_assessment: RiskAssessment,
    pub agent_timestamp: String,
}

/// POST /agent/decision
pub async fn agent_decision(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiJson(req): ApiJson<DecisionRequest>,
) -> Result<Json<DecisionResponse>> {
    let address = required(req.address, "address")?;
    let risk_score = required_score(req.risk_score)?;

    let key = match req.request_id.filter(|id| !id.is_empty()) {
        Some(id) => {
            state.decisions.get(&id).await.ok_or_else(bundle_not_found)?;
            Some(id)
        }
        None => state.decisions.get(&address).await.map(|b| b.request_id),
    };

    let agent = state
        .mocks
        .masumi
        .get_agent_decision(risk_score, &address)
        .await;
    let decision = if agent.risk_assessment.risk_level == RiskLevel::Critical {
        DECISION_REJECTED
    } else {
        DECISION_APPROVED
    };

    let masumi_request_id = match key {
        Some(key) => {
            let bundle = state
                .decisions
                .update(&key, |bundle| {
                    if bundle.proof_id.is_some() {
                        if bundle.masumi_decision.as_deref() == Some(decision) {
                            return Ok(());
                        }
                        return Err(Error::Conflict(
                            "Decision is already committed to a proof".to_string(),
                        ));
                    }
                    bundle.masumi_decision = Some(decision.to_string());
                    bundle.status = if decision == DECISION_APPROVED {
                        DecisionStatus::Approved
                    } else {
                        DecisionStatus::Rejected
                    };
                    Ok(())
                })
                .await?;
            bundle.request_id
        }
        None => request_id.0.clone(),
    };

    info!(
        request_id = %request_id,
        masumi_request_id = %masumi_request_id,
        decision,
        "Agent decision"
    );

    Ok(Json(DecisionResponse {
        masumi_request_id,
        status: "queued".to_string(),
        decision: decision.to_string(),
        agent_id: agent.agent_id,
        risk_assessment: agent.risk_assessment,
        agent_timestamp: agent.agent_timestamp,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractLogBody {
    pub request_id: Option<String>,
    pub address: Option<String>,
    pub risk_score: Option<f64>,
    pub masumi_decision: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContractMetadata {
    pub risk: u8,
    pub level: RiskLevel,
    #[serde(rename = "modelHash")]
    pub model_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractLogResponse {
    pub request_id: String,
    pub unsigned_tx_hex: String,
    pub metadata: ContractMetadata,
    pub proof_id: String,
    pub decision_hash: String,
    pub contract_id: Option<String>,
}

impl ContractLogResponse {
    fn from_bundle(bundle: DecisionBundle) -> Result<Self> {
        let missing = || Error::Internal("bundle has no proof".to_string());
        Ok(Self {
            unsigned_tx_hex: bundle.unsigned_tx_hex.ok_or_else(missing)?,
            proof_id: bundle.proof_id.ok_or_else(missing)?,
            decision_hash: bundle.decision_hash.ok_or_else(missing)?,
            metadata: ContractMetadata {
                risk: bundle.risk_score,
                level: bundle.risk_level,
                model_hash: bundle.model_hash,
            },
            request_id: bundle.request_id,
            contract_id: bundle.contract_id,
        })
    }
}

/// POST /contract/log
pub async fn contract_log(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiJson(req): ApiJson<ContractLogBody>,
) -> Result<Json<ContractLogResponse>> {
    let address = required(req.address, "address")?;
    required_score(req.risk_score)?;

    let key = req
        .request_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| address.clone());
    let bundle = state.decisions.get(&key).await.ok_or_else(bundle_not_found)?;

    let decision = req
        .masumi_decision
        .filter(|d| !d.trim().is_empty())
        .or_else(|| bundle.masumi_decision.clone())
        .ok_or_else(|| Error::BadRequest("masumiDecision is required".to_string()))?;

    if bundle.proof_id.is_some() {
        if bundle.masumi_decision.as_deref() != Some(decision.as_str()) {
            return Err(Error::Conflict(
                "A proof was already generated for a different decision".to_string(),
            ));
        }
        return Ok(Json(ContractLogResponse::from_bundle(bundle)?));
    }

    let contract = state
        .mocks
        .aiken
        .generate_contract_log(&ContractLogRequest {
            action: req.action,
            address: bundle.address.clone(),
            risk_score: bundle.risk_score,
            decision: decision.clone(),
        })
        .await;

    let updated = state
        .decisions
        .update(&bundle.request_id, |b| {
            if b.proof_id.is_some() {
                // Another request got there first.
                if b.masumi_decision.as_deref() == Some(decision.as_str()) {
                    return Ok(());
                }
                return Err(Error::Conflict(
                    "A proof was already generated for a different decision".to_string(),
                ));
            }
            let proof_id = new_proof_id();
            let hash = decision_hash(&DecisionCommitment {
                request_id: &b.request_id,
                address: &b.address,
                risk_score: b.risk_score,
                explanation: &b.explanation,
                features: &b.features,
                model_hash: &b.model_hash,
                masumi_decision: &decision,
                proof_id: &proof_id,
            });
            b.masumi_decision = Some(decision.clone());
            b.proof_id = Some(proof_id);
            b.decision_hash = Some(hash);
            b.unsigned_tx_hex = Some(contract.unsigned_tx_hex.clone());
            b.contract_id = Some(contract.contract_id.clone());
            b.status = DecisionStatus::ProofGenerated;
            Ok(())
        })
        .await?;

    info!(
        request_id = %request_id,
        bundle = %updated.request_id,
        proof_id = updated.proof_id.as_deref().unwrap_or_default(),
        "Proof generated"
    );

    Ok(Json(ContractLogResponse::from_bundle(updated)?))
}

/// GET /v1/decisions/{id}
pub async fn get_decision(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DecisionBundle>> {
    state
        .decisions
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| Error::NotFound("Decision not found".to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRequest {
    pub proof_id: Option<String>,
    pub strategy: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorResponse {
    pub anchored_tx_id: String,
    pub status: String,
    pub strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_id: Option<String>,
}

/// POST /v1/anchor
pub async fn anchor(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiJson(req): ApiJson<AnchorRequest>,
) -> Result<Json<AnchorResponse>> {
    let proof_id = required(req.proof_id, "proofId")?;
    let bundle = state
        .decisions
        .get(&proof_id)
        .await
        .ok_or_else(bundle_not_found)?;

    let Some(bundle_proof) = bundle.proof_id.clone() else {
        return Err(Error::Conflict(
            "No proof has been generated for this decision".to_string(),
        ));
    };

    let pending = |bundle: &DecisionBundle| AnchorResponse {
        anchored_tx_id: bundle.anchored_tx_id.clone().unwrap_or_default(),
        status: "pending".to_string(),
        strategy: bundle
            .anchor_strategy
            .clone()
            .unwrap_or_else(|| STRATEGY_L1.to_string()),
        snapshot_id: None,
        block_height: None,
        head_id: None,
    };

    if bundle.anchored_tx_id.is_some() {
        return Ok(Json(pending(&bundle)));
    }

    let strategy = match req.strategy.as_deref().map(str::to_ascii_lowercase) {
        Some(s) if s == STRATEGY_HYDRA => STRATEGY_HYDRA,
        _ => STRATEGY_L1,
    };

    let mut response = AnchorResponse {
        anchored_tx_id: String::new(),
        status: "pending".to_string(),
        strategy: strategy.to_string(),
        snapshot_id: None,
        block_height: None,
        head_id: None,
    };
    if strategy == STRATEGY_HYDRA {
        let hydra = &state.mocks.hydra;
        let head = hydra.query_state(&bundle.address).await;
        let snapshot = hydra
            .submit_snapshot(&json!({
                "proofId": bundle_proof,
                "decisionHash": bundle.decision_hash,
                "address": bundle.address,
            }))
            .await;
        response.anchored_tx_id = snapshot.on_chain_anchor.tx_hash;
        response.snapshot_id = Some(snapshot.snapshot_id);
        response.block_height = Some(snapshot.on_chain_anchor.block_height);
        response.head_id = head.proof_data["headId"].as_str().map(str::to_string);
    } else {
        response.anchored_tx_id = new_anchor_tx_id();
    }

    let tx_id = response.anchored_tx_id.clone();
    let updated = state
        .decisions
        .update(&bundle_proof, |b| {
            if b.anchored_tx_id.is_none() {
                b.anchored_tx_id = Some(tx_id);
                b.anchor_strategy = Some(strategy.to_string());
                b.status = DecisionStatus::Anchored;
            }
            Ok(())
        })
        .await?;

    if updated.anchored_tx_id.as_deref() != Some(response.anchored_tx_id.as_str()) {
        // Lost a race with a concurrent anchor; report the recorded one.
        return Ok(Json(pending(&updated)));
    }

    info!(
        request_id = %request_id,
        proof_id = %bundle_proof,
        anchored_tx_id = %response.anchored_tx_id,
        strategy,
        "Proof anchored"
    );
    Ok(Json(response))
}
