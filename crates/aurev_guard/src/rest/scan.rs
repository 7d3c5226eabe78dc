//! Address scanning and scoring endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::ApiJson;
use crate::adapters::{ModelPrediction, PredictRequest};
use crate::domain::{score_address, AiScore};
use crate::error::{Error, Result};
use crate::middleware::RequestId;
use crate::state::AppState;
use crate::store::{DecisionBundle, ScanRecord};

/// Recent transactions pulled per scan.
const SCAN_TX_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    pub address: Option<String>,
}

fn required_address(address: Option<String>) -> Result<String> {
    address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .ok_or_else(|| Error::BadRequest("address is required".to_string()))
}

/// POST /scan/address
///
/// The request id keys the decision bundle, so a reused id is a conflict.
pub async fn scan_address(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiJson(req): ApiJson<AddressRequest>,
) -> Result<Json<ScanRecord>> {
    let address = required_address(req.address)?;

    let blockfrost = &state.mocks.blockfrost;
    let (info, txs) = tokio::join!(
        blockfrost.get_address_info(&address),
        blockfrost.get_address_transactions(&address, SCAN_TX_LIMIT),
    );
    let (score, fallback) = state.scorer.score(&address).await;

    state
        .decisions
        .insert(DecisionBundle::from_score(request_id.as_str(), &score))
        .await?;

    let record = ScanRecord {
        request_id: request_id.0.clone(),
        address,
        risk_score: score.risk_score,
        risk_level: score.risk_level,
        explanation: score.explanation,
        features: score.features,
        model_hash: score.model_hash,
        timestamp: score.timestamp,
        transaction_count: txs.transactions.len(),
        balance: info.balance,
        first_seen: info.first_tx,
        last_activity: info.last_tx,
        fallback,
    };
    state.history.add_scan(record.clone()).await;

    info!(
        request_id = %request_id,
        address = %record.address,
        risk_score = record.risk_score,
        fallback,
        "Scan complete"
    );

    Ok(Json(record))
}

/// POST /ai/score
pub async fn ai_score(ApiJson(req): ApiJson<AddressRequest>) -> Result<Json<AiScore>> {
    let address = required_address(req.address)?;
    Ok(Json(score_address(&address)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiPredictRequest {
    pub address: Option<String>,
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub features: Value,
    pub use_orchestrator: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct AiPredictResponse {
    pub success: bool,
    pub data: ModelPrediction,
}

/// POST /ai/predict
pub async fn ai_predict(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AiPredictRequest>,
) -> Result<Json<AiPredictResponse>> {
    if req.address.is_none() && req.features.is_null() {
        return Err(Error::BadRequest(
            "address or features is required".to_string(),
        ));
    }
    let request = PredictRequest {
        address: req.address,
        transaction_id: req.transaction_id,
        features: if req.features.is_null() { json!({}) } else { req.features },
    };
    let prediction = state
        .ai_model
        .get_prediction(&request, req.use_orchestrator)
        .await;
    Ok(Json(AiPredictResponse {
        success: true,
        data: prediction,
    }))
}
