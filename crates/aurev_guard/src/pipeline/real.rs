//! Real-data analysis.
//!
//! Fetches the wallet's recent transactions from the chain source, reduces
//! them to the eight model features and asks the AI model agent for a
//! prediction. Progress moves through fixed stages.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::spawn_job;
use crate::adapters::PredictRequest;
use crate::domain::features::synthetic_activity;
use crate::domain::{build_wallet_features, is_valid_cardano_address};
use crate::error::{Error, Result};
use crate::state::AppState;
use crate::store::{new_job_id, PipelineJob};

pub const STAGE_INITIALIZING: &str = "Initializing";
pub const STAGE_FETCHING: &str = "Fetching live Blockfrost data...";
pub const STAGE_FEATURES: &str = "Engineering features...";
pub const STAGE_PREDICTING: &str = "Running AI models...";
pub const STAGE_COMPLETED: &str = "Completed";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRealRequest {
    pub wallet_address: Option<String>,
    pub payment_tx_hash: Option<String>,
}

/// Validate the request, check payment and start the job in the background.
pub async fn start(state: &AppState, request: StartRealRequest) -> Result<PipelineJob> {
    let wallet_address = request
        .wallet_address
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| Error::BadRequest("walletAddress is required".to_string()))?;

    if !is_valid_cardano_address(&wallet_address) {
        warn!(%wallet_address, "Rejected invalid wallet address");
        return Err(Error::BadRequest(
            "Invalid wallet address format. Must be a valid Cardano address (addr_test1... or addr1...)"
                .to_string(),
        ));
    }

    let payment_tx_hash = request.payment_tx_hash.filter(|h| !h.trim().is_empty());
    let payment = &state.config.payment;
    match &payment_tx_hash {
        Some(tx_hash) => {
            // Verification is advisory; a failed check is logged only.
            match state
                .chain
                .verify_payment(tx_hash, payment.min_lovelace(), &payment.address)
                .await
            {
                Ok(true) => info!(%tx_hash, "Payment verified on-chain"),
                Ok(false) => warn!(%tx_hash, "Payment could not be confirmed"),
                Err(e) => warn!(%tx_hash, error = %e, "Payment verification errored"),
            }
        }
        None if payment.required => {
            return Err(Error::PaymentRequired("Payment required".to_string()));
        }
        None => {}
    }

    let mut job = PipelineJob::processing(new_job_id("job_real"), &wallet_address, 5)
        .with_stage(STAGE_INITIALIZING);
    job.payment_tx_hash = payment_tx_hash;
    state.real_jobs.insert(job.clone()).await;

    info!(job_id = %job.job_id, %wallet_address, "Started real pipeline");

    let settings = &state.config.pipeline;
    spawn_job(
        state.real_jobs.clone(),
        job.job_id.clone(),
        settings.real_job_timeout(),
        settings.job_ttl(),
        run(state.clone(), job.job_id.clone(), wallet_address),
    );
    Ok(job)
}

async fn run(state: AppState, job_id: String, wallet_address: String) -> Result<()> {
    let jobs = &state.real_jobs;

    jobs.advance(&job_id, 10, Some(STAGE_FETCHING)).await;
    let activity = match state
        .chain
        .fetch_wallet_activity(&wallet_address, state.config.pipeline.max_transactions)
        .await
    {
        Ok(activity) => activity,
        Err(e @ Error::Config(_)) => return Err(e),
        Err(e) => {
            warn!(job_id = %job_id, error = %e, "Chain data unavailable, using synthetic activity");
            synthetic_activity(&wallet_address)
        }
    };
    info!(job_id = %job_id, transactions = activity.transaction_count, "Fetched wallet activity");

    jobs.advance(&job_id, 40, Some(STAGE_FEATURES)).await;
    let features = build_wallet_features(&wallet_address, &activity);

    jobs.advance(&job_id, 70, Some(STAGE_PREDICTING)).await;
    let request = PredictRequest {
        address: Some(wallet_address.clone()),
        transaction_id: None,
        features: serde_json::to_value(&features)?,
    };
    let prediction = state.ai_model.get_prediction(&request, None).await;

    let results = json!({
        "wallet_address": wallet_address,
        "timestamp": Utc::now().to_rfc3339(),
        "blockfrost_data": activity,
        "features": features,
        "prediction": {
            "risk_score": prediction.risk_score,
            "risk_label": prediction.risk_level,
            "anomaly_score": prediction.anomaly_score,
            "is_anomaly": prediction.is_anomaly,
            "confidence": prediction.confidence,
        },
        "model_prediction": prediction,
        "status": "success",
    });

    if jobs.complete(&job_id, results, Some(STAGE_COMPLETED)).await {
        info!(job_id = %job_id, %wallet_address, "Real pipeline completed");
    }
    Ok(())
}
