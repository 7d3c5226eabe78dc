//! Simulated live analysis.
//!
//! Generates random wallet features, reports progress on a jittered timer
//! and finally asks the orchestrator's `ai_predict` workflow for a
//! prediction. When the orchestrator is unavailable a random prediction is
//! substituted so the demo always completes.

use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

use super::spawn_job;
use crate::adapters::orchestrator::WORKFLOW_AI_PREDICT;
use crate::domain::WalletFeatures;
use crate::error::{Error, Result};
use crate::state::AppState;
use crate::store::jobs::MAX_RUNNING_PROGRESS;
use crate::store::{new_job_id, PipelineJob};

const INITIAL_PROGRESS: u8 = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartLiveRequest {
    pub wallet_address: Option<String>,
    pub transaction_id: Option<String>,
}

/// Register a job and start it in the background.
pub async fn start(state: &AppState, request: StartLiveRequest) -> Result<PipelineJob> {
    let wallet_address = request
        .wallet_address
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| Error::BadRequest("walletAddress is required".to_string()))?;

    let mut job = PipelineJob::processing(new_job_id("job"), &wallet_address, INITIAL_PROGRESS);
    job.transaction_id = request.transaction_id.unwrap_or_default();
    state.live_jobs.insert(job.clone()).await;

    info!(job_id = %job.job_id, %wallet_address, "Started live pipeline");

    let settings = &state.config.pipeline;
    spawn_job(
        state.live_jobs.clone(),
        job.job_id.clone(),
        settings.job_timeout(),
        settings.job_ttl(),
        run(state.clone(), job.job_id.clone(), wallet_address, WalletFeatures::random()),
    );
    Ok(job)
}

fn random_prediction(wallet_address: &str) -> Value {
    let mut rng = rand::rng();
    json!({
        "wallet_address": wallet_address,
        "risk_score": rng.random::<f64>(),
        "risk_label": if rng.random_bool(0.4) { "HIGH" } else { "LOW" },
        "anomaly_score": rng.random::<f64>(),
        "is_anomaly": rng.random_bool(0.2),
        "confidence": rng.random::<f64>(),
    })
}

/// Pull the agent's prediction out of an orchestrator reply.
pub(crate) fn extract_prediction(reply: &Value) -> Value {
    match reply.get("prediction") {
        Some(p) => p.get("data").unwrap_or(p).clone(),
        None => json!({}),
    }
}

async fn run(state: AppState, job_id: String, wallet_address: String, features: WalletFeatures) -> Result<()> {
    let settings = state.config.pipeline.clone();

    let mut progress = u32::from(INITIAL_PROGRESS);
    while progress < u32::from(MAX_RUNNING_PROGRESS) {
        let jitter = rand::rng().random_range(0..=settings.progress_jitter_ms);
        tokio::time::sleep(Duration::from_millis(settings.progress_tick_ms + jitter)).await;
        let reported = progress.min(u32::from(MAX_RUNNING_PROGRESS)) as u8;
        if !state.live_jobs.advance(&job_id, reported, None).await {
            return Ok(());
        }
        progress += rand::rng().random_range(5..25);
    }

    let payload = features.to_payload(&wallet_address);
    let reply = match state.orchestrator.route(WORKFLOW_AI_PREDICT, payload).await {
        Ok(routed) => routed.data,
        Err(e) => {
            warn!(job_id = %job_id, error = %e, "Orchestrator prediction failed, using random prediction");
            json!({
                "workflow": WORKFLOW_AI_PREDICT,
                "status": "error",
                "error": e.to_string(),
                "prediction": { "data": random_prediction(&wallet_address) },
            })
        }
    };

    let prediction = extract_prediction(&reply);
    let field = |key: &str, default: Value| prediction.get(key).filter(|v| !v.is_null()).cloned().unwrap_or(default);
    let results = json!({
        "wallet_address": wallet_address,
        "timestamp": Utc::now().to_rfc3339(),
        "features": features,
        "prediction": {
            "risk_score": field("risk_score", json!(rand::rng().random::<f64>())),
            "risk_label": field("risk_label", json!(if rand::rng().random_bool(0.4) { "HIGH" } else { "LOW" })),
            "anomaly_score": field("anomaly_score", json!(0)),
            "is_anomaly": field("is_anomaly", json!(false)),
            "confidence": field("confidence", json!(0.5)),
        },
        "status": "success",
        "orchestrator_response": prediction,
    });

    if state.live_jobs.complete(&job_id, results, None).await {
        info!(job_id = %job_id, %wallet_address, "Live pipeline completed");
    }
    Ok(())
}
