//! Live and real-data pipeline endpoints
//!
//! Both pipelines share the same three routes under their own prefix and
//! only differ in how a job is started and which job store backs them.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::ApiJson;
use crate::error::{Error, Result};
use crate::pipeline::live::{self, StartLiveRequest};
use crate::pipeline::real::{self, StartRealRequest};
use crate::state::AppState;
use crate::store::{JobStore, PipelineJob};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub success: bool,
    pub job_id: String,
    pub wallet_address: String,
    pub status: String,
    pub message: String,
}

impl StartResponse {
    fn started(job: PipelineJob, message: &str) -> Self {
        Self {
            success: true,
            job_id: job.job_id,
            wallet_address: job.wallet_address,
            status: "started".to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub success: bool,
    #[serde(flatten)]
    pub job: PipelineJob,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub job_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub results: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    pub success: bool,
    pub wallet_address: String,
    pub results: Vec<JobResult>,
    pub count: usize,
}

async fn job_status(jobs: &JobStore, job_id: &str) -> Result<Json<JobStatusResponse>> {
    let job = jobs
        .get(job_id)
        .await
        .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;
    Ok(Json(JobStatusResponse { success: true, job }))
}

async fn wallet_results(jobs: &JobStore, wallet_address: String, limit: usize) -> Json<ResultsResponse> {
    let results: Vec<JobResult> = jobs
        .completed_for_wallet(&wallet_address, limit)
        .await
        .into_iter()
        .map(|job| JobResult {
            job_id: job.job_id,
            timestamp: job.completed_time,
            results: job.results,
        })
        .collect();
    Json(ResultsResponse {
        success: true,
        wallet_address,
        count: results.len(),
        results,
    })
}

/// Routes under `/api/live-pipeline`.
pub fn live_router() -> Router<AppState> {
    Router::new()
        .route("/api/live-pipeline/start", post(start_live))
        .route("/api/live-pipeline/status/{job_id}", get(live_status))
        .route("/api/live-pipeline/results/{wallet_address}", get(live_results))
}

/// Routes under `/api/real-pipeline`.
pub fn real_router() -> Router<AppState> {
    Router::new()
        .route("/api/real-pipeline/start", post(start_real))
        .route("/api/real-pipeline/status/{job_id}", get(real_status))
        .route("/api/real-pipeline/results/{wallet_address}", get(real_results))
}

async fn start_live(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<StartLiveRequest>,
) -> Result<Json<StartResponse>> {
    let job = live::start(&state, req).await?;
    Ok(Json(StartResponse::started(job, "Live pipeline started")))
}

async fn live_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>> {
    job_status(&state.live_jobs, &job_id).await
}

async fn live_results(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Json<ResultsResponse> {
    wallet_results(&state.live_jobs, wallet_address, state.config.pipeline.results_limit).await
}

async fn start_real(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<StartRealRequest>,
) -> Result<Json<StartResponse>> {
    let job = real::start(&state, req).await?;
    Ok(Json(StartResponse::started(
        job,
        "Real-data pipeline started with live Blockfrost data",
    )))
}

async fn real_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>> {
    job_status(&state.real_jobs, &job_id).await
}

async fn real_results(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Json<ResultsResponse> {
    wallet_results(&state.real_jobs, wallet_address, state.config.pipeline.results_limit).await
}
