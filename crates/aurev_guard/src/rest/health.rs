//! Health and metadata endpoints

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::adapters::{check_services, ServiceHealthReport};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesHealthResponse {
    pub success: bool,
    pub all_healthy: bool,
    pub services: ServiceHealthReport,
}

/// GET /health/services
pub async fn services_health(State(state): State<AppState>) -> Json<ServicesHealthResponse> {
    let timeout = Duration::from_millis(state.config.agents.health_timeout_ms);
    let report = check_services(&state.orchestrator, &state.ai_model, &state.payment, timeout).await;
    Json(ServicesHealthResponse {
        success: true,
        all_healthy: report.all_healthy(),
        services: report,
    })
}

/// GET /project
pub async fn project(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "AUREV Guard",
        "tagline": "AI-assisted compliance screening for Cardano wallets",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "network": state.config.blockfrost.network,
        "features": [
            "Address risk scanning",
            "Masumi agent decisions",
            "Aiken compliance logging",
            "Hydra and L1 proof anchoring",
            "Live and real-data analysis pipelines",
        ],
        "flow": ["scan", "decision", "contract", "anchor"],
    }))
}
