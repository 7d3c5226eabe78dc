//! REST API endpoints for AUREV Guard
//!
//! ## Endpoints
//!
//! ### Health
//! - `GET    /health` - Liveness
//! - `GET    /health/services` - Sibling agent health
//! - `GET    /project` - Landing metadata
//!
//! ### Scoring
//! - `POST   /ai/score` - Deterministic address score
//! - `POST   /ai/predict` - AI model agent prediction
//! - `POST   /scan/address` - Scan an address and open a decision bundle
//!
//! ### Decisions
//! - `POST   /agent/decision` - Masumi agent decision
//! - `POST   /contract/log` - Generate proof and unsigned transaction
//! - `GET    /v1/decisions/{id}` - Bundle by proof id, request id or address
//! - `POST   /v1/anchor` - Anchor a proof (L1 or Hydra)
//!
//! ### History
//! - `GET    /risk/history/{address}` - Scan history
//! - `DELETE /risk/history/{address}` - Clear scan history
//!
//! ### Agents
//! - `POST   /agent/settle` - Payment agent validation
//! - `GET    /orchestrator/agents` - Registered agents
//! - `POST   /orchestrator/route` - Route an arbitrary workflow
//!
//! ### Pipelines
//! - `POST   /api/live-pipeline/start`, `GET .../status/{jobId}`, `GET .../results/{walletAddress}`
//! - `POST   /api/real-pipeline/start`, `GET .../status/{jobId}`, `GET .../results/{walletAddress}`

mod agents;
mod decision;
mod health;
mod pipeline;
mod risk;
mod scan;

pub use decision::{AnchorResponse, ContractLogResponse, DecisionResponse};

use axum::extract::FromRequest;
use axum::{
    routing::{get, post},
    Router,
};

use crate::error::Error;
use crate::state::AppState;

/// `Json` extractor whose rejections use the API error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// Create REST API router
pub fn router() -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health::health))
        .route("/health/services", get(health::services_health))
        .route("/project", get(health::project))
        // Scoring
        .route("/ai/score", post(scan::ai_score))
        .route("/ai/predict", post(scan::ai_predict))
        .route("/scan/address", post(scan::scan_address))
        // Decision bundle flow
        .route("/agent/decision", post(decision::agent_decision))
        .route("/contract/log", post(decision::contract_log))
        .route("/v1/decisions/{id}", get(decision::get_decision))
        .route("/v1/anchor", post(decision::anchor))
        // History
        .route(
            "/risk/history/{address}",
            get(risk::get_history).delete(risk::clear_history),
        )
        // Agents
        .route("/agent/settle", post(agents::settle))
        .route("/orchestrator/agents", get(agents::list_agents))
        .route("/orchestrator/route", post(agents::route_workflow))
        // Pipelines
        .merge(pipeline::live_router())
        .merge(pipeline::real_router())
}
