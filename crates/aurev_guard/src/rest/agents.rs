//! Payment agent and orchestrator passthrough endpoints

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::ApiJson;
use crate::adapters::{RiskSummary, SettleRequest};
use crate::domain::RiskLevel;
use crate::error::{Error, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleBody {
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub features: Value,
    pub risk_score: Option<f64>,
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub is_anomaly: bool,
    pub use_orchestrator: Option<bool>,
}

/// POST /agent/settle
///
/// With a `riskScore` the settlement is routed with the risk assessment
/// attached and any failure counts as a rejection. Without one the payment
/// agent validates the transaction alone.
pub async fn settle(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SettleBody>,
) -> Result<Json<Value>> {
    let transaction_id = body
        .transaction_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::BadRequest("transactionId is required".to_string()))?;
    let request = SettleRequest {
        transaction_id,
        features: if body.features.is_null() {
            json!({})
        } else {
            body.features
        },
    };

    let data = match body.risk_score {
        Some(risk_score) => {
            let risk = RiskSummary {
                risk_score,
                risk_level: body
                    .risk_level
                    .unwrap_or_else(|| RiskLevel::from_agent_score(risk_score)),
                is_anomaly: body.is_anomaly,
            };
            serde_json::to_value(state.payment.validate_with_compliance(&request, &risk).await)?
        }
        None => serde_json::to_value(
            state
                .payment
                .get_settle_validation(&request, body.use_orchestrator)
                .await,
        )?,
    };
    Ok(Json(json!({ "success": true, "data": data })))
}

/// GET /orchestrator/agents
pub async fn list_agents(State(state): State<AppState>) -> Result<Json<Value>> {
    let agents = state.orchestrator.list_agents().await?;
    Ok(Json(json!({ "success": true, "data": agents })))
}

#[derive(Debug, Deserialize)]
pub struct RouteBody {
    pub workflow: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

/// POST /orchestrator/route
pub async fn route_workflow(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RouteBody>,
) -> Result<Json<Value>> {
    let workflow = body
        .workflow
        .filter(|w| !w.trim().is_empty())
        .ok_or_else(|| Error::BadRequest("workflow is required".to_string()))?;
    let payload = if body.payload.is_null() {
        json!({})
    } else {
        body.payload
    };
    let routed = state.orchestrator.route(&workflow, payload).await?;
    Ok(Json(json!({
        "success": true,
        "workflow": routed.workflow,
        "correlationId": routed.correlation_id,
        "data": routed.data,
    })))
}
