//! Per-address scan history

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::state::AppState;
use crate::store::ScanRecord;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryData {
    pub address: String,
    pub total_scans: usize,
    pub history: Vec<ScanRecord>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub data: HistoryData,
}

/// GET /risk/history/{address}
pub async fn get_history(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<HistoryResponse> {
    let history = state.history.get_history(&address).await;
    Json(HistoryResponse {
        success: true,
        data: HistoryData {
            address,
            total_scans: history.len(),
            history,
        },
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearHistoryResponse {
    pub success: bool,
    pub message: String,
    pub deleted: usize,
}

/// DELETE /risk/history/{address}
pub async fn clear_history(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<ClearHistoryResponse> {
    let deleted = state.history.clear_history(&address).await;
    info!(%address, deleted, "Cleared scan history");
    Json(ClearHistoryResponse {
        success: true,
        message: format!("History cleared for {}", address),
        deleted,
    })
}
