//! Clients for the services AUREV Guard talks to over HTTP.
//!
//! Every adapter degrades gracefully: callers that cannot proceed without
//! an answer get an `Err`, everything else gets a marked fallback value.

pub mod ai_model;
pub mod ai_scorer;
pub mod blockfrost;
pub mod http;
pub mod orchestrator;
pub mod payment;

pub use ai_model::{AiModelAdapter, ModelPrediction, PredictRequest};
pub use ai_scorer::AiScorerClient;
pub use blockfrost::BlockfrostClient;
pub use http::{AgentHttp, HealthStatus};
pub use orchestrator::{OrchestratorClient, RouteResult};
pub use payment::{PaymentAgentAdapter, RiskSummary, SettleRequest, SettleValidation};

use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Health of every sibling agent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealthReport {
    pub orchestrator: HealthStatus,
    pub ai_model: HealthStatus,
    pub payment: HealthStatus,
}

impl ServiceHealthReport {
    pub fn all_healthy(&self) -> bool {
        self.orchestrator.healthy && self.ai_model.healthy && self.payment.healthy
    }

    pub fn log_summary(&self) {
        let mark = |h: &HealthStatus| if h.healthy { "ready" } else { "unavailable" };
        info!(
            orchestrator = mark(&self.orchestrator),
            ai_model = mark(&self.ai_model),
            payment = mark(&self.payment),
            "Integration service health"
        );
        if self.all_healthy() {
            info!("All integration services ready");
        } else {
            warn!("Some integration services are unavailable; fallbacks will be used");
        }
    }
}

async fn bounded<F>(timeout: Duration, probe: F) -> HealthStatus
where
    F: Future<Output = HealthStatus>,
{
    tokio::time::timeout(timeout, probe)
        .await
        .unwrap_or_else(|_| HealthStatus::down("Service initialization timeout"))
}

/// Probe all sibling agents concurrently. Probes still running after
/// `timeout` are reported as unavailable.
pub async fn check_services(
    orchestrator: &OrchestratorClient,
    ai_model: &AiModelAdapter,
    payment: &PaymentAgentAdapter,
    timeout: Duration,
) -> ServiceHealthReport {
    let (orchestrator, ai_model, payment) = tokio::join!(
        bounded(timeout, orchestrator.check_health()),
        bounded(timeout, ai_model.check_health()),
        bounded(timeout, payment.check_health()),
    );
    ServiceHealthReport {
        orchestrator,
        ai_model,
        payment,
    }
}
