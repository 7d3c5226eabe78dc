//! The shared application state for the AUREV Guard API server.

use std::sync::Arc;

use crate::adapters::{
    AiModelAdapter, AiScorerClient, BlockfrostClient, OrchestratorClient, PaymentAgentAdapter,
};
use crate::config::GuardConfig;
use crate::mocks::Mocks;
use crate::pipeline::ChainDataSource;
use crate::store::{DecisionStore, HistoryStore, JobStore};

/// The shared state accessible by all API handlers.
///
/// Stores are internally synchronized, so cloning the state is cheap and
/// every clone sees the same data.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GuardConfig>,
    /// Decision bundles, by request id, address and proof id.
    pub decisions: DecisionStore,
    /// Scan history per address.
    pub history: HistoryStore,
    /// Jobs of the simulated pipeline.
    pub live_jobs: JobStore,
    /// Jobs of the real-data pipeline.
    pub real_jobs: JobStore,
    /// In-process Blockfrost, Aiken, Masumi and Hydra stand-ins.
    pub mocks: Mocks,
    pub scorer: AiScorerClient,
    pub orchestrator: Arc<OrchestratorClient>,
    pub ai_model: AiModelAdapter,
    pub payment: PaymentAgentAdapter,
    /// Live chain data for the real-data pipeline.
    pub chain: Arc<dyn ChainDataSource>,
}

impl AppState {
    /// Creates the state for `config`, reading chain data from Blockfrost.
    pub fn new(config: GuardConfig) -> Self {
        let chain = Arc::new(BlockfrostClient::new(config.blockfrost.clone()));
        Self::with_chain_source(config, chain)
    }

    /// Creates the state with a custom chain data source.
    pub fn with_chain_source(config: GuardConfig, chain: Arc<dyn ChainDataSource>) -> Self {
        let orchestrator = Arc::new(OrchestratorClient::new(&config.agents));
        Self {
            decisions: DecisionStore::new(),
            history: HistoryStore::new(),
            live_jobs: JobStore::new(),
            real_jobs: JobStore::new(),
            mocks: Mocks::new(config.mock_delays),
            scorer: AiScorerClient::new(&config.agents),
            ai_model: AiModelAdapter::new(&config.agents, orchestrator.clone()),
            payment: PaymentAgentAdapter::new(&config.agents, orchestrator.clone()),
            orchestrator,
            chain,
            config: Arc::new(config),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}
