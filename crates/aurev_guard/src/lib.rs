//! # AUREV Guard - Compliance Scanning API
//!
//! Backend for screening Cardano wallet addresses before they interact with
//! a dApp. A scan opens a *decision bundle* that then collects an agent
//! decision, a hashed proof with an unsigned contract transaction, and
//! finally an anchor on L1 or in a Hydra head.
//!
//! ## Features
//!
//! - **Scanning**: deterministic address scoring with an AI stub fallback
//! - **Decision bundles**: Masumi decision, Aiken contract log, anchoring
//! - **Agents**: AI model and payment agents, direct or via the orchestrator
//! - **Pipelines**: simulated live analysis and real Blockfrost analysis
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    AUREV Guard API                       │
//! ├──────────────────────────────────────────────────────────┤
//! │   rest::router  ──►  store (decisions, history, jobs)    │
//! │        │                                                 │
//! │        ├──►  mocks (Blockfrost, Aiken, Masumi, Hydra)    │
//! │        ├──►  adapters (orchestrator, AI, payment, BF)    │
//! │        └──►  pipeline (live, real)                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aurev_guard::{GuardConfig, GuardServer};
//!
//! #[tokio::main]
//! async fn main() -> aurev_guard::Result<()> {
//!     let server = GuardServer::new(GuardConfig::default().with_port(3000));
//!     server.run().await
//! }
//! ```
//!
//! ## Example
//!
//! ```bash
//! curl -X POST http://localhost:3000/scan/address \
//!   -H "Content-Type: application/json" \
//!   -d '{"address": "addr_test1qz..."}'
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod mocks;
pub mod pipeline;
pub mod rest;
pub mod server;
pub mod state;
pub mod store;

pub use config::GuardConfig;
pub use error::{Error, Result};
pub use server::GuardServer;
pub use state::AppState;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::GuardConfig;
    pub use crate::domain::{AiScore, RiskLevel};
    pub use crate::error::{Error, Result};
    pub use crate::pipeline::ChainDataSource;
    pub use crate::server::GuardServer;
    pub use crate::state::AppState;
    pub use crate::store::{DecisionBundle, DecisionStatus, PipelineJob};
}
