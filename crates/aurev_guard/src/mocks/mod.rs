//! In-process stand-ins for the chain and agent integrations.
//!
//! Each mock sleeps for its configured delay and then returns randomized
//! data shaped like the real service's response.

pub mod aiken;
pub mod blockfrost;
pub mod hydra;
pub mod masumi;

pub use aiken::{AikenMock, ContractLog, ContractLogRequest};
pub use blockfrost::{AddressInfo, AddressTransactions, BlockfrostMock, MockTransaction};
pub use hydra::{HydraMock, HydraSnapshot, HydraState};
pub use masumi::{AgentDecision, MasumiMock, RiskAssessment};

use std::time::Duration;

use crate::config::MockDelays;

/// All mocks, sharing one delay configuration.
#[derive(Debug, Clone)]
pub struct Mocks {
    pub blockfrost: BlockfrostMock,
    pub aiken: AikenMock,
    pub masumi: MasumiMock,
    pub hydra: HydraMock,
}

impl Mocks {
    pub fn new(delays: MockDelays) -> Self {
        Self {
            blockfrost: BlockfrostMock::new(delays.blockfrost_ms),
            aiken: AikenMock::new(delays.aiken_ms),
            masumi: MasumiMock::new(delays.masumi_ms),
            hydra: HydraMock::new(delays.hydra_ms),
        }
    }
}

pub(crate) async fn simulate_latency(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mocks_without_delay() {
        let mocks = Mocks::new(MockDelays::none());
        let decision = tokio_test::block_on(mocks.masumi.get_agent_decision(45.0, "addr_a"));
        assert_eq!(
            decision.risk_assessment.risk_level,
            crate::domain::RiskLevel::Medium
        );
    }
}
