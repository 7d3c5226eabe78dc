//! Pure domain logic: scoring, risk bands, address checks, proofs and
//! wallet features. Nothing in here touches the network.

pub mod address;
pub mod features;
pub mod proof;
pub mod risk;
pub mod scoring;

pub use address::is_valid_cardano_address;
pub use features::{build_wallet_features, WalletActivity, WalletFeatures};
pub use risk::RiskLevel;
pub use scoring::{fallback_score, score_address, AiScore};
