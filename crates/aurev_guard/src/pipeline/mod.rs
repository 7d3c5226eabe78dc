//! Background analysis pipelines.
//!
//! - [`live`] simulates an analysis with random features and timed progress.
//! - [`real`] fetches chain data, engineers features and asks the AI model.
//!
//! Both run as detached tokio tasks that report through a [`JobStore`]
//! and are bounded by a timeout. Finished jobs are evicted after a TTL.
//!
//! [`JobStore`]: crate::store::JobStore

pub mod live;
pub mod real;

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::WalletActivity;
use crate::error::{Error, Result};
use crate::store::JobStore;

/// Source of on-chain wallet data.
#[async_trait]
pub trait ChainDataSource: Send + Sync {
    /// Up to `max` most recent transactions involving `address`.
    async fn fetch_wallet_activity(&self, address: &str, max: usize) -> Result<WalletActivity>;

    /// Whether `tx_hash` paid at least `min_lovelace` to `address`.
    async fn verify_payment(&self, tx_hash: &str, min_lovelace: u64, address: &str) -> Result<bool>;
}

/// Run `work` for `job_id` under `timeout`, failing the job if it errors
/// or runs out of time, then evict the job once `ttl` has passed.
pub(crate) fn spawn_job<F>(jobs: JobStore, job_id: String, timeout: Duration, ttl: Duration, work: F)
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = match tokio::time::timeout(timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "Pipeline exceeded {}s",
                timeout.as_secs_f64()
            ))),
        };
        if let Err(e) = outcome {
            warn!(job_id = %job_id, error = %e, "Pipeline job failed");
            jobs.fail(&job_id, e.to_string(), Some("Failed")).await;
        }

        tokio::time::sleep(ttl).await;
        if jobs.remove(&job_id).await.is_some() {
            debug!(job_id = %job_id, "Evicted pipeline job");
        }
    });
}
