//! Background pipeline jobs.
//!
//! Jobs only move forward: progress never decreases, and once a job is
//! completed or failed it is frozen until evicted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::proof::random_base36;

/// Highest progress a job reports before it completes.
pub const MAX_RUNNING_PROGRESS: u8 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineJob {
    pub job_id: String,
    pub wallet_address: String,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_tx_hash: Option<String>,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub start_time: DateTime<Utc>,
    pub completed_time: Option<DateTime<Utc>>,
    pub results: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl PipelineJob {
    /// A new job already in the processing state.
    pub fn processing(job_id: impl Into<String>, wallet_address: impl Into<String>, progress: u8) -> Self {
        Self {
            job_id: job_id.into(),
            wallet_address: wallet_address.into(),
            transaction_id: String::new(),
            payment_tx_hash: None,
            status: JobStatus::Processing,
            progress,
            stage: None,
            start_time: Utc::now(),
            completed_time: None,
            results: None,
            error: None,
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }
}

/// Job id of the form `<prefix>_<unix ms>_<7 base36 chars>`.
pub fn new_job_id(prefix: &str) -> String {
    format!(
        "{}_{}_{}",
        prefix,
        Utc::now().timestamp_millis(),
        random_base36(7)
    )
}

#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<String, PipelineJob>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: PipelineJob) {
        self.jobs.write().await.insert(job.job_id.clone(), job);
    }

    pub async fn get(&self, job_id: &str) -> Option<PipelineJob> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Move a processing job forward. Returns `false` when the job is gone
    /// or already finished, which tells the runner to stop.
    pub async fn advance(&self, job_id: &str, progress: u8, stage: Option<&str>) -> bool {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(job_id) else {
            return false;
        };
        if job.status != JobStatus::Processing {
            return false;
        }
        job.progress = job.progress.max(progress.min(MAX_RUNNING_PROGRESS));
        if let Some(stage) = stage {
            job.stage = Some(stage.to_string());
        }
        true
    }

    pub async fn complete(&self, job_id: &str, results: serde_json::Value, stage: Option<&str>) -> bool {
        self.finish(job_id, |job| {
            job.status = JobStatus::Completed;
            job.progress = 100;
            job.results = Some(results);
            if let Some(stage) = stage {
                job.stage = Some(stage.to_string());
            }
        })
        .await
    }

    pub async fn fail(&self, job_id: &str, error: impl Into<String>, stage: Option<&str>) -> bool {
        let error = error.into();
        self.finish(job_id, |job| {
            job.status = JobStatus::Failed;
            job.error = Some(error);
            if let Some(stage) = stage {
                job.stage = Some(stage.to_string());
            }
        })
        .await
    }

    async fn finish(&self, job_id: &str, f: impl FnOnce(&mut PipelineJob)) -> bool {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(job_id) {
            Some(job) if !job.status.is_finished() => {
                f(job);
                job.completed_time = Some(Utc::now());
                true
            }
            _ => false,
        }
    }

    pub async fn remove(&self, job_id: &str) -> Option<PipelineJob> {
        self.jobs.write().await.remove(job_id)
    }

    /// Completed jobs for a wallet, newest first.
    pub async fn completed_for_wallet(&self, wallet_address: &str, limit: usize) -> Vec<PipelineJob> {
        let mut jobs: Vec<PipelineJob> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|j| j.wallet_address == wallet_address && j.status == JobStatus::Completed)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.completed_time.cmp(&a.completed_time));
        jobs.truncate(limit);
        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_id_format() {
        let id = new_job_id("job_real");
        assert!(id.starts_with("job_real_"));
        let suffix = id.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 7);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_capped() {
        let store = JobStore::new();
        store.insert(PipelineJob::processing("j1", "addr_a", 10)).await;

        assert!(store.advance("j1", 40, Some("Engineering features...")).await);
        assert!(store.advance("j1", 20, None).await);
        assert_eq!(store.get("j1").await.unwrap().progress, 40);

        assert!(store.advance("j1", 120, None).await);
        let job = store.get("j1").await.unwrap();
        assert_eq!(job.progress, MAX_RUNNING_PROGRESS);
        assert_eq!(job.stage.as_deref(), Some("Engineering features..."));
    }

    #[tokio::test]
    async fn test_finished_jobs_are_frozen() {
        let store = JobStore::new();
        store.insert(PipelineJob::processing("j1", "addr_a", 10)).await;

        assert!(store.complete("j1", json!({"ok": true}), None).await);
        assert!(!store.fail("j1", "late failure", None).await);
        assert!(!store.advance("j1", 50, None).await);

        let job = store.get("j1").await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.error.is_none());
        assert!(job.completed_time.is_some());
    }

    #[tokio::test]
    async fn test_completed_for_wallet_newest_first() {
        let store = JobStore::new();
        for id in ["j1", "j2", "j3"] {
            store.insert(PipelineJob::processing(id, "addr_a", 10)).await;
        }
        store.insert(PipelineJob::processing("other", "addr_b", 10)).await;

        store.complete("j1", json!(1), None).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.complete("j3", json!(3), None).await;
        store.fail("j2", "boom", None).await;

        let done = store.completed_for_wallet("addr_a", 50).await;
        let ids: Vec<&str> = done.iter().map(|j| j.job_id.as_str()).collect();
        assert_eq!(ids, vec!["j3", "j1"]);

        assert_eq!(store.completed_for_wallet("addr_a", 1).await.len(), 1);
    }

    #[test]
    fn test_job_json_shape() {
        let job = PipelineJob::processing("j1", "addr_a", 5).with_stage("Initializing");
        let json = serde_json::to_value(job).unwrap();
        assert_eq!(json["jobId"], "j1");
        assert_eq!(json["walletAddress"], "addr_a");
        assert_eq!(json["status"], "processing");
        assert_eq!(json["stage"], "Initializing");
        assert!(json.get("paymentTxHash").is_none());
    }
}
