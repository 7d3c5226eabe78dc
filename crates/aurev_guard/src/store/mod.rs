//! In-memory stores. Everything is lost on restart.

pub mod decisions;
pub mod history;
pub mod jobs;

pub use decisions::{DecisionBundle, DecisionStatus, DecisionStore};
pub use history::{HistoryStore, ScanRecord};
pub use jobs::{new_job_id, JobStatus, JobStore, PipelineJob};
