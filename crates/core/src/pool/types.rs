use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::JobError;

/// One unit of work for the pool: transform the file at `input_path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub job_id: String,
    pub input_path: PathBuf,
}

impl JobSpec {
    pub fn new(job_id: impl Into<String>, input_path: impl Into<PathBuf>) -> Self {
        Self {
            job_id: job_id.into(),
            input_path: input_path.into(),
        }
    }
}

/// What a runner hands back for a job that ran to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    pub input_path: PathBuf,
    /// Where the produced file landed, when the job produced one.
    pub output_path: Option<PathBuf>,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

/// Terminal result of one dispatched job, reported back to the dispatcher.
#[derive(Debug)]
pub(crate) enum JobOutcome {
    Completed { report: JobReport },
    Failed { job_id: String, error: JobError },
}

impl JobOutcome {
    pub(crate) fn job_id(&self) -> &str {
        match self {
            Self::Completed { report } => &report.job_id,
            Self::Failed { job_id, .. } => job_id,
        }
    }
}

/// Callback invoked from the job's own task after a successful run.
pub type JobCompleteCallback = Arc<dyn Fn(&JobReport) + Send + Sync>;

/// Point-in-time view of the pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
    pub running: bool,
    pub max_concurrency: usize,
    pub active_jobs: usize,
    pub queued_jobs: usize,
    pub total_completed: u64,
    pub total_failed: u64,
    pub active_job_ids: Vec<String>,
}
