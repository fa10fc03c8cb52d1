use thiserror::Error;

/// Errors produced by job execution.
#[derive(Debug, Error)]
pub enum JobError {
    /// The runner reported a failure for this job.
    #[error("job '{job_id}' failed: {reason}")]
    Failed { job_id: String, reason: String },

    /// The runner panicked while executing this job.
    #[error("job '{job_id}' panicked")]
    Panicked { job_id: String },

    /// File handling around the job failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    pub fn failed(job_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            job_id: job_id.into(),
            reason: reason.into(),
        }
    }
}
