use async_trait::async_trait;

use super::{JobError, JobReport, JobSpec};

/// Trait for the work a pool slot performs.
///
/// Implementations own the whole transformation of one input file. The pool
/// guarantees at most `max_concurrency` concurrent `run` calls and treats a
/// returned error and a panic the same way: the slot is reclaimed and the
/// failure is counted.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Execute one job to completion.
    async fn run(&self, job: JobSpec) -> Result<JobReport, JobError>;
}
