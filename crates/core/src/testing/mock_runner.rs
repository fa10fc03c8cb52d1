use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::pool::{JobError, JobReport, JobRunner, JobSpec};

/// A job observed by [`MockJobRunner`].
#[derive(Debug, Clone)]
pub struct RecordedJob {
    pub job: JobSpec,
    pub success: bool,
}

/// Mock [`JobRunner`] that records every call.
///
/// Defaults to succeeding instantly with an output path derived from the
/// input. Tests can inject a one-shot failure or panic, and give runs a
/// fixed duration to open up concurrency windows.
#[derive(Debug, Clone, Default)]
pub struct MockJobRunner {
    jobs: Arc<RwLock<Vec<RecordedJob>>>,
    next_error: Arc<RwLock<Option<JobError>>>,
    panic_on_next: Arc<RwLock<bool>>,
    job_duration: Arc<RwLock<Option<Duration>>>,
    concurrent: Arc<AtomicUsize>,
    max_concurrent_seen: Arc<AtomicUsize>,
}

impl MockJobRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs observed so far, in the order runs started.
    pub async fn recorded_jobs(&self) -> Vec<RecordedJob> {
        self.jobs.read().await.clone()
    }

    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Fail the next run with this error.
    pub async fn set_next_error(&self, error: JobError) {
        *self.next_error.write().await = Some(error);
    }

    /// Panic inside the next run.
    pub async fn set_panic_on_next(&self) {
        *self.panic_on_next.write().await = true;
    }

    /// Give every run a fixed duration.
    pub async fn set_job_duration(&self, duration: Duration) {
        *self.job_duration.write().await = Some(duration);
    }

    /// Highest number of overlapping runs observed.
    pub fn max_concurrent_seen(&self) -> usize {
        self.max_concurrent_seen.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobRunner for MockJobRunner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, job: JobSpec) -> Result<JobReport, JobError> {
        let overlapping = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_seen
            .fetch_max(overlapping, Ordering::SeqCst);

        let should_panic = std::mem::take(&mut *self.panic_on_next.write().await);
        let injected = self.next_error.write().await.take();
        let success = !should_panic && injected.is_none();
        self.jobs.write().await.push(RecordedJob {
            job: job.clone(),
            success,
        });

        let started = tokio::time::Instant::now();
        if let Some(duration) = *self.job_duration.read().await {
            tokio::time::sleep(duration).await;
        }

        self.concurrent.fetch_sub(1, Ordering::SeqCst);

        if should_panic {
            panic!("mock runner panic for job '{}'", job.job_id);
        }
        if let Some(error) = injected {
            return Err(error);
        }

        Ok(JobReport {
            job_id: job.job_id,
            input_path: job.input_path.clone(),
            output_path: Some(job.input_path.with_extension("out")),
            duration_ms: started.elapsed().as_millis() as u64,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_mock_records_jobs() {
        let runner = MockJobRunner::new();

        let report = runner
            .run(JobSpec::new("item-1", "/media/item-1.aax"))
            .await
            .unwrap();
        runner
            .run(JobSpec::new("item-2", "/media/item-2.aax"))
            .await
            .unwrap();

        assert_eq!(runner.job_count().await, 2);
        assert_eq!(report.output_path, Some(PathBuf::from("/media/item-1.out")));
        assert!(runner.recorded_jobs().await.iter().all(|j| j.success));
    }

    #[tokio::test]
    async fn test_error_injection_records_failure() {
        let runner = MockJobRunner::new();
        runner
            .set_next_error(JobError::failed("item-1", "no audio stream"))
            .await;

        let result = runner.run(JobSpec::new("item-1", "/media/item-1.aax")).await;
        assert!(result.is_err());

        let recorded = runner.recorded_jobs().await;
        assert_eq!(recorded.len(), 1);
        assert!(!recorded[0].success);

        // The injected error fires only once.
        let result = runner.run(JobSpec::new("item-2", "/media/item-2.aax")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[should_panic(expected = "mock runner panic")]
    async fn test_panic_injection() {
        let runner = MockJobRunner::new();
        runner.set_panic_on_next().await;
        let _ = runner.run(JobSpec::new("item-1", "/media/item-1.aax")).await;
    }

    #[tokio::test]
    async fn test_job_duration_delays_completion() {
        let runner = MockJobRunner::new();
        runner.set_job_duration(Duration::from_millis(50)).await;

        let started = tokio::time::Instant::now();
        runner
            .run(JobSpec::new("item-1", "/media/item-1.aax"))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_max_concurrent_tracks_overlap() {
        let runner = MockJobRunner::new();
        runner.set_job_duration(Duration::from_millis(50)).await;

        let (a, b, c) = tokio::join!(
            runner.run(JobSpec::new("item-1", "/media/item-1.aax")),
            runner.run(JobSpec::new("item-2", "/media/item-2.aax")),
            runner.run(JobSpec::new("item-3", "/media/item-3.aax")),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        assert_eq!(runner.max_concurrent_seen(), 3);
    }
}
