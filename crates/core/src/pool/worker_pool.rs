use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{broadcast, mpsc, Mutex, Notify, RwLock};
use tokio::task::JoinHandle;

use crate::metrics;

use super::{
    ArtifactTracker, JobCompleteCallback, JobError, JobOutcome, JobReport, JobRunner, JobSpec,
    PoolConfig, PoolStatus,
};

/// Counters shared between the pool handle and its dispatcher.
#[derive(Debug, Default)]
struct PoolStats {
    active: AtomicU64,
    queued: AtomicU64,
    total_completed: AtomicU64,
    total_failed: AtomicU64,
}

impl PoolStats {
    fn outstanding(&self) -> u64 {
        self.queued.load(Ordering::Relaxed) + self.active.load(Ordering::Relaxed)
    }

    fn to_status(
        &self,
        running: bool,
        max_concurrency: usize,
        active_job_ids: Vec<String>,
    ) -> PoolStatus {
        PoolStatus {
            running,
            max_concurrency,
            active_jobs: self.active.load(Ordering::Relaxed) as usize,
            queued_jobs: self.queued.load(Ordering::Relaxed) as usize,
            total_completed: self.total_completed.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            active_job_ids,
        }
    }
}

/// Bounded-concurrency scheduler for media jobs.
///
/// Jobs queue in submission order and run as soon as one of
/// `max_concurrency` slots frees up. Completions flow back to the dispatch
/// loop over a channel, and that loop is the only place slots are counted:
/// a job that fails or panics releases its slot exactly like one that
/// succeeds.
pub struct WorkerPool<R: JobRunner + 'static> {
    config: PoolConfig,
    runner: Arc<R>,
    on_complete: Option<JobCompleteCallback>,
    pending_tx: mpsc::UnboundedSender<JobSpec>,
    pending_rx: Mutex<Option<mpsc::UnboundedReceiver<JobSpec>>>,
    stats: Arc<PoolStats>,
    active_ids: Arc<RwLock<HashSet<String>>>,
    idle: Arc<Notify>,
    artifacts: ArtifactTracker,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    dispatcher_task: Mutex<Option<JoinHandle<()>>>,
}

impl<R: JobRunner + 'static> WorkerPool<R> {
    /// Create a stopped pool. Jobs can be submitted right away; nothing
    /// runs until [`start`](Self::start).
    pub fn new(config: PoolConfig, runner: Arc<R>) -> Self {
        let (pending_tx, pending_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            runner,
            on_complete: None,
            pending_tx,
            pending_rx: Mutex::new(Some(pending_rx)),
            stats: Arc::new(PoolStats::default()),
            active_ids: Arc::new(RwLock::new(HashSet::new())),
            idle: Arc::new(Notify::new()),
            artifacts: ArtifactTracker::new(),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            dispatcher_task: Mutex::new(None),
        }
    }

    /// Register a callback invoked from the job's own task after each
    /// successful run. Failed jobs do not fire it.
    pub fn with_on_complete(
        mut self,
        callback: impl Fn(&JobReport) + Send + Sync + 'static,
    ) -> Self {
        self.on_complete = Some(Arc::new(callback));
        self
    }

    /// Share an artifact tracker with the runners feeding this pool.
    pub fn with_artifacts(mut self, artifacts: ArtifactTracker) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Tracker for scratch files swept at shutdown.
    pub fn artifacts(&self) -> ArtifactTracker {
        self.artifacts.clone()
    }

    /// Queue a job for execution.
    ///
    /// Never blocks and never fails. Execution starts only while the pool is
    /// running and a slot is free; jobs submitted before `start` wait in
    /// submission order.
    pub fn submit(&self, job: JobSpec) {
        tracing::debug!("Queueing job '{}'", job.job_id);
        self.stats.queued.fetch_add(1, Ordering::Relaxed);
        metrics::JOBS_QUEUED.inc();
        if self.pending_tx.send(job).is_err() {
            self.stats.queued.fetch_sub(1, Ordering::Relaxed);
            metrics::JOBS_QUEUED.dec();
            tracing::error!("Worker pool dispatcher is gone; job dropped");
        }
    }

    /// Start dispatching queued jobs.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Worker pool already running");
            return;
        }
        let maybe_rx = self.pending_rx.lock().await.take();
        let Some(pending_rx) = maybe_rx else {
            tracing::warn!("Worker pool cannot be started again after shutdown");
            self.running.store(false, Ordering::SeqCst);
            return;
        };
        tracing::info!(
            "Worker pool started with runner '{}' (max concurrency {})",
            self.runner.name(),
            self.config.max_concurrency
        );
        let dispatcher = Self::dispatch_loop(
            pending_rx,
            self.shutdown_tx.subscribe(),
            Arc::clone(&self.runner),
            self.on_complete.clone(),
            Arc::clone(&self.stats),
            Arc::clone(&self.active_ids),
            Arc::clone(&self.idle),
            self.config.max_concurrency.max(1),
        );
        *self.dispatcher_task.lock().await = Some(tokio::spawn(dispatcher));
    }

    /// Current counters and the ids of jobs being worked on.
    pub async fn status(&self) -> PoolStatus {
        let mut active_job_ids: Vec<String> =
            self.active_ids.read().await.iter().cloned().collect();
        active_job_ids.sort();
        self.stats.to_status(
            self.running.load(Ordering::SeqCst),
            self.config.max_concurrency,
            active_job_ids,
        )
    }

    /// Wait until every queued and active job has finished.
    ///
    /// There is no timeout; callers own the decision to give up. Only
    /// meaningful on a started pool, since queued jobs never finish
    /// otherwise.
    pub async fn drain(&self) {
        loop {
            let idle = self.idle.notified();
            if self.stats.outstanding() == 0 {
                return;
            }
            idle.await;
        }
    }

    /// Stop dispatching, wait for the dispatch loop to exit and sweep
    /// tracked job artifacts. Jobs already running finish in the background
    /// but release no further work.
    pub async fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            tracing::warn!("Worker pool not running");
            return;
        }
        tracing::info!("Stopping worker pool");
        let _ = self.shutdown_tx.send(());
        if let Some(task) = self.dispatcher_task.lock().await.take() {
            if let Err(e) = task.await {
                tracing::error!("Worker pool dispatcher task failed: {}", e);
            }
        }
        let removed = self.artifacts.sweep().await;
        if removed > 0 {
            tracing::info!("Removed {} leftover job artifact(s)", removed);
        }
        tracing::info!("Worker pool stopped");
    }

    async fn dispatch_loop(
        mut pending_rx: mpsc::UnboundedReceiver<JobSpec>,
        mut shutdown_rx: broadcast::Receiver<()>,
        runner: Arc<R>,
        on_complete: Option<JobCompleteCallback>,
        stats: Arc<PoolStats>,
        active_ids: Arc<RwLock<HashSet<String>>>,
        idle: Arc<Notify>,
        max_concurrency: usize,
    ) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<JobOutcome>();
        let mut live: usize = 0;

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::debug!("Worker pool dispatcher received shutdown signal");
                    break;
                }
                Some(outcome) = done_rx.recv() => {
                    live -= 1;
                    stats.active.fetch_sub(1, Ordering::Relaxed);
                    metrics::JOBS_ACTIVE.dec();
                    active_ids.write().await.remove(outcome.job_id());
                    match &outcome {
                        JobOutcome::Completed { report } => {
                            stats.total_completed.fetch_add(1, Ordering::Relaxed);
                            metrics::JOBS_COMPLETED.inc();
                            tracing::debug!(
                                "Job '{}' completed in {}ms",
                                report.job_id,
                                report.duration_ms
                            );
                        }
                        JobOutcome::Failed { job_id, error } => {
                            stats.total_failed.fetch_add(1, Ordering::Relaxed);
                            metrics::JOBS_FAILED.inc();
                            tracing::error!("Job '{}' failed: {}", job_id, error);
                        }
                    }
                    if live == 0 && stats.queued.load(Ordering::Relaxed) == 0 {
                        idle.notify_waiters();
                    }
                }
                maybe_job = pending_rx.recv(), if live < max_concurrency => {
                    let Some(job) = maybe_job else {
                        tracing::debug!("Worker pool job queue closed");
                        break;
                    };
                    live += 1;
                    stats.active.fetch_add(1, Ordering::Relaxed);
                    metrics::JOBS_ACTIVE.inc();
                    stats.queued.fetch_sub(1, Ordering::Relaxed);
                    metrics::JOBS_QUEUED.dec();
                    active_ids.write().await.insert(job.job_id.clone());
                    tracing::debug!(
                        "Dispatching job '{}' ({}/{} slots busy)",
                        job.job_id,
                        live,
                        max_concurrency
                    );
                    tokio::spawn(Self::run_job(
                        job,
                        Arc::clone(&runner),
                        on_complete.clone(),
                        done_tx.clone(),
                    ));
                }
            }
        }
    }

    async fn run_job(
        job: JobSpec,
        runner: Arc<R>,
        on_complete: Option<JobCompleteCallback>,
        done_tx: mpsc::UnboundedSender<JobOutcome>,
    ) {
        let job_id = job.job_id.clone();
        // catch_unwind also covers the callback, so a panicking handler
        // cannot keep the outcome from reaching the dispatcher.
        let result = AssertUnwindSafe(async {
            let report = runner.run(job).await?;
            if let Some(callback) = on_complete.as_ref() {
                callback(&report);
            }
            Ok::<_, JobError>(report)
        })
        .catch_unwind()
        .await;

        let outcome = match result {
            Ok(Ok(report)) => JobOutcome::Completed { report },
            Ok(Err(error)) => JobOutcome::Failed {
                job_id: job_id.clone(),
                error,
            },
            Err(_) => JobOutcome::Failed {
                job_id: job_id.clone(),
                error: JobError::Panicked {
                    job_id: job_id.clone(),
                },
            },
        };
        if done_tx.send(outcome).is_err() {
            tracing::debug!(
                "Worker pool dispatcher gone before job '{}' reported completion",
                job_id
            );
        }
    }
}
