//! Background index worker.
//!
//! The worker is the explicit consumer of the [`JobQueue`]: asset
//! lifecycle notifications enqueue jobs, and a periodic tick drains a
//! bounded batch and runs each job through the [`IndexingPipeline`].
//! Failed jobs are retried at low priority up to their attempt ceiling,
//! then dropped with an error log.

use crate::retrieval::job_queue::{IndexJob, JobOp, JobPriority, JobQueue};
use crate::retrieval::pipeline::IndexingPipeline;
use crate::storage::AssetStore;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct IndexWorkerConfig {
    /// Jobs drained per tick.
    pub batch_size: usize,
    /// Delay between ticks.
    pub tick_interval: Duration,
}

impl Default for IndexWorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            tick_interval: Duration::from_secs(5),
        }
    }
}

impl IndexWorkerConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }
}

/// Counters for one tick, for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub processed: usize,
    pub failed: usize,
    pub retried: usize,
    pub dropped: usize,
}

/// Drains the job queue and applies jobs through the pipeline.
pub struct IndexWorker {
    queue: Arc<JobQueue>,
    pipeline: Arc<IndexingPipeline>,
    store: Arc<dyn AssetStore>,
    config: IndexWorkerConfig,
    shutdown: Notify,
}

impl IndexWorker {
    pub fn new(
        queue: Arc<JobQueue>,
        pipeline: Arc<IndexingPipeline>,
        store: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            queue,
            pipeline,
            store,
            config: IndexWorkerConfig::default(),
            shutdown: Notify::new(),
        }
    }

    pub fn with_config(mut self, config: IndexWorkerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    /// Asset created: index it at high priority.
    pub async fn notify_created(&self, asset_id: &str) {
        self.queue.enqueue(IndexJob::add(asset_id)).await;
    }

    /// Asset content or metadata changed: re-index at normal priority.
    pub async fn notify_updated(&self, asset_id: &str) {
        self.queue.enqueue(IndexJob::update(asset_id)).await;
    }

    /// Asset deleted: sweep its records at high priority.
    pub async fn notify_removed(&self, asset_id: &str) {
        self.queue.enqueue(IndexJob::remove(asset_id)).await;
    }

    /// Recovery sweep: enqueue an add job for every asset the store still
    /// reports as unindexed. Low priority, so live notifications keep
    /// draining first. Returns how many jobs were enqueued.
    pub async fn process_all_unvectorized(&self) -> Result<usize> {
        let assets = self.store.list_unindexed().await?;
        let count = assets.len();
        self.queue
            .enqueue_all(assets.into_iter().map(|asset| {
                IndexJob::new(JobOp::Add, asset.id, JobPriority::Low)
            }))
            .await;
        info!("enqueued {count} unindexed assets for vectorization");
        Ok(count)
    }

    /// Full rebuild: enqueue an update job for every asset, low priority.
    /// Used after embedding model or searchable-text format changes.
    pub async fn re_vectorize_all(&self) -> Result<usize> {
        let assets = self.store.list_all().await?;
        let count = assets.len();
        self.queue
            .enqueue_all(assets.into_iter().map(|asset| {
                IndexJob::new(JobOp::Update, asset.id, JobPriority::Low)
            }))
            .await;
        info!("enqueued {count} assets for re-vectorization");
        Ok(count)
    }

    /// Drain one batch and run every job in it. Job failures are absorbed
    /// into retry bookkeeping; only the stats surface to the caller.
    pub async fn tick(&self) -> TickStats {
        let batch = self.queue.drain_batch(self.config.batch_size).await;
        let mut stats = TickStats::default();

        for mut job in batch {
            let result = match job.op {
                JobOp::Add => self.pipeline.add(&job.asset_id).await.map(|_| ()),
                JobOp::Update => self.pipeline.update(&job.asset_id).await.map(|_| ()),
                JobOp::Remove => self.pipeline.remove(&job.asset_id).await.map(|_| ()),
            };
            match result {
                Ok(()) => {
                    stats.processed += 1;
                }
                Err(e) => {
                    stats.failed += 1;
                    job.record_failure();
                    if job.should_retry() {
                        warn!(
                            "job {} failed (attempt {} of {}): {e:#}; re-enqueued at low priority",
                            job.id, job.attempts, job.max_attempts
                        );
                        stats.retried += 1;
                        self.queue.enqueue(job).await;
                    } else {
                        error!(
                            "job {} dropped after {} attempts: {e:#}",
                            job.id, job.attempts
                        );
                        stats.dropped += 1;
                    }
                }
            }
        }
        stats
    }

    /// Run ticks on an interval until [`IndexWorker::shutdown`] is called.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // One pinned future for the whole loop: a shutdown signaled
            // while a tick is running completes it on the next poll
            // instead of being dropped with a recreated future.
            let shutdown = self.shutdown.notified();
            tokio::pin!(shutdown);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let stats = self.tick().await;
                        if stats.processed + stats.failed > 0 {
                            debug!(
                                "tick: {} ok, {} failed ({} retried, {} dropped)",
                                stats.processed, stats.failed, stats.retried, stats.dropped
                            );
                        }
                    }
                    _ = &mut shutdown => {
                        debug!("index worker shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// Stop the spawned loop after its current tick. `notify_one` stores a
    /// permit, so the signal also takes effect when issued before the loop
    /// first parks.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}
