//! Background indexing job queue.
//!
//! Jobs are lightweight descriptions of index work (add, update, or remove
//! one asset). The queue is in-process and unpersisted: a restart loses
//! pending jobs, and [`super::worker::IndexWorker::process_all_unvectorized`]
//! is the recovery path that re-enqueues whatever the entity store still
//! reports as unindexed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tokio::sync::Mutex;
use tracing::debug;

/// Default attempt ceiling before a job is dropped.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// What the job does to the asset's vector records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOp {
    /// Write records for a newly created asset.
    Add,
    /// Delete stale records, then write fresh ones.
    Update,
    /// Delete all records for a removed asset.
    Remove,
}

impl JobOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobOp::Add => "add",
            JobOp::Update => "update",
            JobOp::Remove => "remove",
        }
    }
}

/// Scheduling priority. Higher variants drain first; jobs of equal
/// priority drain in enqueue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    Low,
    Normal,
    High,
}

/// One unit of indexing work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexJob {
    /// `{op}-{asset_id}-{created_at_millis}`, unique enough for logs.
    pub id: String,
    pub op: JobOp,
    pub asset_id: String,
    pub priority: JobPriority,
    /// Failed attempts so far.
    pub attempts: u32,
    pub max_attempts: u32,
    /// Enqueue time, unix millis.
    pub created_at: i64,
}

impl IndexJob {
    pub fn new(op: JobOp, asset_id: impl Into<String>, priority: JobPriority) -> Self {
        let asset_id = asset_id.into();
        let created_at = Utc::now().timestamp_millis();
        Self {
            id: format!("{}-{}-{}", op.as_str(), asset_id, created_at),
            op,
            asset_id,
            priority,
            attempts: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            created_at,
        }
    }

    /// Creation jobs run at high priority so fresh uploads become
    /// searchable quickly.
    pub fn add(asset_id: impl Into<String>) -> Self {
        Self::new(JobOp::Add, asset_id, JobPriority::High)
    }

    pub fn update(asset_id: impl Into<String>) -> Self {
        Self::new(JobOp::Update, asset_id, JobPriority::Normal)
    }

    /// Removals run at high priority: deleted content must stop surfacing
    /// in results promptly.
    pub fn remove(asset_id: impl Into<String>) -> Self {
        Self::new(JobOp::Remove, asset_id, JobPriority::High)
    }

    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Record a failed attempt and demote to low priority so retries do
    /// not starve fresh work.
    pub fn record_failure(&mut self) {
        self.attempts += 1;
        self.priority = JobPriority::Low;
    }

    pub fn should_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }
}

/// In-process job queue with priority draining.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: Mutex<Vec<IndexJob>>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue(&self, job: IndexJob) {
        debug!(
            "enqueue {} (priority {:?}, attempt {})",
            job.id, job.priority, job.attempts
        );
        self.jobs.lock().await.push(job);
    }

    pub async fn enqueue_all(&self, jobs: impl IntoIterator<Item = IndexJob>) {
        let mut pending = self.jobs.lock().await;
        pending.extend(jobs);
    }

    /// Remove and return up to `limit` jobs, highest priority first and
    /// FIFO within a priority level.
    pub async fn drain_batch(&self, limit: usize) -> Vec<IndexJob> {
        let mut pending = self.jobs.lock().await;
        // Stable sort keeps enqueue order within each priority.
        pending.sort_by_key(|job| Reverse(job.priority));
        let take = limit.min(pending.len());
        pending.drain(..take).collect()
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.jobs.lock().await.clear();
    }
}
