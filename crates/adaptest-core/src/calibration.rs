//! Online item-parameter calibration.
//!
//! [`adjust`] is the pure nudge applied after each response. The rest of the
//! module runs it out of band: a [`CalibrationQueue`] accepts jobs without
//! ever blocking the session loop, and a background task applies them to an
//! [`ItemParameterStore`] with optimistic-concurrency retries. Dropped or
//! failed jobs only affect future administrations, never a live estimate.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

use crate::config::CalibrationConfig;
use crate::error::CalibrationError;
use crate::model::{ItemParameters, ResponseRecord};

/// Nudge an item's parameters after one observed response.
///
/// Difficulty moves down by `learning_rate` when the answer was correct and
/// up otherwise. Discrimination moves by up to `learning_rate` depending on
/// how the response time compares with `expected_response_secs` (faster
/// raises it, slower lowers it) and never falls below
/// `discrimination_floor`. Guessing is unchanged.
pub fn adjust(
    current: &ItemParameters,
    correct: bool,
    response_time_secs: f64,
    config: &CalibrationConfig,
) -> ItemParameters {
    let lr = config.learning_rate;
    let difficulty = if correct {
        current.difficulty - lr
    } else {
        current.difficulty + lr
    };

    let pace = if response_time_secs.is_finite() && response_time_secs >= 0.0 {
        1.0 - (response_time_secs / config.expected_response_secs).clamp(0.0, 2.0)
    } else {
        0.0
    };
    let discrimination = (current.discrimination + lr * pace).max(config.discrimination_floor);

    ItemParameters {
        difficulty,
        discrimination,
        guessing: current.guessing,
    }
}

/// Parameters together with the version they were stored under.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VersionedParameters {
    pub params: ItemParameters,
    pub version: u64,
}

/// Shared storage for item parameters.
///
/// Writers must go through [`compare_and_swap`](Self::compare_and_swap) so
/// concurrent calibrations of the same item never lose updates.
#[async_trait]
pub trait ItemParameterStore: Send + Sync {
    async fn load(&self, item_id: &str) -> anyhow::Result<VersionedParameters>;

    /// Store `params` if the item is still at `expected_version`; returns the new version.
    async fn compare_and_swap(
        &self,
        item_id: &str,
        expected_version: u64,
        params: ItemParameters,
    ) -> anyhow::Result<u64>;
}

/// In-process store backed by a `tokio::sync::RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    items: RwLock<HashMap<String, VersionedParameters>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (String, ItemParameters)>,
    {
        let map = items
            .into_iter()
            .map(|(id, params)| (id, VersionedParameters { params, version: 0 }))
            .collect();
        Self {
            items: RwLock::new(map),
        }
    }

    pub async fn insert(&self, item_id: impl Into<String>, params: ItemParameters) {
        self.items
            .write()
            .await
            .insert(item_id.into(), VersionedParameters { params, version: 0 });
    }

    /// Copy of every stored item.
    pub async fn snapshot(&self) -> HashMap<String, VersionedParameters> {
        self.items.read().await.clone()
    }
}

#[async_trait]
impl ItemParameterStore for InMemoryItemStore {
    async fn load(&self, item_id: &str) -> anyhow::Result<VersionedParameters> {
        self.items
            .read()
            .await
            .get(item_id)
            .copied()
            .ok_or_else(|| CalibrationError::UnknownItem(item_id.to_string()).into())
    }

    async fn compare_and_swap(
        &self,
        item_id: &str,
        expected_version: u64,
        params: ItemParameters,
    ) -> anyhow::Result<u64> {
        let mut items = self.items.write().await;
        let entry = items
            .get_mut(item_id)
            .ok_or_else(|| CalibrationError::UnknownItem(item_id.to_string()))?;
        if entry.version != expected_version {
            return Err(CalibrationError::VersionConflict {
                item_id: item_id.to_string(),
                expected: expected_version,
                found: entry.version,
            }
            .into());
        }
        entry.params = params;
        entry.version += 1;
        Ok(entry.version)
    }
}

/// One observed response to feed back into an item's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationJob {
    pub item_id: String,
    pub correct: bool,
    pub response_time_secs: f64,
}

impl From<&ResponseRecord> for CalibrationJob {
    fn from(record: &ResponseRecord) -> Self {
        Self {
            item_id: record.item_id.clone(),
            correct: record.correct,
            response_time_secs: record.response_time_secs,
        }
    }
}

/// Counters reported when the worker shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationStats {
    /// Jobs written to the store.
    pub applied: u64,
    /// Version conflicts that triggered a retry.
    pub conflicts: u64,
    /// Jobs abandoned after a permanent error or exhausted retries.
    pub failed: u64,
    /// Jobs rejected at submission because the queue was full or closed.
    pub dropped: u64,
}

/// Fire-and-forget front end for the calibration worker.
pub struct CalibrationQueue {
    sender: mpsc::Sender<CalibrationJob>,
    dropped: u64,
    worker: JoinHandle<CalibrationStats>,
}

impl CalibrationQueue {
    /// Start a worker task that applies jobs to `store`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: Arc<dyn ItemParameterStore>, config: CalibrationConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let worker = tokio::spawn(run_worker(store, config, receiver));
        Self {
            sender,
            dropped: 0,
            worker,
        }
    }

    /// Enqueue a job without waiting. Returns `false` if it was dropped.
    pub fn submit(&mut self, job: CalibrationJob) -> bool {
        match self.sender.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                tracing::warn!(item_id = %job.item_id, "calibration queue full, dropping job");
                self.dropped += 1;
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                tracing::warn!(item_id = %job.item_id, "calibration worker stopped, dropping job");
                self.dropped += 1;
                false
            }
        }
    }

    /// Close the queue, wait for pending jobs to drain, and report totals.
    pub async fn shutdown(self) -> anyhow::Result<CalibrationStats> {
        drop(self.sender);
        let mut stats = self
            .worker
            .await
            .map_err(|e| anyhow::anyhow!("calibration worker panicked: {e}"))?;
        stats.dropped += self.dropped;
        Ok(stats)
    }
}

async fn run_worker(
    store: Arc<dyn ItemParameterStore>,
    config: CalibrationConfig,
    mut receiver: mpsc::Receiver<CalibrationJob>,
) -> CalibrationStats {
    let mut stats = CalibrationStats::default();
    while let Some(job) = receiver.recv().await {
        apply_job(store.as_ref(), &config, &job, &mut stats).await;
    }
    tracing::debug!(
        applied = stats.applied,
        conflicts = stats.conflicts,
        failed = stats.failed,
        "calibration worker finished"
    );
    stats
}

const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

async fn apply_job(
    store: &dyn ItemParameterStore,
    config: &CalibrationConfig,
    job: &CalibrationJob,
    stats: &mut CalibrationStats,
) {
    let mut retry_delay = Duration::from_millis(config.retry_delay_ms);
    for attempt in 0..=config.max_retries {
        match try_apply(store, config, job).await {
            Ok(version) => {
                tracing::debug!(item_id = %job.item_id, version, "item recalibrated");
                stats.applied += 1;
                return;
            }
            Err(e) => match e.downcast_ref::<CalibrationError>() {
                Some(CalibrationError::VersionConflict { .. }) => {
                    stats.conflicts += 1;
                    tracing::debug!(item_id = %job.item_id, attempt, "version conflict, retrying");
                }
                Some(err) if err.is_permanent() => {
                    tracing::warn!(item_id = %job.item_id, "calibration skipped: {err}");
                    stats.failed += 1;
                    return;
                }
                _ => {
                    tracing::warn!(item_id = %job.item_id, attempt, "calibration attempt failed: {e:#}");
                    if attempt < config.max_retries {
                        tokio::time::sleep(retry_delay).await;
                        retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
                    }
                }
            },
        }
    }

    tracing::warn!(item_id = %job.item_id, "calibration gave up after {} retries", config.max_retries);
    stats.failed += 1;
}

async fn try_apply(
    store: &dyn ItemParameterStore,
    config: &CalibrationConfig,
    job: &CalibrationJob,
) -> anyhow::Result<u64> {
    let current = store.load(&job.item_id).await?;
    let updated = adjust(&current.params, job.correct, job.response_time_secs, config);
    store
        .compare_and_swap(&job.item_id, current.version, updated)
        .await
}
