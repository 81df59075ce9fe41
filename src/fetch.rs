use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use futures::future::join_all;

use crate::card::FetchTask;
use crate::error::RankerError;
use crate::report::{BatchReport, EventReport};
use crate::scoring::{score_event, ScoringConfig};
use crate::source::EventSource;

pub const DEFAULT_CONCURRENCY: usize = 3;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Called with (completed, total) after every task resolves.
pub type Progress<'a> = &'a (dyn Fn(usize, usize) + Sync);

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Maximum retrievals in flight at once
    pub concurrency: usize,
    /// Deadline for a single retrieval
    pub fetch_timeout: Duration,
    /// Reference date for "days since" scoring
    pub as_of: NaiveDate,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            as_of: chrono::Local::now().date_naive(),
        }
    }
}

/// Retrieve and score every task with bounded concurrency.
///
/// Exactly `min(concurrency, tasks)` workers pull from a shared queue. A task
/// that fails to fetch, times out, or yields no valid entrants is dropped and
/// logged; the batch only fails when nothing at all was scored. Results come
/// back in completion order.
pub async fn fetch_and_rank_events(
    source: &dyn EventSource,
    tasks: Vec<FetchTask>,
    scoring: &ScoringConfig,
    options: &FetchOptions,
    progress: Option<Progress<'_>>,
) -> std::result::Result<Vec<EventReport>, RankerError> {
    let total = tasks.len();
    let workers = options.concurrency.max(1).min(total);
    let queue = Mutex::new(VecDeque::from(tasks));
    let completed = AtomicUsize::new(0);

    tracing::info!(source = source.name(), tasks = total, workers, "fetching events");

    let pool = Pool {
        source,
        queue: &queue,
        completed: &completed,
        total,
        scoring,
        options,
        progress,
    };
    let batches = join_all((0..workers).map(|id| pool.run_worker(id))).await;
    let reports: Vec<EventReport> = batches.into_iter().flatten().collect();

    tracing::info!(scored = reports.len(), dropped = total - reports.len(), "fetch complete");

    if reports.is_empty() {
        return Err(RankerError::NothingRetrieved { attempted: total });
    }
    Ok(reports)
}

/// Run the whole pipeline and wrap the results in a batch document.
pub async fn fetch_batch(
    key: &str,
    source: &dyn EventSource,
    tasks: Vec<FetchTask>,
    scoring: &ScoringConfig,
    options: &FetchOptions,
    progress: Option<Progress<'_>>,
) -> Result<BatchReport> {
    let events = fetch_and_rank_events(source, tasks, scoring, options, progress).await?;
    Ok(BatchReport::new(key, Utc::now(), events))
}

/// State shared by the workers of one run
#[derive(Clone, Copy)]
struct Pool<'a> {
    source: &'a dyn EventSource,
    queue: &'a Mutex<VecDeque<FetchTask>>,
    completed: &'a AtomicUsize,
    total: usize,
    scoring: &'a ScoringConfig,
    options: &'a FetchOptions,
    progress: Option<Progress<'a>>,
}

impl<'a> Pool<'a> {
    fn next_task(&self) -> Option<FetchTask> {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    async fn run_worker(self, worker: usize) -> Vec<EventReport> {
        let mut reports = Vec::new();
        while let Some(task) = self.next_task() {
            match self.process(&task).await {
                Ok(report) => {
                    tracing::debug!(worker, event = %task.event_key, entrants = report.entrants.len(), "event scored");
                    reports.push(report);
                }
                Err(e) => {
                    tracing::warn!(worker, event = %task.event_key, error = %format!("{:#}", e), "dropping event");
                }
            }

            let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(progress) = self.progress {
                progress(done, self.total);
            }
        }
        reports
    }

    async fn process(&self, task: &FetchTask) -> Result<EventReport> {
        let timeout = self.options.fetch_timeout;
        let card = match tokio::time::timeout(timeout, self.source.fetch(task)).await {
            Ok(fetched) => fetched?,
            Err(_) => {
                return Err(RankerError::Timeout {
                    event_key: task.event_key.clone(),
                    after: timeout,
                }
                .into())
            }
        };
        let report = score_event(card, self.scoring, self.options.as_of)?;
        Ok(report)
    }
}
