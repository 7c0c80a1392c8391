//! Task executor and the worker's schedulable tasks.
//!
//! Every unit of work (aggregate, export-X) goes through [`run_with_retry`]:
//! exponential backoff with randomized jitter, bounded attempts, exhaustion
//! logged and surfaced — never swallowed.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tracing::{error, info, warn};

use reftrack_core::sheets::SheetSink;
use reftrack_core::store::{CheckpointStore, EventStore, MetricsStore};
use reftrack_core::task::{RetryPolicy, Task};

use crate::state::AppState;

pub mod aggregate;
pub mod export_campaign;
pub mod export_officer;
pub mod export_raw;
pub mod export_time_series;

/// Run a task to completion under the uniform retry policy.
///
/// Each failed attempt is logged with the task name and error chain, then
/// retried after `backoff + jitter` where jitter is uniform over half the
/// backoff. The final error is returned to the caller so exhaustion stays
/// visible (`Err` here means permanently failed).
pub async fn run_with_retry(task: &dyn Task, policy: &RetryPolicy) -> anyhow::Result<String> {
    let mut attempt = 1u32;
    loop {
        match task.run().await {
            Ok(status) => {
                info!(task = task.name(), attempt, status = %status, "task succeeded");
                return Ok(status);
            }
            Err(err) if attempt < policy.max_attempts => {
                let backoff = policy.backoff_ms(attempt);
                let jitter = rand::thread_rng().gen_range(0..=backoff / 2 + 1);
                warn!(
                    task = task.name(),
                    attempt,
                    backoff_ms = backoff + jitter,
                    error = ?err,
                    "task attempt failed, retrying"
                );
                tokio::time::sleep(std::time::Duration::from_millis(backoff + jitter)).await;
                attempt += 1;
            }
            Err(err) => {
                error!(
                    task = task.name(),
                    attempts = attempt,
                    error = ?err,
                    "task permanently failed, retries exhausted"
                );
                return Err(err);
            }
        }
    }
}

pub struct AggregateTask {
    events: Arc<dyn EventStore>,
    metrics: Arc<dyn MetricsStore>,
}

impl AggregateTask {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            events: state.events.clone(),
            metrics: state.metrics.clone(),
        }
    }
}

#[async_trait]
impl Task for AggregateTask {
    fn name(&self) -> &str {
        aggregate::TASK_NAME
    }

    async fn run(&self) -> anyhow::Result<String> {
        aggregate::calculate_daily_metrics(self.events.as_ref(), self.metrics.as_ref()).await
    }
}

pub struct RawExportTask {
    events: Arc<dyn EventStore>,
    checkpoints: Arc<dyn CheckpointStore>,
    sink: Arc<dyn SheetSink>,
}

impl RawExportTask {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            events: state.events.clone(),
            checkpoints: state.checkpoints.clone(),
            sink: state.sink.clone(),
        }
    }
}

#[async_trait]
impl Task for RawExportTask {
    fn name(&self) -> &str {
        export_raw::TASK_NAME
    }

    async fn run(&self) -> anyhow::Result<String> {
        export_raw::export_raw_data(
            self.events.as_ref(),
            self.checkpoints.as_ref(),
            self.sink.as_ref(),
        )
        .await
    }
}

pub struct OfficerSummaryTask {
    metrics: Arc<dyn MetricsStore>,
    sink: Arc<dyn SheetSink>,
}

impl OfficerSummaryTask {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            metrics: state.metrics.clone(),
            sink: state.sink.clone(),
        }
    }
}

#[async_trait]
impl Task for OfficerSummaryTask {
    fn name(&self) -> &str {
        export_officer::TASK_NAME
    }

    async fn run(&self) -> anyhow::Result<String> {
        export_officer::export_officer_summary(self.metrics.as_ref(), self.sink.as_ref()).await
    }
}

pub struct CampaignSummaryTask {
    metrics: Arc<dyn MetricsStore>,
    sink: Arc<dyn SheetSink>,
}

impl CampaignSummaryTask {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            metrics: state.metrics.clone(),
            sink: state.sink.clone(),
        }
    }
}

#[async_trait]
impl Task for CampaignSummaryTask {
    fn name(&self) -> &str {
        export_campaign::TASK_NAME
    }

    async fn run(&self) -> anyhow::Result<String> {
        export_campaign::export_campaign_summary(self.metrics.as_ref(), self.sink.as_ref()).await
    }
}

pub struct TimeSeriesTask {
    metrics: Arc<dyn MetricsStore>,
    sink: Arc<dyn SheetSink>,
}

impl TimeSeriesTask {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            metrics: state.metrics.clone(),
            sink: state.sink.clone(),
        }
    }
}

#[async_trait]
impl Task for TimeSeriesTask {
    fn name(&self) -> &str {
        export_time_series::TASK_NAME
    }

    async fn run(&self) -> anyhow::Result<String> {
        export_time_series::export_time_series(self.metrics.as_ref(), self.sink.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyTask {
        attempts: AtomicU32,
        succeed_on: u32,
    }

    #[async_trait]
    impl Task for FlakyTask {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn run(&self) -> anyhow::Result<String> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.succeed_on {
                Ok(format!("succeeded on attempt {n}"))
            } else {
                anyhow::bail!("transient failure {n}")
            }
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 1,
            max_delay_ms: 4,
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let task = FlakyTask {
            attempts: AtomicU32::new(0),
            succeed_on: 3,
        };
        let status = run_with_retry(&task, &fast_policy()).await.expect("recovers");
        assert_eq!(status, "succeeded on attempt 3");
        assert_eq!(task.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_surfaces_failure() {
        let task = FlakyTask {
            attempts: AtomicU32::new(0),
            succeed_on: u32::MAX,
        };
        let err = run_with_retry(&task, &fast_policy())
            .await
            .expect_err("exhausts");
        assert!(err.to_string().contains("transient failure"));
        // Exactly max_attempts tries, no more.
        assert_eq!(task.attempts.load(Ordering::SeqCst), 5);
    }
}
