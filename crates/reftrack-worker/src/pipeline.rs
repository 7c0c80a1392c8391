//! Daily pipeline orchestrator.
//!
//! A single triggered job runs as a two-stage graph:
//!
//! ```text
//! START -> calculate_daily_metrics (serial)
//!       -> { export_campaign_summary, export_time_series,
//!            export_officer_summary } (parallel, failure-isolated)
//!       -> DONE
//! ```
//!
//! The serial stage must succeed before the parallel stage is dispatched —
//! the summaries read the metrics the aggregator just wrote. The trigger is
//! fire-and-forget: it returns the job id and child task ids immediately
//! while the stages run in the background; terminal states land in the
//! [`JobRegistry`], where permanent failures stay queryable.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use reftrack_core::task::Task;

use crate::state::AppState;
use crate::tasks::{
    run_with_retry, AggregateTask, CampaignSummaryTask, OfficerSummaryTask, TimeSeriesTask,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded(String),
    Failed(String),
    /// Parallel-stage task never dispatched because the serial stage failed.
    Skipped(String),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Succeeded(_) | TaskState::Failed(_) | TaskState::Skipped(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub task_id: String,
    pub job_id: String,
    pub task_name: String,
    pub state: TaskState,
}

/// In-process job/task state, keyed by job id. Kept for the lifetime of the
/// worker so operators can query the outcome of any triggered job.
#[derive(Clone, Default)]
pub struct JobRegistry {
    inner: Arc<RwLock<HashMap<String, Vec<TaskRecord>>>>,
}

impl JobRegistry {
    async fn register(&self, job_id: &str, task_id: &str, task_name: &str) {
        self.inner
            .write()
            .await
            .entry(job_id.to_string())
            .or_default()
            .push(TaskRecord {
                task_id: task_id.to_string(),
                job_id: job_id.to_string(),
                task_name: task_name.to_string(),
                state: TaskState::Pending,
            });
    }

    async fn set_state(&self, job_id: &str, task_id: &str, state: TaskState) {
        let mut jobs = self.inner.write().await;
        if let Some(records) = jobs.get_mut(job_id) {
            if let Some(record) = records.iter_mut().find(|r| r.task_id == task_id) {
                record.state = state;
            }
        }
    }

    pub async fn tasks_for_job(&self, job_id: &str) -> Vec<TaskRecord> {
        self.inner
            .read()
            .await
            .get(job_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn job_is_done(&self, job_id: &str) -> bool {
        let records = self.tasks_for_job(job_id).await;
        !records.is_empty() && records.iter().all(|r| r.state.is_terminal())
    }
}

/// Identifiers handed back by the trigger for observability.
#[derive(Debug, Clone)]
pub struct PipelineJob {
    pub job_id: String,
    /// Child task ids in dispatch order: aggregate first, then the three
    /// parallel exports.
    pub task_ids: Vec<String>,
}

pub async fn trigger_daily_pipeline(state: &Arc<AppState>) -> PipelineJob {
    let job_id = Uuid::new_v4().to_string();
    let registry = state.jobs.clone();

    let aggregate = AggregateTask::from_state(state);
    let exports: Vec<Box<dyn Task + Send + Sync>> = vec![
        Box::new(CampaignSummaryTask::from_state(state)),
        Box::new(TimeSeriesTask::from_state(state)),
        Box::new(OfficerSummaryTask::from_state(state)),
    ];

    let aggregate_id = Uuid::new_v4().to_string();
    registry.register(&job_id, &aggregate_id, aggregate.name()).await;
    let mut export_ids = Vec::new();
    for export in &exports {
        let task_id = Uuid::new_v4().to_string();
        registry.register(&job_id, &task_id, export.name()).await;
        export_ids.push(task_id);
    }

    let mut task_ids = vec![aggregate_id.clone()];
    task_ids.extend(export_ids.iter().cloned());

    let policy = state.config.retry;
    let driver_job_id = job_id.clone();
    tokio::spawn(async move {
        // Serial stage: today's metrics must exist before any summary reads.
        registry
            .set_state(&driver_job_id, &aggregate_id, TaskState::Running)
            .await;
        let aggregated = run_with_retry(&aggregate, &policy).await;
        match aggregated {
            Ok(status) => {
                registry
                    .set_state(&driver_job_id, &aggregate_id, TaskState::Succeeded(status))
                    .await;
            }
            Err(err) => {
                registry
                    .set_state(
                        &driver_job_id,
                        &aggregate_id,
                        TaskState::Failed(err.to_string()),
                    )
                    .await;
                for task_id in &export_ids {
                    registry
                        .set_state(
                            &driver_job_id,
                            task_id,
                            TaskState::Skipped("aggregation stage failed".to_string()),
                        )
                        .await;
                }
                warn!(job_id = %driver_job_id, "pipeline aborted: aggregation stage failed");
                return;
            }
        }

        // Parallel stage: independent spawns, one exhaustion never cancels
        // or blocks the siblings.
        let mut handles = Vec::new();
        for (export, task_id) in exports.into_iter().zip(export_ids) {
            let registry = registry.clone();
            let job_id = driver_job_id.clone();
            handles.push(tokio::spawn(async move {
                registry.set_state(&job_id, &task_id, TaskState::Running).await;
                let state = match run_with_retry(export.as_ref(), &policy).await {
                    Ok(status) => TaskState::Succeeded(status),
                    Err(err) => TaskState::Failed(err.to_string()),
                };
                registry.set_state(&job_id, &task_id, state).await;
            }));
        }
        for handle in handles {
            if let Err(err) = handle.await {
                warn!(job_id = %driver_job_id, error = %err, "export task panicked");
            }
        }
        info!(job_id = %driver_job_id, "daily pipeline finished");
    });

    info!(job_id = %job_id, tasks = task_ids.len(), "daily pipeline triggered");
    PipelineJob { job_id, task_ids }
}
