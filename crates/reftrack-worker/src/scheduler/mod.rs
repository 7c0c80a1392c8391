//! Recurring triggers.
//!
//! Two independent loops: the raw incremental export on its own cadence
//! (15 minutes by default) and the daily aggregate
//! pipeline at a configured UTC hour. Both delegate to the same task
//! implementations as manual triggers, so scheduled and on-demand runs are
//! identical. At most one in-flight instance per task name: each loop awaits
//! its run before ticking again.

use std::sync::Arc;

use chrono::{Timelike, Utc};
use tracing::{error, info};

use crate::pipeline::trigger_daily_pipeline;
use crate::state::AppState;
use crate::tasks::{run_with_retry, RawExportTask};

pub async fn run_raw_export_loop(state: Arc<AppState>) {
    let period = state.config.raw_export_interval();
    info!(period_secs = period.as_secs(), "raw export scheduler started");
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let task = RawExportTask::from_state(&state);
        if let Err(err) = run_with_retry(&task, &state.config.retry).await {
            // Already logged with full context by the retry wrapper; the
            // next tick starts a fresh run from the unchanged checkpoint.
            error!(error = %err, "scheduled raw export permanently failed");
        }
    }
}

pub async fn run_daily_pipeline_loop(state: Arc<AppState>) {
    let tick = state.config.scheduler_tick_seconds;
    let hour = state.config.pipeline_hour_utc;
    info!(tick_seconds = tick, pipeline_hour_utc = hour, "daily pipeline scheduler started");
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(tick));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_triggered = None;
    loop {
        interval.tick().await;
        let now = Utc::now();
        let today = now.date_naive();
        if now.hour() == hour && last_triggered != Some(today) {
            last_triggered = Some(today);
            let job = trigger_daily_pipeline(&state).await;
            info!(job_id = %job.job_id, "scheduled daily pipeline triggered");
        }
    }
}
