//! Storage trait seams.
//!
//! The worker talks to storage exclusively through these traits so the DuckDB
//! backend can be swapped (e.g. a Redis-backed [`CheckpointStore`]) without
//! touching task code.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::CoreError;
use crate::event::{ClickEvent, FraudFinding, RawEventRow, SignupEvent};
use crate::metrics::{CampaignSummary, DailyMetrics, DailyTotals, OfficerSummary, ReferralLink};

/// Read/write access to the raw click/signup event streams.
///
/// Time-windowed queries return joined, flat results (link, officer,
/// campaign resolved in the query itself) so callers never page through
/// per-row lookups.
#[async_trait]
pub trait EventStore: Send + Sync + 'static {
    async fn insert_click(&self, event: &ClickEvent) -> anyhow::Result<()>;
    async fn insert_signup(&self, event: &SignupEvent) -> anyhow::Result<()>;
    async fn get_click(&self, id: &str) -> anyhow::Result<Option<ClickEvent>>;
    async fn insert_fraud_finding(&self, finding: &FraudFinding) -> anyhow::Result<()>;

    /// Click count per referral link for one UTC day, from a single grouped
    /// query. Links with no clicks are absent from the map.
    async fn clicks_by_link_on(&self, date: NaiveDate) -> anyhow::Result<HashMap<String, i64>>;
    async fn signups_by_link_on(&self, date: NaiveDate) -> anyhow::Result<HashMap<String, i64>>;

    async fn list_referral_links(&self) -> anyhow::Result<Vec<ReferralLink>>;

    /// Click export rows strictly newer than `since`, ordered by
    /// (timestamp, id) for deterministic replay.
    async fn click_rows_after(&self, since: DateTime<Utc>) -> anyhow::Result<Vec<RawEventRow>>;
    /// Signup export rows strictly newer than `since`, same ordering;
    /// IP/user-agent inherited from the linked click when present.
    async fn signup_rows_after(&self, since: DateTime<Utc>) -> anyhow::Result<Vec<RawEventRow>>;

    /// Trailing-window fraud counters for one IP.
    async fn clicks_from_ip_since(&self, ip: &str, since: DateTime<Utc>) -> anyhow::Result<i64>;
    async fn distinct_links_from_ip_since(
        &self,
        ip: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<i64>;
}

/// Writes to the daily-metrics rollup and the grouped summary reads over it.
/// The aggregator is the only writer.
#[async_trait]
pub trait MetricsStore: Send + Sync + 'static {
    /// Insert-or-overwrite on the composite (link, officer, campaign, date)
    /// key. Re-running a day replaces rather than accumulates.
    async fn upsert_daily_metrics(&self, row: &DailyMetrics) -> anyhow::Result<()>;
    async fn get_daily_metrics(
        &self,
        referral_link_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<DailyMetrics>>;

    async fn officer_summaries(&self) -> anyhow::Result<Vec<OfficerSummary>>;
    async fn campaign_summaries(&self) -> anyhow::Result<Vec<CampaignSummary>>;
    /// Per-day totals over an inclusive date range, one grouped query. Days
    /// without rows are absent; callers zero-fill.
    async fn daily_totals(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<DailyTotals>>;
}

/// Durable task-name → last-exported-timestamp map. Absence of a key is the
/// valid "never run" state. Last-writer-wins per key; concurrent runs of the
/// same task are serialized by the scheduler, not here.
#[async_trait]
pub trait CheckpointStore: Send + Sync + 'static {
    async fn get_checkpoint(&self, task_name: &str) -> anyhow::Result<Option<String>>;
    async fn set_checkpoint(&self, task_name: &str, iso_ts: &str) -> anyhow::Result<()>;
}

/// Storage key for a task checkpoint.
pub fn checkpoint_key(task_name: &str) -> String {
    format!("checkpoint:{task_name}")
}

/// Parse a stored checkpoint timestamp.
///
/// Tries RFC 3339 first (the format we write), then two naive-UTC fallbacks
/// for values written by earlier deployments. Exhausting all strategies is
/// fatal for the run.
pub fn parse_checkpoint(value: &str) -> Result<DateTime<Utc>, CoreError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(CoreError::Checkpoint(value.to_string()))
}
