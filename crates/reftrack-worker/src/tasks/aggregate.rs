//! Daily metrics aggregation.

use chrono::{NaiveDate, Utc};
use tracing::info;

use reftrack_core::metrics::{conversion_rate, DailyMetrics};
use reftrack_core::store::{EventStore, MetricsStore};

pub const TASK_NAME: &str = "calculate_daily_metrics";

/// Compute and upsert today's per-link metrics.
///
/// The UTC day boundary is fixed once for the whole run. Counts come from
/// two grouped queries (clicks by link, signups by link) rather than one
/// query per link, then every referral link gets a row, zero counts
/// included. Re-running the same day overwrites, never accumulates.
pub async fn calculate_daily_metrics(
    events: &dyn EventStore,
    metrics: &dyn MetricsStore,
) -> anyhow::Result<String> {
    calculate_daily_metrics_for(events, metrics, Utc::now().date_naive()).await
}

pub async fn calculate_daily_metrics_for(
    events: &dyn EventStore,
    metrics: &dyn MetricsStore,
    date: NaiveDate,
) -> anyhow::Result<String> {
    let clicks = events.clicks_by_link_on(date).await?;
    let signups = events.signups_by_link_on(date).await?;
    let links = events.list_referral_links().await?;

    let mut updated = 0usize;
    for link in &links {
        let total_clicks = clicks.get(&link.id).copied().unwrap_or(0);
        let total_signups = signups.get(&link.id).copied().unwrap_or(0);
        metrics
            .upsert_daily_metrics(&DailyMetrics {
                referral_link_id: link.id.clone(),
                officer_id: link.officer_id.clone(),
                campaign_id: link.campaign_id.clone(),
                metric_date: date,
                total_clicks,
                total_signups,
                click_to_signup_rate: conversion_rate(total_clicks, total_signups),
            })
            .await?;
        updated += 1;
    }

    info!(date = %date, links = updated, "daily metrics calculated");
    Ok(format!("Calculated daily metrics for {updated} referral links"))
}
