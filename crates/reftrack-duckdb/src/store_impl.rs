//! Trait impls wiring [`DuckDbBackend`] into the core storage seams.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use reftrack_core::event::{ClickEvent, FraudFinding, RawEventRow, SignupEvent};
use reftrack_core::metrics::{
    CampaignSummary, DailyMetrics, DailyTotals, OfficerSummary, ReferralLink,
};
use reftrack_core::store::{CheckpointStore, EventStore, MetricsStore};

use crate::DuckDbBackend;

#[async_trait]
impl EventStore for DuckDbBackend {
    async fn insert_click(&self, event: &ClickEvent) -> anyhow::Result<()> {
        DuckDbBackend::insert_click(self, event).await
    }

    async fn insert_signup(&self, event: &SignupEvent) -> anyhow::Result<()> {
        DuckDbBackend::insert_signup(self, event).await
    }

    async fn get_click(&self, id: &str) -> anyhow::Result<Option<ClickEvent>> {
        DuckDbBackend::get_click(self, id).await
    }

    async fn insert_fraud_finding(&self, finding: &FraudFinding) -> anyhow::Result<()> {
        DuckDbBackend::insert_fraud_finding(self, finding).await
    }

    async fn clicks_by_link_on(&self, date: NaiveDate) -> anyhow::Result<HashMap<String, i64>> {
        DuckDbBackend::clicks_by_link_on(self, date).await
    }

    async fn signups_by_link_on(&self, date: NaiveDate) -> anyhow::Result<HashMap<String, i64>> {
        DuckDbBackend::signups_by_link_on(self, date).await
    }

    async fn list_referral_links(&self) -> anyhow::Result<Vec<ReferralLink>> {
        DuckDbBackend::list_referral_links(self).await
    }

    async fn click_rows_after(&self, since: DateTime<Utc>) -> anyhow::Result<Vec<RawEventRow>> {
        DuckDbBackend::click_rows_after(self, since).await
    }

    async fn signup_rows_after(&self, since: DateTime<Utc>) -> anyhow::Result<Vec<RawEventRow>> {
        DuckDbBackend::signup_rows_after(self, since).await
    }

    async fn clicks_from_ip_since(&self, ip: &str, since: DateTime<Utc>) -> anyhow::Result<i64> {
        DuckDbBackend::clicks_from_ip_since(self, ip, since).await
    }

    async fn distinct_links_from_ip_since(
        &self,
        ip: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<i64> {
        DuckDbBackend::distinct_links_from_ip_since(self, ip, since).await
    }
}

#[async_trait]
impl MetricsStore for DuckDbBackend {
    async fn upsert_daily_metrics(&self, row: &DailyMetrics) -> anyhow::Result<()> {
        DuckDbBackend::upsert_daily_metrics(self, row).await
    }

    async fn get_daily_metrics(
        &self,
        referral_link_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<DailyMetrics>> {
        DuckDbBackend::get_daily_metrics(self, referral_link_id, date).await
    }

    async fn officer_summaries(&self) -> anyhow::Result<Vec<OfficerSummary>> {
        DuckDbBackend::officer_summaries(self).await
    }

    async fn campaign_summaries(&self) -> anyhow::Result<Vec<CampaignSummary>> {
        DuckDbBackend::campaign_summaries(self).await
    }

    async fn daily_totals(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<DailyTotals>> {
        DuckDbBackend::daily_totals(self, start, end).await
    }
}

#[async_trait]
impl CheckpointStore for DuckDbBackend {
    async fn get_checkpoint(&self, task_name: &str) -> anyhow::Result<Option<String>> {
        DuckDbBackend::get_checkpoint(self, task_name).await
    }

    async fn set_checkpoint(&self, task_name: &str, iso_ts: &str) -> anyhow::Result<()> {
        DuckDbBackend::set_checkpoint(self, task_name, iso_ts).await
    }
}
