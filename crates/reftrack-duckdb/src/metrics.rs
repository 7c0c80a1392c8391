//! Daily-metrics upsert and the grouped summary queries the exports read.

use anyhow::Result;
use chrono::NaiveDate;

use reftrack_core::metrics::{CampaignSummary, DailyMetrics, DailyTotals, OfficerSummary};

use crate::backend::date_from_sql;
use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Insert-or-overwrite on the composite primary key. Re-running the
    /// aggregator for a day replaces the row rather than accumulating.
    pub async fn upsert_daily_metrics(&self, row: &DailyMetrics) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO daily_metrics
                 (referral_link_id, officer_id, campaign_id, metric_date,
                  total_clicks, total_signups, click_to_signup_rate)
             VALUES (?1, ?2, ?3, CAST(?4 AS DATE), ?5, ?6, ?7)",
            duckdb::params![
                row.referral_link_id,
                row.officer_id,
                row.campaign_id,
                row.metric_date.to_string(),
                row.total_clicks,
                row.total_signups,
                row.click_to_signup_rate
            ],
        )?;
        Ok(())
    }

    pub async fn get_daily_metrics(
        &self,
        referral_link_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyMetrics>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT referral_link_id, officer_id, campaign_id, CAST(metric_date AS VARCHAR),
                    total_clicks, total_signups, click_to_signup_rate
             FROM daily_metrics
             WHERE referral_link_id = ?1 AND metric_date = CAST(?2 AS DATE)",
        )?;
        let mut rows = stmt.query(duckdb::params![referral_link_id, date.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let date_raw: String = row.get(3)?;
        Ok(Some(DailyMetrics {
            referral_link_id: row.get(0)?,
            officer_id: row.get(1)?,
            campaign_id: row.get(2)?,
            metric_date: date_from_sql(&date_raw)?,
            total_clicks: row.get(4)?,
            total_signups: row.get(5)?,
            click_to_signup_rate: row.get(6)?,
        }))
    }

    /// All-time totals per officer: summed clicks/signups plus the average of
    /// daily rates. Officers without metrics still appear, zeroed.
    pub async fn officer_summaries(&self) -> Result<Vec<OfficerSummary>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT o.id, o.full_name,
                    CAST(COALESCE(SUM(m.total_clicks), 0) AS BIGINT),
                    CAST(COALESCE(SUM(m.total_signups), 0) AS BIGINT),
                    COALESCE(AVG(m.click_to_signup_rate), 0)
             FROM officers o
             LEFT JOIN daily_metrics m ON m.officer_id = o.id
             GROUP BY o.id, o.full_name
             ORDER BY o.id",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(OfficerSummary {
                officer_id: row.get(0)?,
                officer_name: row.get(1)?,
                total_clicks: row.get(2)?,
                total_signups: row.get(3)?,
                avg_rate: row.get(4)?,
            });
        }
        Ok(out)
    }

    /// All-time totals per campaign. `metric_days` is the count of distinct
    /// metric dates with data — the denominator for average signups per day.
    pub async fn campaign_summaries(&self) -> Result<Vec<CampaignSummary>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.name, CAST(c.start_date AS VARCHAR), CAST(c.end_date AS VARCHAR),
                    CAST(COALESCE(SUM(m.total_clicks), 0) AS BIGINT),
                    CAST(COALESCE(SUM(m.total_signups), 0) AS BIGINT),
                    COALESCE(AVG(m.click_to_signup_rate), 0),
                    CAST(COUNT(DISTINCT m.metric_date) AS BIGINT)
             FROM campaigns c
             LEFT JOIN daily_metrics m ON m.campaign_id = c.id
             GROUP BY c.id, c.name, c.start_date, c.end_date
             ORDER BY c.id",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let start_raw: String = row.get(2)?;
            let end_raw: String = row.get(3)?;
            out.push(CampaignSummary {
                campaign_id: row.get(0)?,
                campaign_name: row.get(1)?,
                start_date: date_from_sql(&start_raw)?,
                end_date: date_from_sql(&end_raw)?,
                total_clicks: row.get(4)?,
                total_signups: row.get(5)?,
                avg_rate: row.get(6)?,
                metric_days: row.get(7)?,
            });
        }
        Ok(out)
    }

    /// One grouped query over the inclusive date range — never one query per
    /// day. Days without rows are absent; the time-series export zero-fills.
    pub async fn daily_totals(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyTotals>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT CAST(metric_date AS VARCHAR),
                    CAST(SUM(total_clicks) AS BIGINT),
                    CAST(SUM(total_signups) AS BIGINT),
                    AVG(click_to_signup_rate)
             FROM daily_metrics
             WHERE metric_date >= CAST(?1 AS DATE) AND metric_date <= CAST(?2 AS DATE)
             GROUP BY metric_date
             ORDER BY metric_date",
        )?;
        let mut rows = stmt.query(duckdb::params![start.to_string(), end.to_string()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let date_raw: String = row.get(0)?;
            out.push(DailyTotals {
                date: date_from_sql(&date_raw)?,
                total_clicks: row.get(1)?,
                total_signups: row.get(2)?,
                avg_rate: row.get(3)?,
            });
        }
        Ok(out)
    }
}
