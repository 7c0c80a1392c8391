//! Event-stream queries: inserts, grouped daily counts, checkpoint-windowed
//! export rows, and the per-IP fraud counters.
//!
//! Every time-windowed read is a single query — export rows come back joined
//! flat against links, officers, and campaigns so callers never do per-row
//! lookups.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

use reftrack_core::event::{ClickEvent, EventType, FraudFinding, RawEventRow, SignupEvent};
use reftrack_core::metrics::ReferralLink;

use crate::backend::{ts_from_sql, ts_to_sql};
use crate::DuckDbBackend;

/// Half-open UTC day window `[date 00:00, date+1 00:00)` as SQL strings.
fn day_bounds(date: NaiveDate) -> (String, String) {
    let start = format!("{date} 00:00:00");
    let end = format!("{} 00:00:00", date + chrono::Duration::days(1));
    (start, end)
}

impl DuckDbBackend {
    pub async fn insert_click(&self, event: &ClickEvent) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO click_events
                 (id, referral_link_id, timestamp, ip, user_agent, country, city, region, fraud_score)
             VALUES (?1, ?2, CAST(?3 AS TIMESTAMP), ?4, ?5, ?6, ?7, ?8, ?9)",
            duckdb::params![
                event.id,
                event.referral_link_id,
                ts_to_sql(&event.timestamp),
                event.ip,
                event.user_agent,
                event.country,
                event.city,
                event.region,
                event.fraud_score
            ],
        )?;
        Ok(())
    }

    pub async fn insert_signup(&self, event: &SignupEvent) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO signup_events
                 (id, click_event_id, referral_link_id, timestamp, conversion_minutes, fraud_score)
             VALUES (?1, ?2, ?3, CAST(?4 AS TIMESTAMP), ?5, ?6)",
            duckdb::params![
                event.id,
                event.click_event_id,
                event.referral_link_id,
                ts_to_sql(&event.timestamp),
                event.conversion_minutes,
                event.fraud_score
            ],
        )?;
        Ok(())
    }

    pub async fn get_click(&self, id: &str) -> Result<Option<ClickEvent>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, referral_link_id, CAST(timestamp AS VARCHAR), ip, user_agent,
                    country, city, region, fraud_score
             FROM click_events WHERE id = ?1",
        )?;
        let mut rows = stmt.query(duckdb::params![id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let ts_raw: String = row.get(2)?;
        Ok(Some(ClickEvent {
            id: row.get(0)?,
            referral_link_id: row.get(1)?,
            timestamp: ts_from_sql(&ts_raw)?,
            ip: row.get(3)?,
            user_agent: row.get(4)?,
            country: row.get(5)?,
            city: row.get(6)?,
            region: row.get(7)?,
            fraud_score: row.get(8)?,
        }))
    }

    pub async fn insert_fraud_finding(&self, finding: &FraudFinding) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO fraud_findings (id, event_type, event_id, fraud_score, details, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, CAST(?6 AS TIMESTAMP))",
            duckdb::params![
                finding.id,
                finding.event_type.as_str(),
                finding.event_id,
                finding.fraud_score,
                finding.details,
                ts_to_sql(&finding.timestamp)
            ],
        )?;
        Ok(())
    }

    /// Findings recorded against one event id, for tests and operator lookups.
    pub async fn fraud_findings_for(&self, event_id: &str) -> Result<Vec<FraudFinding>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, event_type, event_id, fraud_score, details, CAST(timestamp AS VARCHAR)
             FROM fraud_findings WHERE event_id = ?1 ORDER BY timestamp",
        )?;
        let mut rows = stmt.query(duckdb::params![event_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let kind: String = row.get(1)?;
            let ts_raw: String = row.get(5)?;
            out.push(FraudFinding {
                id: row.get(0)?,
                event_type: if kind == "signup" {
                    EventType::Signup
                } else {
                    EventType::Click
                },
                event_id: row.get(2)?,
                fraud_score: row.get(3)?,
                details: row.get(4)?,
                timestamp: ts_from_sql(&ts_raw)?,
            });
        }
        Ok(out)
    }

    pub async fn clicks_by_link_on(&self, date: NaiveDate) -> Result<HashMap<String, i64>> {
        self.counts_by_link_on("click_events", date).await
    }

    pub async fn signups_by_link_on(&self, date: NaiveDate) -> Result<HashMap<String, i64>> {
        self.counts_by_link_on("signup_events", date).await
    }

    async fn counts_by_link_on(&self, table: &str, date: NaiveDate) -> Result<HashMap<String, i64>> {
        let (start, end) = day_bounds(date);
        let conn = self.conn.lock().await;
        // Table name is one of two compile-time constants, never user input.
        let sql = format!(
            "SELECT referral_link_id, COUNT(*)
             FROM {table}
             WHERE timestamp >= CAST(?1 AS TIMESTAMP) AND timestamp < CAST(?2 AS TIMESTAMP)
             GROUP BY referral_link_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(duckdb::params![start, end])?;
        let mut map = HashMap::new();
        while let Some(row) = rows.next()? {
            let link_id: String = row.get(0)?;
            let n: i64 = row.get(1)?;
            map.insert(link_id, n);
        }
        Ok(map)
    }

    pub async fn list_referral_links(&self) -> Result<Vec<ReferralLink>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, officer_id, campaign_id, ref_code FROM referral_links ORDER BY id",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(ReferralLink {
                id: row.get(0)?,
                officer_id: row.get(1)?,
                campaign_id: row.get(2)?,
                ref_code: row.get(3)?,
            });
        }
        Ok(out)
    }

    pub async fn click_rows_after(&self, since: DateTime<Utc>) -> Result<Vec<RawEventRow>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT CAST(e.timestamp AS VARCHAR), e.id, e.referral_link_id,
                    l.officer_id, l.campaign_id, c.name,
                    COALESCE(e.ip, ''), COALESCE(e.user_agent, '')
             FROM click_events e
             JOIN referral_links l ON l.id = e.referral_link_id
             JOIN campaigns c ON c.id = l.campaign_id
             WHERE e.timestamp > CAST(?1 AS TIMESTAMP)
             ORDER BY e.timestamp, e.id",
        )?;
        let mut rows = stmt.query(duckdb::params![ts_to_sql(&since)])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let ts_raw: String = row.get(0)?;
            out.push(RawEventRow {
                timestamp: ts_from_sql(&ts_raw)?,
                event_type: EventType::Click,
                event_id: row.get(1)?,
                referral_link_id: row.get(2)?,
                officer_id: row.get(3)?,
                campaign_id: row.get(4)?,
                campaign_name: row.get(5)?,
                ip: row.get(6)?,
                user_agent: row.get(7)?,
            });
        }
        Ok(out)
    }

    pub async fn signup_rows_after(&self, since: DateTime<Utc>) -> Result<Vec<RawEventRow>> {
        let conn = self.conn.lock().await;
        // IP and user agent are inherited from the linked click when that
        // weak reference resolves; empty otherwise.
        let mut stmt = conn.prepare(
            "SELECT CAST(s.timestamp AS VARCHAR), s.id, s.referral_link_id,
                    l.officer_id, l.campaign_id, c.name,
                    COALESCE(k.ip, ''), COALESCE(k.user_agent, '')
             FROM signup_events s
             JOIN referral_links l ON l.id = s.referral_link_id
             JOIN campaigns c ON c.id = l.campaign_id
             LEFT JOIN click_events k ON k.id = s.click_event_id
             WHERE s.timestamp > CAST(?1 AS TIMESTAMP)
             ORDER BY s.timestamp, s.id",
        )?;
        let mut rows = stmt.query(duckdb::params![ts_to_sql(&since)])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let ts_raw: String = row.get(0)?;
            out.push(RawEventRow {
                timestamp: ts_from_sql(&ts_raw)?,
                event_type: EventType::Signup,
                event_id: row.get(1)?,
                referral_link_id: row.get(2)?,
                officer_id: row.get(3)?,
                campaign_id: row.get(4)?,
                campaign_name: row.get(5)?,
                ip: row.get(6)?,
                user_agent: row.get(7)?,
            });
        }
        Ok(out)
    }

    pub async fn clicks_from_ip_since(&self, ip: &str, since: DateTime<Utc>) -> Result<i64> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT COUNT(*) FROM click_events
             WHERE ip = ?1 AND timestamp >= CAST(?2 AS TIMESTAMP)",
        )?;
        let n: i64 = stmt.query_row(duckdb::params![ip, ts_to_sql(&since)], |row| row.get(0))?;
        Ok(n)
    }

    pub async fn distinct_links_from_ip_since(
        &self,
        ip: &str,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT COUNT(DISTINCT referral_link_id) FROM click_events
             WHERE ip = ?1 AND timestamp >= CAST(?2 AS TIMESTAMP)",
        )?;
        let n: i64 = stmt.query_row(duckdb::params![ip, ts_to_sql(&since)], |row| row.get(0))?;
        Ok(n)
    }
}
