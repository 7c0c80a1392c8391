use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use reftrack_core::metrics::{Campaign, Officer, ReferralLink};

use crate::schema::init_sql;

/// A DuckDB backend for reftrack.
///
/// DuckDB is single-writer: concurrent reads are fine, but concurrent writes
/// cause contention. We wrap the connection in `Arc<Mutex<_>>` so the async
/// runtime serialises all writes through the task layer while still allowing
/// the struct to be cheaply cloned and shared.
///
/// This one backend plays both roles the worker needs: the relational event
/// store and the key-value checkpoint store (see `checkpoint.rs`).
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`.
    /// Runs the schema init SQL so all tables and indexes exist.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2",
            path, memory_limit
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** DuckDB database.
    ///
    /// Intended for tests only — data is discarded when the struct is
    /// dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Direct connection access for test fixtures.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }

    /// Upsert an officer row. Collaborator data is owned by the CRUD layer;
    /// the worker only needs it present for joins and summaries.
    pub async fn seed_officer(&self, officer: &Officer) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO officers (id, full_name) VALUES (?1, ?2)",
            duckdb::params![officer.id, officer.full_name],
        )?;
        Ok(())
    }

    pub async fn seed_campaign(&self, campaign: &Campaign) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO campaigns (id, name, start_date, end_date)
             VALUES (?1, ?2, CAST(?3 AS DATE), CAST(?4 AS DATE))",
            duckdb::params![
                campaign.id,
                campaign.name,
                campaign.start_date.to_string(),
                campaign.end_date.to_string()
            ],
        )?;
        Ok(())
    }

    pub async fn seed_referral_link(&self, link: &ReferralLink) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO referral_links (id, officer_id, campaign_id, ref_code)
             VALUES (?1, ?2, ?3, ?4)",
            duckdb::params![link.id, link.officer_id, link.campaign_id, link.ref_code],
        )?;
        Ok(())
    }
}

/// Timestamps are stored naive-UTC. Format used for both inserts and the
/// `VARCHAR` casts on reads.
pub(crate) fn ts_to_sql(ts: &DateTime<Utc>) -> String {
    ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Parse a `CAST(ts AS VARCHAR)` value back into a UTC timestamp.
pub(crate) fn ts_from_sql(raw: &str) -> Result<DateTime<Utc>> {
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc());
        }
    }
    anyhow::bail!("unparseable timestamp from storage: {raw}")
}

pub(crate) fn date_from_sql(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("unparseable date from storage: {raw}: {e}"))
}
