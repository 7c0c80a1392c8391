//! Key-value checkpoint storage.
//!
//! The source of truth for "how far has the incremental exporter gotten".
//! Keys use the `checkpoint:<task_name>` format; values are ISO-8601 UTC
//! timestamp strings. Last-writer-wins per key — the scheduler guarantees at
//! most one in-flight run per task name, so no cross-task transaction exists
//! or is needed.

use anyhow::Result;

use reftrack_core::store::checkpoint_key;

use crate::DuckDbBackend;

impl DuckDbBackend {
    /// `Ok(None)` is the valid "never run" state.
    pub async fn get_checkpoint(&self, task_name: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT value FROM checkpoints WHERE key = ?1")?;
        let mut rows = stmt.query(duckdb::params![checkpoint_key(task_name)])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub async fn set_checkpoint(&self, task_name: &str, iso_ts: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO checkpoints (key, value, updated_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)",
            duckdb::params![checkpoint_key(task_name), iso_ts],
        )?;
        Ok(())
    }
}
