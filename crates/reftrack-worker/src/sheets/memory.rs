//! In-memory [`SheetSink`].
//!
//! Used by tests and as a dry-run sink when no credentials are configured.
//! Worksheets spring into existence on first touch, matching the remote
//! sink's get-or-create behavior.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use reftrack_core::sheets::SheetSink;

#[derive(Default)]
pub struct MemorySheet {
    worksheets: Mutex<HashMap<String, Vec<Vec<String>>>>,
    append_calls: Mutex<Vec<(String, usize)>>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of a worksheet; empty when never written.
    pub async fn rows(&self, worksheet: &str) -> Vec<Vec<String>> {
        self.worksheets
            .lock()
            .await
            .get(worksheet)
            .cloned()
            .unwrap_or_default()
    }

    /// `(worksheet, row_count)` per append call, for asserting chunking.
    pub async fn append_calls(&self) -> Vec<(String, usize)> {
        self.append_calls.lock().await.clone()
    }
}

#[async_trait]
impl SheetSink for MemorySheet {
    async fn read_cell(&self, worksheet: &str, cell: &str) -> anyhow::Result<Option<String>> {
        // Only A1 header detection is needed; other cells read as empty.
        if cell != "A1" {
            return Ok(None);
        }
        let sheets = self.worksheets.lock().await;
        Ok(sheets
            .get(worksheet)
            .and_then(|rows| rows.first())
            .and_then(|row| row.first())
            .filter(|v| !v.is_empty())
            .cloned())
    }

    async fn append_rows(&self, worksheet: &str, rows: &[Vec<String>]) -> anyhow::Result<()> {
        let mut sheets = self.worksheets.lock().await;
        sheets
            .entry(worksheet.to_string())
            .or_default()
            .extend(rows.iter().cloned());
        self.append_calls
            .lock()
            .await
            .push((worksheet.to_string(), rows.len()));
        Ok(())
    }

    async fn clear(&self, worksheet: &str) -> anyhow::Result<()> {
        self.worksheets
            .lock()
            .await
            .insert(worksheet.to_string(), Vec::new());
        Ok(())
    }
}
