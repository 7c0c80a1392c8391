//! Spreadsheet sink abstraction.

use async_trait::async_trait;

/// Rows per append call. The sink rejects oversized payloads, so every
/// export writes in bounded batches.
pub const EXPORT_CHUNK_ROWS: usize = 500;

/// The three operations the exports need from an external tabular sink.
/// Column order is agreed by convention per export routine; no schema is
/// enforced on the sink side.
#[async_trait]
pub trait SheetSink: Send + Sync + 'static {
    /// Read a single cell (A1 notation). `Ok(None)` when the cell is empty —
    /// used to detect a missing header row.
    async fn read_cell(&self, worksheet: &str, cell: &str) -> anyhow::Result<Option<String>>;
    async fn append_rows(&self, worksheet: &str, rows: &[Vec<String>]) -> anyhow::Result<()>;
    async fn clear(&self, worksheet: &str) -> anyhow::Result<()>;
}

/// Append `rows` in [`EXPORT_CHUNK_ROWS`]-sized batches. An error aborts at
/// the failed chunk; already-appended chunks stay (at-least-once semantics,
/// bounded by the caller's checkpoint policy).
pub async fn append_chunked(
    sink: &dyn SheetSink,
    worksheet: &str,
    rows: &[Vec<String>],
) -> anyhow::Result<()> {
    for chunk in rows.chunks(EXPORT_CHUNK_ROWS) {
        sink.append_rows(worksheet, chunk).await?;
    }
    Ok(())
}
