//! Officer summary export (overwrite mode).

use tracing::info;

use reftrack_core::sheets::{append_chunked, SheetSink};
use reftrack_core::store::MetricsStore;

pub const TASK_NAME: &str = "export_officer_summary";
pub const WORKSHEET: &str = "Officer_Summary";

const HEADERS: [&str; 5] = [
    "OfficerID",
    "OfficerName",
    "TotalClicks",
    "TotalSignups",
    "ClickToSignupRate",
];

/// Clear and rewrite the officer sheet: one row per officer with all-time
/// totals and the average of daily click-to-signup rates.
pub async fn export_officer_summary(
    metrics: &dyn MetricsStore,
    sink: &dyn SheetSink,
) -> anyhow::Result<String> {
    sink.clear(WORKSHEET).await?;
    sink.append_rows(
        WORKSHEET,
        &[HEADERS.iter().map(|h| h.to_string()).collect()],
    )
    .await?;

    let summaries = metrics.officer_summaries().await?;
    let rows: Vec<Vec<String>> = summaries
        .iter()
        .map(|s| {
            vec![
                s.officer_id.clone(),
                s.officer_name.clone(),
                s.total_clicks.to_string(),
                s.total_signups.to_string(),
                format!("{:.2}", s.avg_rate),
            ]
        })
        .collect();
    append_chunked(sink, WORKSHEET, &rows).await?;

    info!(task = TASK_NAME, officers = rows.len(), "officer summary exported");
    Ok(format!("Exported officer summary for {} officers", rows.len()))
}
