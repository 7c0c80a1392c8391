//! Time-series export (overwrite mode).

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use tracing::info;

use reftrack_core::metrics::DailyTotals;
use reftrack_core::sheets::{append_chunked, SheetSink};
use reftrack_core::store::MetricsStore;

pub const TASK_NAME: &str = "export_time_series";
pub const WORKSHEET: &str = "Time_Series_Data";

/// Trailing window in days; the export covers `today - 90 ..= today`,
/// 91 calendar rows.
const WINDOW_DAYS: i64 = 90;

const HEADERS: [&str; 4] = ["Date", "TotalClicks", "TotalSignups", "ClickToSignupRate"];

pub async fn export_time_series(
    metrics: &dyn MetricsStore,
    sink: &dyn SheetSink,
) -> anyhow::Result<String> {
    export_time_series_ending(metrics, sink, Utc::now().date_naive()).await
}

/// Clear and rewrite one row per calendar day over the trailing window.
/// The totals come from a single grouped query over the whole range; days
/// without data are written as zeros.
pub async fn export_time_series_ending(
    metrics: &dyn MetricsStore,
    sink: &dyn SheetSink,
    end_date: NaiveDate,
) -> anyhow::Result<String> {
    let start_date = end_date - chrono::Duration::days(WINDOW_DAYS);

    sink.clear(WORKSHEET).await?;
    sink.append_rows(
        WORKSHEET,
        &[HEADERS.iter().map(|h| h.to_string()).collect()],
    )
    .await?;

    let totals: HashMap<NaiveDate, DailyTotals> = metrics
        .daily_totals(start_date, end_date)
        .await?
        .into_iter()
        .map(|t| (t.date, t))
        .collect();

    let mut rows = Vec::new();
    let mut date = start_date;
    while date <= end_date {
        let row = match totals.get(&date) {
            Some(t) => vec![
                date.to_string(),
                t.total_clicks.to_string(),
                t.total_signups.to_string(),
                format!("{:.2}", t.avg_rate),
            ],
            None => vec![
                date.to_string(),
                "0".to_string(),
                "0".to_string(),
                "0.00".to_string(),
            ],
        };
        rows.push(row);
        date += chrono::Duration::days(1);
    }
    append_chunked(sink, WORKSHEET, &rows).await?;

    info!(task = TASK_NAME, days = rows.len(), "time series exported");
    Ok(format!("Exported time series data for {} days", rows.len()))
}
