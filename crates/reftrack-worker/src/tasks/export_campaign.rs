//! Campaign summary export (overwrite mode).

use tracing::info;

use reftrack_core::sheets::{append_chunked, SheetSink};
use reftrack_core::store::MetricsStore;

pub const TASK_NAME: &str = "export_campaign_summary";
pub const WORKSHEET: &str = "Campaign_Summary";

const HEADERS: [&str; 8] = [
    "CampaignID",
    "CampaignName",
    "StartDate",
    "EndDate",
    "TotalClicks",
    "TotalSignups",
    "ClickToSignupRate",
    "AverageSignupsPerDay",
];

/// Clear and rewrite the campaign sheet. Average signups per day divides by
/// the count of distinct metric dates with data, not the calendar span, so
/// sparse or in-progress campaigns are not skewed.
pub async fn export_campaign_summary(
    metrics: &dyn MetricsStore,
    sink: &dyn SheetSink,
) -> anyhow::Result<String> {
    sink.clear(WORKSHEET).await?;
    sink.append_rows(
        WORKSHEET,
        &[HEADERS.iter().map(|h| h.to_string()).collect()],
    )
    .await?;

    let summaries = metrics.campaign_summaries().await?;
    let rows: Vec<Vec<String>> = summaries
        .iter()
        .map(|s| {
            vec![
                s.campaign_id.clone(),
                s.campaign_name.clone(),
                s.start_date.to_string(),
                s.end_date.to_string(),
                s.total_clicks.to_string(),
                s.total_signups.to_string(),
                format!("{:.2}", s.avg_rate),
                format!("{:.2}", s.avg_signups_per_day()),
            ]
        })
        .collect();
    append_chunked(sink, WORKSHEET, &rows).await?;

    info!(task = TASK_NAME, campaigns = rows.len(), "campaign summary exported");
    Ok(format!(
        "Exported campaign summary for {} campaigns",
        rows.len()
    ))
}
