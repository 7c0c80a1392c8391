use chrono::NaiveDate;

use reftrack_core::metrics::{Campaign, DailyMetrics, Officer};
use reftrack_duckdb::DuckDbBackend;

fn metrics_row(link: &str, date: NaiveDate, clicks: i64, signups: i64, rate: f64) -> DailyMetrics {
    DailyMetrics {
        referral_link_id: link.to_string(),
        officer_id: "off_1".to_string(),
        campaign_id: "camp_1".to_string(),
        metric_date: date,
        total_clicks: clicks,
        total_signups: signups,
        click_to_signup_rate: rate,
    }
}

async fn seed_collaborators(db: &DuckDbBackend) {
    db.seed_officer(&Officer {
        id: "off_1".to_string(),
        full_name: "Abebe Bikila".to_string(),
    })
    .await
    .expect("seed officer");
    db.seed_campaign(&Campaign {
        id: "camp_1".to_string(),
        name: "Spring Intake".to_string(),
        start_date: NaiveDate::from_ymd_opt(2026, 1, 1).expect("date"),
        end_date: NaiveDate::from_ymd_opt(2026, 12, 31).expect("date"),
    })
    .await
    .expect("seed campaign");
}

#[tokio::test]
async fn test_upsert_overwrites_instead_of_accumulating() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    let day = NaiveDate::from_ymd_opt(2026, 8, 30).expect("date");

    db.upsert_daily_metrics(&metrics_row("link_1", day, 3, 1, 33.33))
        .await
        .expect("upsert");
    // Re-running the same day replaces the row on the composite key.
    db.upsert_daily_metrics(&metrics_row("link_1", day, 5, 2, 40.0))
        .await
        .expect("upsert");

    let got = db
        .get_daily_metrics("link_1", day)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(got.total_clicks, 5);
    assert_eq!(got.total_signups, 2);
    assert_eq!(got.click_to_signup_rate, 40.0);
}

#[tokio::test]
async fn test_officer_summary_sums_and_averages() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    seed_collaborators(&db).await;

    let d1 = NaiveDate::from_ymd_opt(2026, 8, 29).expect("date");
    let d2 = NaiveDate::from_ymd_opt(2026, 8, 30).expect("date");
    db.upsert_daily_metrics(&metrics_row("link_1", d1, 10, 2, 20.0))
        .await
        .expect("upsert");
    db.upsert_daily_metrics(&metrics_row("link_1", d2, 10, 4, 40.0))
        .await
        .expect("upsert");

    let summaries = db.officer_summaries().await.expect("summaries");
    assert_eq!(summaries.len(), 1);
    let s = &summaries[0];
    assert_eq!(s.officer_name, "Abebe Bikila");
    assert_eq!(s.total_clicks, 20);
    assert_eq!(s.total_signups, 6);
    // Average of daily rates, not a recomputed ratio.
    assert_eq!(s.avg_rate, 30.0);
}

#[tokio::test]
async fn test_officer_without_metrics_is_zeroed() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.seed_officer(&Officer {
        id: "off_2".to_string(),
        full_name: "New Officer".to_string(),
    })
    .await
    .expect("seed officer");

    let summaries = db.officer_summaries().await.expect("summaries");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].total_clicks, 0);
    assert_eq!(summaries[0].total_signups, 0);
    assert_eq!(summaries[0].avg_rate, 0.0);
}

#[tokio::test]
async fn test_campaign_summary_counts_distinct_metric_dates() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    seed_collaborators(&db).await;

    // Rows on exactly two distinct dates, totalling 10 signups, with a wide
    // calendar gap between them.
    let d1 = NaiveDate::from_ymd_opt(2026, 2, 1).expect("date");
    let d2 = NaiveDate::from_ymd_opt(2026, 8, 30).expect("date");
    db.upsert_daily_metrics(&metrics_row("link_1", d1, 20, 4, 20.0))
        .await
        .expect("upsert");
    db.upsert_daily_metrics(&metrics_row("link_2", d1, 10, 2, 20.0))
        .await
        .expect("upsert");
    db.upsert_daily_metrics(&metrics_row("link_1", d2, 10, 4, 40.0))
        .await
        .expect("upsert");

    let summaries = db.campaign_summaries().await.expect("summaries");
    assert_eq!(summaries.len(), 1);
    let s = &summaries[0];
    assert_eq!(s.total_signups, 10);
    assert_eq!(s.metric_days, 2);
    assert_eq!(s.avg_signups_per_day(), 5.0);
}

#[tokio::test]
async fn test_daily_totals_single_grouped_query() {
    let db = DuckDbBackend::open_in_memory().expect("db");

    let d1 = NaiveDate::from_ymd_opt(2026, 8, 29).expect("date");
    let d2 = NaiveDate::from_ymd_opt(2026, 8, 30).expect("date");
    db.upsert_daily_metrics(&metrics_row("link_1", d1, 5, 2, 40.0))
        .await
        .expect("upsert");
    db.upsert_daily_metrics(&metrics_row("link_2", d1, 5, 0, 0.0))
        .await
        .expect("upsert");
    db.upsert_daily_metrics(&metrics_row("link_1", d2, 1, 1, 100.0))
        .await
        .expect("upsert");

    let totals = db.daily_totals(d1, d2).await.expect("totals");
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].date, d1);
    assert_eq!(totals[0].total_clicks, 10);
    assert_eq!(totals[0].total_signups, 2);
    assert_eq!(totals[0].avg_rate, 20.0);
    assert_eq!(totals[1].total_clicks, 1);

    // Range filtering is inclusive on both ends.
    let only_d2 = db.daily_totals(d2, d2).await.expect("totals");
    assert_eq!(only_d2.len(), 1);
    assert_eq!(only_d2[0].date, d2);
}

#[tokio::test]
async fn test_checkpoint_absent_then_set_then_overwritten() {
    let db = DuckDbBackend::open_in_memory().expect("db");

    assert!(db
        .get_checkpoint("export_raw_data")
        .await
        .expect("get")
        .is_none());

    db.set_checkpoint("export_raw_data", "2026-08-30T10:00:00+00:00")
        .await
        .expect("set");
    assert_eq!(
        db.get_checkpoint("export_raw_data").await.expect("get"),
        Some("2026-08-30T10:00:00+00:00".to_string())
    );

    db.set_checkpoint("export_raw_data", "2026-08-30T12:00:00+00:00")
        .await
        .expect("set");
    assert_eq!(
        db.get_checkpoint("export_raw_data").await.expect("get"),
        Some("2026-08-30T12:00:00+00:00".to_string())
    );

    // Keys are namespaced per task.
    assert!(db
        .get_checkpoint("other_task")
        .await
        .expect("get")
        .is_none());
}
