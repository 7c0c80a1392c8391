use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use reftrack_core::event::{ClickEvent, SignupEvent};
use reftrack_core::metrics::{Campaign, Officer, ReferralLink};
use reftrack_duckdb::DuckDbBackend;
use reftrack_worker::tasks::aggregate::calculate_daily_metrics_for;

async fn seed_link(db: &DuckDbBackend, link_id: &str) {
    db.seed_officer(&Officer {
        id: "off_1".to_string(),
        full_name: "Officer One".to_string(),
    })
    .await
    .expect("seed officer");
    db.seed_campaign(&Campaign {
        id: "camp_1".to_string(),
        name: "Launch".to_string(),
        start_date: NaiveDate::from_ymd_opt(2026, 1, 1).expect("date"),
        end_date: NaiveDate::from_ymd_opt(2026, 12, 31).expect("date"),
    })
    .await
    .expect("seed campaign");
    db.seed_referral_link(&ReferralLink {
        id: link_id.to_string(),
        officer_id: "off_1".to_string(),
        campaign_id: "camp_1".to_string(),
        ref_code: format!("ref-{link_id}"),
    })
    .await
    .expect("seed link");
}

async fn insert_click(db: &DuckDbBackend, link_id: &str, ts: chrono::DateTime<Utc>) {
    db.insert_click(&ClickEvent {
        id: Uuid::new_v4().to_string(),
        referral_link_id: link_id.to_string(),
        timestamp: ts,
        ip: Some("10.0.0.1".to_string()),
        user_agent: None,
        country: None,
        city: None,
        region: None,
        fraud_score: 0.0,
    })
    .await
    .expect("insert click");
}

async fn insert_signup(db: &DuckDbBackend, link_id: &str, ts: chrono::DateTime<Utc>) {
    db.insert_signup(&SignupEvent {
        id: Uuid::new_v4().to_string(),
        click_event_id: None,
        referral_link_id: link_id.to_string(),
        timestamp: ts,
        conversion_minutes: Some(5),
        fraud_score: 0.0,
    })
    .await
    .expect("insert signup");
}

#[tokio::test]
async fn test_five_clicks_two_signups_yields_forty_percent() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    seed_link(&db, "link_1").await;

    let day = NaiveDate::from_ymd_opt(2026, 8, 30).expect("date");
    for hour in [8, 9, 10, 11, 12] {
        insert_click(&db, "link_1", Utc.with_ymd_and_hms(2026, 8, 30, hour, 0, 0).unwrap()).await;
    }
    for hour in [9, 13] {
        insert_signup(&db, "link_1", Utc.with_ymd_and_hms(2026, 8, 30, hour, 30, 0).unwrap()).await;
    }

    let status = calculate_daily_metrics_for(&db, &db, day)
        .await
        .expect("aggregate");
    assert_eq!(status, "Calculated daily metrics for 1 referral links");

    let row = db
        .get_daily_metrics("link_1", day)
        .await
        .expect("get")
        .expect("row present");
    assert_eq!(row.total_clicks, 5);
    assert_eq!(row.total_signups, 2);
    assert_eq!(row.click_to_signup_rate, 40.0);
    assert_eq!(row.officer_id, "off_1");
    assert_eq!(row.campaign_id, "camp_1");
}

#[tokio::test]
async fn test_zero_click_link_gets_zero_rate_row() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    seed_link(&db, "link_quiet").await;

    let day = NaiveDate::from_ymd_opt(2026, 8, 30).expect("date");
    calculate_daily_metrics_for(&db, &db, day)
        .await
        .expect("aggregate");

    let row = db
        .get_daily_metrics("link_quiet", day)
        .await
        .expect("get")
        .expect("row present even with no events");
    assert_eq!(row.total_clicks, 0);
    assert_eq!(row.total_signups, 0);
    assert_eq!(row.click_to_signup_rate, 0.0);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    seed_link(&db, "link_1").await;

    let day = NaiveDate::from_ymd_opt(2026, 8, 30).expect("date");
    insert_click(&db, "link_1", Utc.with_ymd_and_hms(2026, 8, 30, 8, 0, 0).unwrap()).await;
    insert_signup(&db, "link_1", Utc.with_ymd_and_hms(2026, 8, 30, 9, 0, 0).unwrap()).await;

    calculate_daily_metrics_for(&db, &db, day).await.expect("first run");
    let first = db
        .get_daily_metrics("link_1", day)
        .await
        .expect("get")
        .expect("row");

    // Unchanged events: a re-run reproduces the same values, not doubles.
    calculate_daily_metrics_for(&db, &db, day).await.expect("second run");
    let second = db
        .get_daily_metrics("link_1", day)
        .await
        .expect("get")
        .expect("row");
    assert_eq!(first, second);
    assert_eq!(second.total_clicks, 1);
    assert_eq!(second.total_signups, 1);
}
