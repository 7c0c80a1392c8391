use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use reftrack_core::config::Config;
use reftrack_core::fraud::{AlwaysClean, FraudWeights, IpReputation};
use reftrack_core::metrics::{Campaign, Officer, ReferralLink};
use reftrack_core::task::RetryPolicy;
use reftrack_duckdb::DuckDbBackend;
use reftrack_worker::ingest::{record_click, record_signup, RecordClick, RecordSignup};
use reftrack_worker::sheets::MemorySheet;
use reftrack_worker::state::AppState;

struct AlwaysProxy;

#[async_trait]
impl IpReputation for AlwaysProxy {
    async fn is_proxy(&self, _ip: &str) -> bool {
        true
    }
}

fn test_config() -> Config {
    Config {
        sheet_id: String::new(),
        service_account_json: None,
        data_dir: "./data".to_string(),
        duckdb_memory_limit: "1GB".to_string(),
        raw_export_interval_secs: 900,
        pipeline_hour_utc: 3,
        scheduler_tick_seconds: 60,
        reputation_url: None,
        reputation_api_key: None,
        reputation_timeout_ms: 800,
        fraud: FraudWeights::default(),
        retry: RetryPolicy::default(),
    }
}

async fn test_state(reputation: Arc<dyn IpReputation>) -> (Arc<DuckDbBackend>, AppState) {
    let db = Arc::new(DuckDbBackend::open_in_memory().expect("db"));
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
        id: "link_1".to_string(),
        officer_id: "off_1".to_string(),
        campaign_id: "camp_1".to_string(),
        ref_code: "ref-1".to_string(),
    })
    .await
    .expect("seed link");

    let state = AppState::new(
        db.clone(),
        test_config(),
        Arc::new(MemorySheet::new()),
        reputation,
    );
    (db, state)
}

fn click_input(user_agent: &str) -> RecordClick {
    RecordClick {
        referral_link_id: "link_1".to_string(),
        ip: Some("203.0.113.9".to_string()),
        user_agent: Some(user_agent.to_string()),
        country: Some("DE".to_string()),
        city: None,
        region: None,
    }
}

#[tokio::test]
async fn test_clean_click_scores_zero_and_creates_no_finding() {
    let (db, state) = test_state(Arc::new(AlwaysClean)).await;

    let event = record_click(&state, click_input("Mozilla/5.0")).await.expect("record");
    assert_eq!(event.fraud_score, 0.0);

    let stored = db.get_click(&event.id).await.expect("get").expect("stored");
    assert_eq!(stored.ip.as_deref(), Some("203.0.113.9"));
    assert!(db
        .fraud_findings_for(&event.id)
        .await
        .expect("findings")
        .is_empty());
}

#[tokio::test]
async fn test_proxy_bot_click_creates_finding() {
    let (db, state) = test_state(Arc::new(AlwaysProxy)).await;

    // Proxy (+7) plus bot user agent (+3) crosses the threshold of 7.
    let event = record_click(&state, click_input("ScraperBot/1.0"))
        .await
        .expect("record");
    assert_eq!(event.fraud_score, 10.0);

    let findings = db.fraud_findings_for(&event.id).await.expect("findings");
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].fraud_score, 10.0);
    assert_eq!(findings[0].details, "High fraud score on click event.");
}

#[tokio::test]
async fn test_ip_frequency_counts_prior_clicks() {
    let (_db, state) = test_state(Arc::new(AlwaysClean)).await;

    for _ in 0..11 {
        record_click(&state, click_input("Mozilla/5.0"))
            .await
            .expect("record");
    }
    // Eleven prior clicks from the IP within the hour exceed the limit of
    // ten; this one scores the frequency weight alone, below the threshold.
    let event = record_click(&state, click_input("Mozilla/5.0"))
        .await
        .expect("record");
    assert_eq!(event.fraud_score, 5.0);
}

#[tokio::test]
async fn test_instant_signup_on_tainted_click_creates_finding() {
    let (db, state) = test_state(Arc::new(AlwaysProxy)).await;

    let click = record_click(&state, click_input("ScraperBot/1.0"))
        .await
        .expect("record click");
    assert!(click.fraud_score > 7.0);

    let signup = record_signup(
        &state,
        RecordSignup {
            referral_link_id: "link_1".to_string(),
            click_event_id: Some(click.id.clone()),
        },
    )
    .await
    .expect("record signup");

    // Sub-minute conversion (+5) on a click above the threshold (+5).
    assert_eq!(signup.conversion_minutes, Some(0));
    assert_eq!(signup.fraud_score, 10.0);
    let findings = db.fraud_findings_for(&signup.id).await.expect("findings");
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].details, "High fraud score on signup event.");
}

#[tokio::test]
async fn test_dangling_click_reference_yields_no_conversion_time() {
    let (db, state) = test_state(Arc::new(AlwaysClean)).await;

    let signup = record_signup(
        &state,
        RecordSignup {
            referral_link_id: "link_1".to_string(),
            click_event_id: Some("never-recorded".to_string()),
        },
    )
    .await
    .expect("record signup");

    assert_eq!(signup.conversion_minutes, None);
    assert_eq!(signup.fraud_score, 0.0);
    assert!(db
        .fraud_findings_for(&signup.id)
        .await
        .expect("findings")
        .is_empty());
}
