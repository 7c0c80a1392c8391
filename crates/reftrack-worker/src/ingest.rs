//! Event ingestion: record clicks and signups, score them, and create fraud
//! findings when the score crosses the alerting threshold.
//!
//! The scorers themselves are pure (`reftrack_core::fraud`); this module owns
//! the side effects around them: counter queries, the fail-open reputation
//! lookup, persistence, and the finding.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use reftrack_core::event::{ClickEvent, EventType, FraudFinding, SignupEvent};
use reftrack_core::fraud::{score_click, score_signup, ClickSignals};

use crate::state::AppState;

const CLICK_FINDING_DETAILS: &str = "High fraud score on click event.";
const SIGNUP_FINDING_DETAILS: &str = "High fraud score on signup event.";

#[derive(Debug, Clone)]
pub struct RecordClick {
    pub referral_link_id: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RecordSignup {
    pub referral_link_id: String,
    /// Weak reference; may name a click that was never recorded.
    pub click_event_id: Option<String>,
}

/// Record a click event, fraud-scoring it from trailing-hour counters and
/// the reputation lookup. The fraud score is fixed at creation and the event
/// is never mutated afterwards.
pub async fn record_click(state: &AppState, input: RecordClick) -> anyhow::Result<ClickEvent> {
    let now = Utc::now();
    let signals = gather_click_signals(state, input.ip.as_deref(), input.user_agent.clone(), now)
        .await?;
    let fraud_score = score_click(&signals, &state.config.fraud);

    let event = ClickEvent {
        id: Uuid::new_v4().to_string(),
        referral_link_id: input.referral_link_id,
        timestamp: now,
        ip: input.ip,
        user_agent: input.user_agent,
        country: input.country,
        city: input.city,
        region: input.region,
        fraud_score,
    };
    state.events.insert_click(&event).await?;

    if fraud_score > state.config.fraud.finding_threshold {
        record_finding(state, EventType::Click, &event.id, fraud_score, now).await?;
    }
    Ok(event)
}

/// Record a signup event. Conversion minutes are measured against the linked
/// click's timestamp; a missing or dangling click reference yields `None`.
pub async fn record_signup(state: &AppState, input: RecordSignup) -> anyhow::Result<SignupEvent> {
    let now = Utc::now();

    let click = match &input.click_event_id {
        Some(id) => state.events.get_click(id).await?,
        None => None,
    };
    let conversion_minutes = click
        .as_ref()
        .map(|c| (now - c.timestamp).num_minutes().max(0));
    let fraud_score = score_signup(
        click.as_ref().map(|c| c.fraud_score),
        conversion_minutes,
        &state.config.fraud,
    );

    let event = SignupEvent {
        id: Uuid::new_v4().to_string(),
        click_event_id: input.click_event_id,
        referral_link_id: input.referral_link_id,
        timestamp: now,
        conversion_minutes,
        fraud_score,
    };
    state.events.insert_signup(&event).await?;

    if fraud_score > state.config.fraud.finding_threshold {
        record_finding(state, EventType::Signup, &event.id, fraud_score, now).await?;
    }
    Ok(event)
}

async fn gather_click_signals(
    state: &AppState,
    ip: Option<&str>,
    user_agent: Option<String>,
    now: DateTime<Utc>,
) -> anyhow::Result<ClickSignals> {
    let mut signals = ClickSignals {
        user_agent,
        ..Default::default()
    };
    if let Some(ip) = ip {
        let hour_ago = now - chrono::Duration::hours(1);
        signals.clicks_from_ip_last_hour = state.events.clicks_from_ip_since(ip, hour_ago).await?;
        signals.distinct_links_from_ip_last_hour =
            state.events.distinct_links_from_ip_since(ip, hour_ago).await?;
        signals.proxy_flagged = state.reputation.is_proxy(ip).await;
    }
    Ok(signals)
}

async fn record_finding(
    state: &AppState,
    event_type: EventType,
    event_id: &str,
    fraud_score: f64,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let details = match event_type {
        EventType::Click => CLICK_FINDING_DETAILS,
        EventType::Signup => SIGNUP_FINDING_DETAILS,
    };
    let finding = FraudFinding {
        id: Uuid::new_v4().to_string(),
        event_type,
        event_id: event_id.to_string(),
        fraud_score,
        details: details.to_string(),
        timestamp: now,
    };
    state.events.insert_fraud_finding(&finding).await?;
    info!(
        event_type = event_type.as_str(),
        event_id = %event_id,
        fraud_score,
        "fraud finding recorded"
    );
    Ok(())
}
