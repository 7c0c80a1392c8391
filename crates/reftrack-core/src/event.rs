use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw event kind, used by fraud findings and the raw export's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Click,
    Signup,
}

impl EventType {
    /// Wire tag written to the raw-export sheet ("click" / "signup").
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::Signup => "signup",
        }
    }
}

/// A recorded link click. Immutable after the fraud score is set at creation;
/// never deleted by this worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickEvent {
    pub id: String,
    pub referral_link_id: String,
    pub timestamp: DateTime<Utc>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub fraud_score: f64,
}

/// A signup attributed to a referral link. `click_event_id` is a weak
/// reference: it may point at a click that no longer exists or that belongs
/// to a different link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupEvent {
    pub id: String,
    pub click_event_id: Option<String>,
    pub referral_link_id: String,
    pub timestamp: DateTime<Utc>,
    /// Minutes between the originating click and this signup. `None` when
    /// there was no linked click to measure from.
    pub conversion_minutes: Option<i64>,
    pub fraud_score: f64,
}

/// Append-only record created when a computed fraud score exceeds the
/// alerting threshold. `event_id` is not enforced by any constraint and may
/// dangle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudFinding {
    pub id: String,
    pub event_type: EventType,
    pub event_id: String,
    pub fraud_score: f64,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

/// One denormalized row of the raw export, produced by a single joined query
/// so no per-row lookups happen while streaming (see the event store trait).
///
/// For signups, `ip`/`user_agent` are inherited from the linked click event
/// when present, otherwise empty.
#[derive(Debug, Clone)]
pub struct RawEventRow {
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub event_id: String,
    pub referral_link_id: String,
    pub officer_id: String,
    pub campaign_id: String,
    pub campaign_name: String,
    pub ip: String,
    pub user_agent: String,
}

impl RawEventRow {
    /// Column order agreed by convention with the sheet; the user-identifier
    /// column is reserved but intentionally left empty.
    pub fn to_sheet_row(&self) -> Vec<String> {
        vec![
            self.timestamp.to_rfc3339(),
            self.event_type.as_str().to_string(),
            self.referral_link_id.clone(),
            self.officer_id.clone(),
            self.campaign_id.clone(),
            self.campaign_name.clone(),
            String::new(),
            self.ip.clone(),
            self.user_agent.clone(),
        ]
    }
}
