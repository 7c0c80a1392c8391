//! Fraud scoring heuristics.
//!
//! The scorers are pure: they take pre-gathered counters and attributes and
//! return a score. Side effects (persisting the event, creating a finding
//! when the score crosses the threshold) belong to the ingestion path.

use async_trait::async_trait;

/// Signal weights and limits. The defaults are operational tuning with no
/// documented derivation; they are kept as configurable constants rather
/// than re-derived.
#[derive(Debug, Clone)]
pub struct FraudWeights {
    /// Added when the IP exceeds `ip_frequency_limit` clicks in the trailing hour.
    pub ip_frequency: f64,
    /// Added when the IP is flagged as proxy/VPN/TOR.
    pub proxy: f64,
    /// Added when the user agent contains "bot" (case-insensitive).
    pub bot_agent: f64,
    /// Added when the IP clicked more than `link_spread_limit` distinct links
    /// in the trailing hour.
    pub link_spread: f64,
    /// Added when signup conversion took under one minute.
    pub fast_conversion: f64,
    /// Added when the originating click already scored above the threshold.
    pub tainted_click: f64,
    /// Scores strictly above this produce a fraud finding.
    pub finding_threshold: f64,
    pub ip_frequency_limit: i64,
    pub link_spread_limit: i64,
}

impl Default for FraudWeights {
    fn default() -> Self {
        Self {
            ip_frequency: 5.0,
            proxy: 7.0,
            bot_agent: 3.0,
            link_spread: 2.0,
            fast_conversion: 5.0,
            tainted_click: 5.0,
            finding_threshold: 7.0,
            ip_frequency_limit: 10,
            link_spread_limit: 3,
        }
    }
}

/// Counters and attributes gathered by the ingestion path before scoring a
/// click. Trailing-hour counters come from single grouped queries; the proxy
/// flag comes from the (fail-open) reputation lookup.
#[derive(Debug, Clone, Default)]
pub struct ClickSignals {
    pub clicks_from_ip_last_hour: i64,
    pub distinct_links_from_ip_last_hour: i64,
    pub proxy_flagged: bool,
    pub user_agent: Option<String>,
}

/// Weighted sum over independent click signals. No cap is applied here.
pub fn score_click(signals: &ClickSignals, weights: &FraudWeights) -> f64 {
    let mut score = 0.0;
    if signals.clicks_from_ip_last_hour > weights.ip_frequency_limit {
        score += weights.ip_frequency;
    }
    if signals.proxy_flagged {
        score += weights.proxy;
    }
    if signals
        .user_agent
        .as_deref()
        .unwrap_or("")
        .to_lowercase()
        .contains("bot")
    {
        score += weights.bot_agent;
    }
    if signals.distinct_links_from_ip_last_hour > weights.link_spread_limit {
        score += weights.link_spread;
    }
    score
}

/// Signup scoring: sub-minute conversions and signups riding an
/// already-suspicious click each add a fixed weight.
pub fn score_signup(
    click_fraud_score: Option<f64>,
    conversion_minutes: Option<i64>,
    weights: &FraudWeights,
) -> f64 {
    let mut score = 0.0;
    if matches!(conversion_minutes, Some(m) if m < 1) {
        score += weights.fast_conversion;
    }
    if matches!(click_fraud_score, Some(s) if s > weights.finding_threshold) {
        score += weights.tainted_click;
    }
    score
}

/// External proxy/VPN/TOR lookup.
///
/// Implementations must fail open: any error or timeout is treated as "not a
/// proxy" and logged at warning level. The `bool` return carries no error;
/// a stalled or broken reputation service must never reject traffic or
/// escalate.
#[async_trait]
pub trait IpReputation: Send + Sync + 'static {
    async fn is_proxy(&self, ip: &str) -> bool;
}

/// Reputation source that flags nothing. Used when no reputation endpoint is
/// configured, and in tests.
pub struct AlwaysClean;

#[async_trait]
impl IpReputation for AlwaysClean {
    async fn is_proxy(&self, _ip: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals() -> ClickSignals {
        ClickSignals {
            clicks_from_ip_last_hour: 0,
            distinct_links_from_ip_last_hour: 0,
            proxy_flagged: false,
            user_agent: Some("Mozilla/5.0".to_string()),
        }
    }

    #[test]
    fn test_clean_click_scores_zero() {
        assert_eq!(score_click(&signals(), &FraudWeights::default()), 0.0);
    }

    #[test]
    fn test_ip_frequency_is_the_only_contribution() {
        // 11 clicks in the trailing hour, non-bot agent, non-proxy IP,
        // <= 3 distinct links: exactly the +5 frequency weight.
        let mut s = signals();
        s.clicks_from_ip_last_hour = 11;
        assert_eq!(score_click(&s, &FraudWeights::default()), 5.0);
    }

    #[test]
    fn test_ip_frequency_boundary_not_triggered_at_limit() {
        let mut s = signals();
        s.clicks_from_ip_last_hour = 10;
        assert_eq!(score_click(&s, &FraudWeights::default()), 0.0);
    }

    #[test]
    fn test_bot_agent_case_insensitive() {
        let mut s = signals();
        s.user_agent = Some("GoogleBot/2.1".to_string());
        assert_eq!(score_click(&s, &FraudWeights::default()), 3.0);
    }

    #[test]
    fn test_missing_user_agent_is_not_a_bot() {
        let mut s = signals();
        s.user_agent = None;
        assert_eq!(score_click(&s, &FraudWeights::default()), 0.0);
    }

    #[test]
    fn test_signals_sum_without_cap() {
        let s = ClickSignals {
            clicks_from_ip_last_hour: 11,
            distinct_links_from_ip_last_hour: 4,
            proxy_flagged: true,
            user_agent: Some("somebot".to_string()),
        };
        assert_eq!(score_click(&s, &FraudWeights::default()), 17.0);
    }

    #[test]
    fn test_signup_fast_conversion() {
        let w = FraudWeights::default();
        assert_eq!(score_signup(Some(0.0), Some(0), &w), 5.0);
        assert_eq!(score_signup(Some(0.0), Some(1), &w), 0.0);
        // No linked click means no conversion time to measure.
        assert_eq!(score_signup(None, None, &w), 0.0);
    }

    #[test]
    fn test_signup_tainted_click() {
        let w = FraudWeights::default();
        assert_eq!(score_signup(Some(8.0), Some(30), &w), 5.0);
        // Threshold is strict.
        assert_eq!(score_signup(Some(7.0), Some(30), &w), 0.0);
        assert_eq!(score_signup(Some(8.0), Some(0), &w), 10.0);
    }
}
