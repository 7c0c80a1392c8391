use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A tracked URL attributing clicks and signups to one officer and one
/// campaign. Owned by the CRUD layer; referenced here for aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralLink {
    pub id: String,
    pub officer_id: String,
    pub campaign_id: String,
    pub ref_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Officer {
    pub id: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Per-link, per-day rollup. Composite identity is
/// (referral_link, officer, campaign, metric_date); one row per link per day,
/// upserted exclusively by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub referral_link_id: String,
    pub officer_id: String,
    pub campaign_id: String,
    pub metric_date: NaiveDate,
    pub total_clicks: i64,
    pub total_signups: i64,
    pub click_to_signup_rate: f64,
}

/// All-time rollup for one officer, from a single grouped query.
#[derive(Debug, Clone)]
pub struct OfficerSummary {
    pub officer_id: String,
    pub officer_name: String,
    pub total_clicks: i64,
    pub total_signups: i64,
    /// Average of the daily click-to-signup rates, not a recomputed ratio.
    pub avg_rate: f64,
}

/// All-time rollup for one campaign. `metric_days` counts distinct metric
/// dates with data, which is the denominator for average signups per day —
/// calendar span would skew sparse or in-progress campaigns.
#[derive(Debug, Clone)]
pub struct CampaignSummary {
    pub campaign_id: String,
    pub campaign_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_clicks: i64,
    pub total_signups: i64,
    pub avg_rate: f64,
    pub metric_days: i64,
}

impl CampaignSummary {
    pub fn avg_signups_per_day(&self) -> f64 {
        if self.metric_days > 0 {
            self.total_signups as f64 / self.metric_days as f64
        } else {
            0.0
        }
    }
}

/// One day of the time-series export, summed across all links.
#[derive(Debug, Clone)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub total_clicks: i64,
    pub total_signups: i64,
    pub avg_rate: f64,
}

/// Click-to-signup conversion rate in percent. Zero clicks yields 0.0 rather
/// than a division by zero.
pub fn conversion_rate(clicks: i64, signups: i64) -> f64 {
    if clicks > 0 {
        signups as f64 / clicks as f64 * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_rate_zero_clicks_is_zero() {
        assert_eq!(conversion_rate(0, 0), 0.0);
        assert_eq!(conversion_rate(0, 3), 0.0);
    }

    #[test]
    fn test_conversion_rate_percent() {
        assert_eq!(conversion_rate(5, 2), 40.0);
        assert_eq!(conversion_rate(4, 4), 100.0);
    }

    #[test]
    fn test_avg_signups_per_day_uses_metric_days() {
        let summary = CampaignSummary {
            campaign_id: "camp_1".to_string(),
            campaign_name: "Launch".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
            total_clicks: 40,
            total_signups: 10,
            avg_rate: 25.0,
            metric_days: 2,
        };
        // Two distinct metric dates, regardless of the 6-month calendar span.
        assert_eq!(summary.avg_signups_per_day(), 5.0);
    }

    #[test]
    fn test_avg_signups_per_day_no_data() {
        let summary = CampaignSummary {
            campaign_id: "camp_2".to_string(),
            campaign_name: "Empty".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            total_clicks: 0,
            total_signups: 0,
            avg_rate: 0.0,
            metric_days: 0,
        };
        assert_eq!(summary.avg_signups_per_day(), 0.0);
    }
}
