use std::time::Duration;

use crate::fraud::FraudWeights;
use crate::task::RetryPolicy;

/// Worker configuration, loaded once at startup from environment variables
/// and shared via `Arc<Config>`. Business logic never reads the environment
/// directly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Target spreadsheet identifier (`REFTRACK_SHEET_ID`).
    pub sheet_id: String,
    /// Raw service-account credential payload (`REFTRACK_SERVICE_ACCOUNT_JSON`).
    /// May be plain JSON, JSON with escaped newlines, or base64-encoded JSON;
    /// parsing happens in the sheets layer.
    pub service_account_json: Option<String>,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    /// Raw incremental export cadence, seconds. Defaults to 15 minutes.
    pub raw_export_interval_secs: u64,
    /// UTC hour at which the daily aggregate pipeline fires.
    pub pipeline_hour_utc: u32,
    /// Scheduler wake-up cadence for the daily-pipeline check.
    pub scheduler_tick_seconds: u64,
    /// Proxy/VPN reputation endpoint. `None` disables the lookup entirely
    /// (every IP scores as clean).
    pub reputation_url: Option<String>,
    pub reputation_api_key: Option<String>,
    /// Reputation lookups must be stricter than export I/O: a stalled lookup
    /// may never block the ingestion path.
    pub reputation_timeout_ms: u64,
    pub fraud: FraudWeights,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let mut fraud = FraudWeights::default();
        if let Ok(raw) = std::env::var("REFTRACK_FRAUD_THRESHOLD") {
            fraud.finding_threshold = raw
                .parse()
                .map_err(|e| format!("invalid REFTRACK_FRAUD_THRESHOLD: {e}"))?;
        }

        let mut retry = RetryPolicy::default();
        if let Ok(raw) = std::env::var("REFTRACK_RETRY_BASE_MS") {
            retry.base_delay_ms = raw
                .parse()
                .map_err(|e| format!("invalid REFTRACK_RETRY_BASE_MS: {e}"))?;
        }

        Ok(Self {
            sheet_id: std::env::var("REFTRACK_SHEET_ID").unwrap_or_default(),
            service_account_json: std::env::var("REFTRACK_SERVICE_ACCOUNT_JSON").ok(),
            data_dir: std::env::var("REFTRACK_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            duckdb_memory_limit: std::env::var("REFTRACK_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            raw_export_interval_secs: std::env::var("REFTRACK_RAW_EXPORT_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .unwrap_or(900),
            pipeline_hour_utc: std::env::var("REFTRACK_PIPELINE_HOUR_UTC")
                .unwrap_or_else(|_| "3".to_string())
                .parse::<u32>()
                .map(|v| v.min(23))
                .unwrap_or(3),
            scheduler_tick_seconds: std::env::var("REFTRACK_SCHEDULER_TICK_SECONDS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(|v| v.clamp(10, 3600))
                .unwrap_or(60),
            reputation_url: std::env::var("REFTRACK_REPUTATION_URL").ok(),
            reputation_api_key: std::env::var("REFTRACK_REPUTATION_API_KEY").ok(),
            reputation_timeout_ms: std::env::var("REFTRACK_REPUTATION_TIMEOUT_MS")
                .unwrap_or_else(|_| "800".to_string())
                .parse()
                .unwrap_or(800),
            fraud,
            retry,
        })
    }

    pub fn raw_export_interval(&self) -> Duration {
        Duration::from_secs(self.raw_export_interval_secs)
    }
}
