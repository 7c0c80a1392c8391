/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup (idempotent).
///
/// `memory_limit` is passed at runtime from `Config.duckdb_memory_limit`
/// (env `REFTRACK_DUCKDB_MEMORY`, default `"1GB"`). Always set an explicit
/// limit — the DuckDB default (80% of system RAM) is not acceptable for a
/// long-running worker. `SET threads = 2` bounds the background thread pool
/// for single-writer embedded use.
///
/// Referential notes:
/// - `signup_events.click_event_id` and `fraud_findings.event_id` are weak
///   references (no FK) — they may dangle.
/// - `daily_metrics` has a composite primary key so the aggregator can use
///   `INSERT OR REPLACE` for its idempotent upsert.
/// - `checkpoints` is a plain KV table; keys use the `checkpoint:<task>`
///   format from `reftrack_core::store::checkpoint_key`.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

CREATE TABLE IF NOT EXISTS officers (
    id              VARCHAR PRIMARY KEY,
    full_name       VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS campaigns (
    id              VARCHAR PRIMARY KEY,
    name            VARCHAR NOT NULL,
    start_date      DATE NOT NULL,
    end_date        DATE NOT NULL
);

CREATE TABLE IF NOT EXISTS referral_links (
    id              VARCHAR PRIMARY KEY,
    officer_id      VARCHAR NOT NULL,
    campaign_id     VARCHAR NOT NULL,
    ref_code        VARCHAR NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_links_officer  ON referral_links(officer_id);
CREATE INDEX IF NOT EXISTS idx_links_campaign ON referral_links(campaign_id);

CREATE TABLE IF NOT EXISTS click_events (
    id               VARCHAR PRIMARY KEY,
    referral_link_id VARCHAR NOT NULL,
    timestamp        TIMESTAMP NOT NULL,
    ip               VARCHAR,
    user_agent       VARCHAR,
    country          VARCHAR,
    city             VARCHAR,
    region           VARCHAR,
    fraud_score      DOUBLE NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_clicks_ts   ON click_events(timestamp);
CREATE INDEX IF NOT EXISTS idx_clicks_ip   ON click_events(ip);
CREATE INDEX IF NOT EXISTS idx_clicks_link ON click_events(referral_link_id);

CREATE TABLE IF NOT EXISTS signup_events (
    id                 VARCHAR PRIMARY KEY,
    click_event_id     VARCHAR,
    referral_link_id   VARCHAR NOT NULL,
    timestamp          TIMESTAMP NOT NULL,
    conversion_minutes BIGINT,
    fraud_score        DOUBLE NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_signups_ts   ON signup_events(timestamp);
CREATE INDEX IF NOT EXISTS idx_signups_link ON signup_events(referral_link_id);

CREATE TABLE IF NOT EXISTS fraud_findings (
    id          VARCHAR PRIMARY KEY,
    event_type  VARCHAR NOT NULL,
    event_id    VARCHAR NOT NULL,
    fraud_score DOUBLE NOT NULL,
    details     VARCHAR NOT NULL,
    timestamp   TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_findings_event ON fraud_findings(event_id);

CREATE TABLE IF NOT EXISTS daily_metrics (
    referral_link_id     VARCHAR NOT NULL,
    officer_id           VARCHAR NOT NULL,
    campaign_id          VARCHAR NOT NULL,
    metric_date          DATE NOT NULL,
    total_clicks         BIGINT NOT NULL DEFAULT 0,
    total_signups        BIGINT NOT NULL DEFAULT 0,
    click_to_signup_rate DOUBLE NOT NULL DEFAULT 0,
    PRIMARY KEY (referral_link_id, officer_id, campaign_id, metric_date)
);
CREATE INDEX IF NOT EXISTS idx_metrics_date     ON daily_metrics(metric_date);
CREATE INDEX IF NOT EXISTS idx_metrics_officer  ON daily_metrics(officer_id);
CREATE INDEX IF NOT EXISTS idx_metrics_campaign ON daily_metrics(campaign_id);

CREATE TABLE IF NOT EXISTS checkpoints (
    key        VARCHAR PRIMARY KEY,
    value      VARCHAR NOT NULL,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#
    )
}
