//! External proxy/VPN/TOR reputation lookup.
//!
//! Fail-open by contract: any transport error, timeout, or unexpected
//! payload is treated as "not a proxy", logged at warning level, and never
//! propagated. The lookup timeout is far stricter than export I/O so a
//! stalled reputation service cannot hold up the ingestion path.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use reftrack_core::config::Config;
use reftrack_core::fraud::IpReputation;

pub struct HttpReputationClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpReputationClient {
    /// `None` when no reputation endpoint is configured — the caller should
    /// fall back to [`reftrack_core::fraud::AlwaysClean`].
    pub fn from_config(config: &Config) -> Option<Self> {
        let base_url = config.reputation_url.clone()?;
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.reputation_timeout_ms))
            .timeout(Duration::from_millis(config.reputation_timeout_ms))
            .build()
            .ok()?;
        Some(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.reputation_api_key.clone(),
        })
    }

    async fn lookup(&self, ip: &str) -> anyhow::Result<bool> {
        let mut url = format!("{}/{}?vpn=1", self.base_url, ip);
        if let Some(key) = &self.api_key {
            url.push_str(&format!("&key={key}"));
        }
        let body: serde_json::Value = self.http.get(&url).send().await?.json().await?;
        // Response shape: { "<ip>": { "proxy": "yes"|"no", "type": "VPN"|... } }
        let entry = &body[ip];
        let proxy = entry["proxy"].as_str() == Some("yes");
        let kind = entry["type"].as_str().unwrap_or("");
        Ok(proxy || kind == "VPN" || kind == "TOR")
    }
}

#[async_trait]
impl IpReputation for HttpReputationClient {
    async fn is_proxy(&self, ip: &str) -> bool {
        match self.lookup(ip).await {
            Ok(flagged) => flagged,
            Err(err) => {
                warn!(ip = %ip, error = %err, "reputation lookup failed, treating as clean");
                false
            }
        }
    }
}
