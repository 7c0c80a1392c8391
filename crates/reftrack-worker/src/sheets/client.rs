//! Google Sheets values-API sink.
//!
//! Implements the three verbs the exports need (`values/{range}` get,
//! `values:append`, `values:clear`) over the REST API with bounded timeouts.
//! Authentication is the standard service-account flow: an RS256-signed JWT
//! grant exchanged at the token endpoint, with the access token cached until
//! shortly before expiry.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use reftrack_core::sheets::SheetSink;

use super::credentials::ServiceAccountKey;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
/// Refresh the cached token this long before its actual expiry.
const TOKEN_EXPIRY_SLACK: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct GrantClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

pub struct GoogleSheetsSink {
    http: reqwest::Client,
    key: ServiceAccountKey,
    sheet_id: String,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleSheetsSink {
    pub fn new(key: ServiceAccountKey, sheet_id: String) -> anyhow::Result<Self> {
        if sheet_id.is_empty() {
            anyhow::bail!("sheet id is not configured");
        }
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            key,
            sheet_id,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> anyhow::Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let now = chrono::Utc::now().timestamp();
        let claims = GrantClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let token: TokenResponse = response.json().await?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_SLACK);
        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            refresh_at: Instant::now() + lifetime,
        });
        debug!("sheets access token refreshed");
        Ok(value)
    }
}

#[async_trait]
impl SheetSink for GoogleSheetsSink {
    async fn read_cell(&self, worksheet: &str, cell: &str) -> anyhow::Result<Option<String>> {
        let token = self.access_token().await?;
        let url = format!(
            "{SHEETS_API_BASE}/{}/values/{worksheet}!{cell}",
            self.sheet_id
        );
        let body: serde_json::Value = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        // An empty cell comes back with no "values" key at all.
        Ok(body["values"][0][0].as_str().map(str::to_string))
    }

    async fn append_rows(&self, worksheet: &str, rows: &[Vec<String>]) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let token = self.access_token().await?;
        let url = format!(
            "{SHEETS_API_BASE}/{}/values/{worksheet}!A1:append?valueInputOption=RAW",
            self.sheet_id
        );
        self.http
            .post(&url)
            .bearer_auth(token)
            .json(&json!({ "values": rows }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn clear(&self, worksheet: &str) -> anyhow::Result<()> {
        let token = self.access_token().await?;
        let url = format!(
            "{SHEETS_API_BASE}/{}/values/{worksheet}:clear",
            self.sheet_id
        );
        self.http
            .post(&url)
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
