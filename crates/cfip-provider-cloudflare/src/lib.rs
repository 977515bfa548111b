// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare implementation of `cfip_core::DnsProvider`.
//
// Each trait method is exactly one HTTP request against the Cloudflare API v4.
// The provider holds no record state between calls and never retries; the
// reconciler decides what to read, delete and create.
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - Verify Token: GET `/user/tokens/verify`
// - Zone Details: GET `/zones/:zone_id`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`

mod api;

pub use api::ApiOutcome;

use async_trait::async_trait;
use cfip_core::config::CloudflareConfig;
use cfip_core::traits::{
    DnsProvider, DnsRecordSet, NewRecord, RemoteRecord, TokenResource, TokenStatus, ZoneInfo,
};
use cfip_core::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TokenResult {
    id: String,
    status: String,
    #[serde(default)]
    policies: Vec<TokenPolicy>,
}

#[derive(Debug, Deserialize)]
struct TokenPolicy {
    #[serde(default)]
    resources: serde_json::Map<String, serde_json::Value>,
}

impl From<TokenResult> for TokenStatus {
    fn from(token: TokenResult) -> Self {
        let resources = token
            .policies
            .into_iter()
            .flat_map(|policy| policy.resources)
            .map(|(id, permission)| TokenResource {
                id,
                permission: match permission {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                },
            })
            .collect();

        TokenStatus {
            id: token.id,
            status: token.status,
            resources,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ZoneResult {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RecordResult {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    content: String,
    #[serde(rename = "type", default)]
    record_type: String,
}

impl From<RecordResult> for RemoteRecord {
    fn from(r: RecordResult) -> Self {
        RemoteRecord {
            id: r.id,
            name: r.name,
            content: r.content,
            record_type: r.record_type,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeletedResult {
    #[allow(dead_code)]
    id: String,
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (token, zone and record lookups)
/// - Log the DELETE and POST requests it would send
/// - **NOT** modify any DNS record
///
/// # Security
///
/// The Debug implementation does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Zone holding the records
    zone_id: String,

    /// API base URL, overridable for tests
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip writes
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `zone_id`: Zone holding the managed records
    /// - `dry_run`: If true, perform GET requests but skip DELETE/POST
    ///
    /// # Errors
    ///
    /// `Config` if the token or zone ID is empty, `Network` if the HTTP client
    /// cannot be built.
    pub fn new(
        api_token: impl Into<String>,
        zone_id: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        let zone_id = zone_id.into();

        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }
        if zone_id.is_empty() {
            return Err(Error::config("Cloudflare zone ID cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            zone_id,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a new Cloudflare provider (production/live mode)
    pub fn new_live(api_token: impl Into<String>, zone_id: impl Into<String>) -> Result<Self> {
        Self::new(api_token, zone_id, false)
    }

    /// Create a new Cloudflare provider (dry-run mode)
    ///
    /// In dry-run mode, the provider will perform all GET requests but skip
    /// DELETE and POST, logging what would have been changed.
    pub fn new_dry_run(api_token: impl Into<String>, zone_id: impl Into<String>) -> Result<Self> {
        Self::new(api_token, zone_id, true)
    }

    /// Create a provider from the collector's Cloudflare settings
    pub fn from_config(config: &CloudflareConfig, dry_run: bool) -> Result<Self> {
        if dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }
        Self::new(config.api_token.clone(), config.zone_id.clone(), dry_run)
    }

    /// Point the provider at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether writes are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, self.zone_id)
    }

    /// Send a request and decode the response envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<ApiOutcome<T>> {
        let response = match request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                // reqwest errors may carry the URL but never the auth header
                return Ok(ApiOutcome::TransportError(format!(
                    "HTTP request failed: {}",
                    e
                )));
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Ok(ApiOutcome::TransportError(format!(
                    "Failed to read response body: {}",
                    e
                )));
            }
        };

        ApiOutcome::decode(status, &body)
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// ```http
    /// GET /user/tokens/verify
    /// Authorization: Bearer <token>
    /// ```
    async fn verify_token(&self) -> Result<TokenStatus> {
        let url = format!("{}/user/tokens/verify", self.base_url);
        let token: TokenResult = self.send(self.client.get(&url)).await?.into_result()?;

        tracing::debug!("Token {} is {}", token.id, token.status);
        Ok(TokenStatus::from(token))
    }

    /// ```http
    /// GET /zones/:zone_id
    /// ```
    async fn verify_zone(&self) -> Result<ZoneInfo> {
        let url = format!("{}/zones/{}", self.base_url, self.zone_id);
        let zone: ZoneResult = self.send(self.client.get(&url)).await?.into_result()?;

        Ok(ZoneInfo {
            id: zone.id,
            name: zone.name,
        })
    }

    /// ```http
    /// GET /zones/:zone_id/dns_records?name=cf-CT.example.com&type=A
    /// ```
    async fn list_records(&self, name: &str, record_type: &str) -> Result<DnsRecordSet> {
        tracing::debug!("Listing records: {} (type: {})", name, record_type);

        let request = self
            .client
            .get(self.records_url())
            .query(&[("name", name), ("type", record_type)]);
        let records: Vec<RecordResult> = self.send(request).await?.into_result()?;

        Ok(DnsRecordSet::new(
            records.into_iter().map(RemoteRecord::from).collect(),
        ))
    }

    /// ```http
    /// DELETE /zones/:zone_id/dns_records/:record_id
    /// ```
    async fn delete_record(&self, record_id: &str) -> Result<()> {
        let url = format!("{}/{}", self.records_url(), record_id);

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send DELETE request to {}", url);
            return Ok(());
        }

        let _: DeletedResult = self.send(self.client.delete(&url)).await?.into_result()?;
        tracing::debug!("Deleted record {}", record_id);
        Ok(())
    }

    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// { "type": "A", "name": "cf-CT", "content": "1.2.3.4", "ttl": 1, "proxied": false }
    /// ```
    async fn create_record(&self, record: &NewRecord) -> Result<()> {
        let url = self.records_url();

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                url,
                serde_json::to_string(record)?
            );
            return Ok(());
        }

        let created: RecordResult = self
            .send(self.client.post(&url).json(record))
            .await?
            .into_result()?;
        tracing::debug!("Created record {} -> {} ({})", record.name, record.content, created.id);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
