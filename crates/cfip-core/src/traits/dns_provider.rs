// # DNS Provider Trait
//
// Defines the record-set operations the reconciler needs from a provider API.
//
// ## Implementations
//
// - Cloudflare: `cfip-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use cfip_core::DnsProvider;
// use cfip_core::traits::NewRecord;
//
// #[tokio::main]
// async fn main() -> cfip_core::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     provider.verify_token().await?;
//     let existing = provider.list_records("cf-CT.example.com", "A").await?;
//     for record in &existing.records {
//         provider.delete_record(&record.id).await?;
//     }
//     provider.create_record(&NewRecord::for_address("cf-CT", "1.2.3.4", 1, false)).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::Serialize;

/// Result of token verification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStatus {
    /// Token ID
    pub id: String,
    /// Token status as reported by the provider (e.g. "active")
    pub status: String,
    /// Resources granted by the token's policies
    pub resources: Vec<TokenResource>,
}

impl TokenStatus {
    /// Resources that concern DNS records or zones
    pub fn dns_resources(&self) -> impl Iterator<Item = &TokenResource> {
        self.resources.iter().filter(|r| {
            let id = r.id.to_lowercase();
            id.contains("dns") || id.contains("zone")
        })
    }
}

/// One resource entry of a token policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResource {
    /// Resource identifier, e.g. `com.cloudflare.api.account.zone.<id>`
    pub id: String,
    /// Permission granted on the resource, as the provider renders it
    pub permission: String,
}

/// Result of zone verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneInfo {
    /// Zone ID
    pub id: String,
    /// Zone apex name
    pub name: String,
}

/// One record as currently held by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecord {
    /// Provider-assigned record ID
    pub id: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record content (the address)
    pub content: String,
    /// Record type (A, AAAA, ...)
    pub record_type: String,
}

/// The provider's current records for one `(name, type)` pair
///
/// Observed fresh on every run; never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsRecordSet {
    /// Records in the order the provider returned them
    pub records: Vec<RemoteRecord>,
}

impl DnsRecordSet {
    /// Create a record set
    pub fn new(records: Vec<RemoteRecord>) -> Self {
        Self { records }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A record to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRecord {
    /// Record type
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record name, relative to the zone
    pub name: String,
    /// Address
    pub content: String,
    /// TTL (1 = automatic)
    pub ttl: u32,
    /// Whether traffic is proxied
    pub proxied: bool,
}

impl NewRecord {
    /// Build a record for an address, choosing `AAAA` for anything containing
    /// `:` and `A` otherwise.
    pub fn for_address(
        name: impl Into<String>,
        address: impl Into<String>,
        ttl: u32,
        proxied: bool,
    ) -> Self {
        let content = address.into();
        let record_type = if content.contains(':') { "AAAA" } else { "A" };
        Self {
            record_type: record_type.to_string(),
            name: name.into(),
            content,
            ttl,
            proxied,
        }
    }
}

/// Trait for DNS provider implementations
///
/// Each method is a single API call. Providers do not retry, do not cache the
/// record set between calls, and do not decide what should be written; the
/// reconciler owns those decisions.
///
/// # Errors
///
/// Every error carries the provider's own message when it sent one, otherwise
/// the HTTP status.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Check that the configured credentials are accepted
    async fn verify_token(&self) -> Result<TokenStatus, crate::Error>;

    /// Check that the configured zone exists and is accessible
    async fn verify_zone(&self) -> Result<ZoneInfo, crate::Error>;

    /// Read the current records for a fully-qualified name and type
    async fn list_records(
        &self,
        name: &str,
        record_type: &str,
    ) -> Result<DnsRecordSet, crate::Error>;

    /// Delete one record by ID
    async fn delete_record(&self, record_id: &str) -> Result<(), crate::Error>;

    /// Create one record
    async fn create_record(&self, record: &NewRecord) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
