//! Test doubles and common utilities for pipeline contract tests
//!
//! These doubles record every call so tests can assert on exactly which API
//! operations were issued, in which order.

#![allow(dead_code)]

use cfip_core::config::{API_TOKEN_LEN, ZONE_ID_LEN};
use cfip_core::error::{Error, Result};
use cfip_core::traits::{
    DnsProvider, DnsRecordSet, NewRecord, PageFetcher, RemoteRecord, TokenStatus, ZoneInfo,
};
use cfip_core::{CloudflareConfig, IpRecord, LineType};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// One observed provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    VerifyToken,
    VerifyZone,
    List { name: String, record_type: String },
    Delete { id: String },
    Create(NewRecord),
}

/// A mock DnsProvider that records calls and serves canned record sets
#[derive(Default)]
pub struct MockDnsProvider {
    calls: Arc<Mutex<Vec<ProviderCall>>>,
    existing: HashMap<String, Vec<RemoteRecord>>,
    fail_token: bool,
    fail_zone: bool,
    fail_list: HashSet<String>,
    fail_delete: HashSet<String>,
    fail_create: HashSet<String>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `count` existing records for a fully-qualified name
    pub fn with_existing(mut self, fqdn: &str, count: usize) -> Self {
        let records = (0..count)
            .map(|i| RemoteRecord {
                id: format!("{}-old-{}", fqdn, i),
                name: fqdn.to_string(),
                content: format!("198.51.100.{}", i + 1),
                record_type: "A".to_string(),
            })
            .collect();
        self.existing.insert(fqdn.to_string(), records);
        self
    }

    pub fn failing_token(mut self) -> Self {
        self.fail_token = true;
        self
    }

    pub fn failing_zone(mut self) -> Self {
        self.fail_zone = true;
        self
    }

    pub fn failing_list(mut self, fqdn: &str) -> Self {
        self.fail_list.insert(fqdn.to_string());
        self
    }

    pub fn failing_delete(mut self, id: &str) -> Self {
        self.fail_delete.insert(id.to_string());
        self
    }

    pub fn failing_create(mut self, content: &str) -> Self {
        self.fail_create.insert(content.to_string());
        self
    }

    /// Handle to the call log that outlives the provider
    pub fn call_log(&self) -> Arc<Mutex<Vec<ProviderCall>>> {
        Arc::clone(&self.calls)
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ProviderCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn verify_token(&self) -> Result<TokenStatus> {
        self.record(ProviderCall::VerifyToken);
        if self.fail_token {
            return Err(Error::provider("mock", "Invalid API Token"));
        }
        Ok(TokenStatus {
            id: "token-id".to_string(),
            status: "active".to_string(),
            resources: Vec::new(),
        })
    }

    async fn verify_zone(&self) -> Result<ZoneInfo> {
        self.record(ProviderCall::VerifyZone);
        if self.fail_zone {
            return Err(Error::provider("mock", "Could not route to /zones"));
        }
        Ok(ZoneInfo {
            id: "z".repeat(ZONE_ID_LEN),
            name: "example.com".to_string(),
        })
    }

    async fn list_records(&self, name: &str, record_type: &str) -> Result<DnsRecordSet> {
        self.record(ProviderCall::List {
            name: name.to_string(),
            record_type: record_type.to_string(),
        });
        if self.fail_list.contains(name) {
            return Err(Error::network("HTTP 500"));
        }
        Ok(DnsRecordSet::new(
            self.existing.get(name).cloned().unwrap_or_default(),
        ))
    }

    async fn delete_record(&self, record_id: &str) -> Result<()> {
        self.record(ProviderCall::Delete {
            id: record_id.to_string(),
        });
        if self.fail_delete.contains(record_id) {
            return Err(Error::provider("mock", "Record does not exist"));
        }
        Ok(())
    }

    async fn create_record(&self, record: &NewRecord) -> Result<()> {
        self.record(ProviderCall::Create(record.clone()));
        if self.fail_create.contains(&record.content) {
            return Err(Error::provider("mock", "Content for A record is invalid"));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A PageFetcher serving canned pages by URL
#[derive(Default)]
pub struct MockPageFetcher {
    pages: HashMap<String, String>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn fetch_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.fetched)
    }
}

#[async_trait::async_trait]
impl PageFetcher for MockPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::network(format!("HTTP 404 Not Found for {}", url)))
    }
}

/// A Cloudflare configuration that passes validation
pub fn valid_cloudflare() -> CloudflareConfig {
    CloudflareConfig {
        enabled: true,
        api_token: "t".repeat(API_TOKEN_LEN),
        zone_id: "z".repeat(ZONE_ID_LEN),
        domain: "example.com".to_string(),
        ..CloudflareConfig::default()
    }
}

pub fn rec(address: &str, line: &str) -> IpRecord {
    IpRecord::new(address, LineType::from_token(line))
}

/// Count calls matching a predicate
pub fn count(calls: &[ProviderCall], pred: impl Fn(&ProviderCall) -> bool) -> usize {
    calls.iter().filter(|c| pred(*c)).count()
}

pub fn is_delete(call: &ProviderCall) -> bool {
    matches!(call, ProviderCall::Delete { .. })
}

pub fn is_create(call: &ProviderCall) -> bool {
    matches!(call, ProviderCall::Create(_))
}

/// Render a table row in the speed-test page layout
pub fn row(ordinal: usize, line: &str, address: &str) -> String {
    format!(
        "<tr><td>{}</td> <td>{}</td> <td>{}</td> <td>0.00%</td> <td>120ms</td> <td>20MB/s</td> <td>160Mbps</td> <td>SJC</td> <td>10:00</td></tr>\n",
        ordinal, line, address
    )
}

/// Wrap rows into a minimal page
pub fn page(rows: &[String]) -> String {
    format!(
        "<html><body><table>\n{}</table></body></html>",
        rows.concat()
    )
}
