//! DNS reconciler
//!
//! Forces one record set per line type to match the best addresses of the
//! merged list.
//!
//! ## Flow
//!
//! ```text
//! validate config ──► verify token ──► verify zone ──► group by line
//!                                                         │
//!            ┌────────────────────────────────────────────┘
//!            ▼  (per line, independently)
//!   truncate to max_records_per_line
//!            │
//!            ▼
//!   read existing (name, configured type) ──► delete each ──► create each
//! ```
//!
//! The provider has no "replace record set" call, so each line is replaced by
//! deleting what is there and creating the new records. Between the two steps
//! the name briefly resolves to nothing.
//!
//! Invalid settings turn sync off for the run without touching the provider.
//! Verification failures abort before any write. Everything after that is per
//! line and per record: a failed read skips that line, a failed delete or
//! create is logged and the loop moves on.

use crate::config::CloudflareConfig;
use crate::error::{Error, Result};
use crate::model::{IpRecord, LineType};
use crate::traits::{DnsProvider, NewRecord};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Outcome of a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Whether sync ran at all
    pub status: ReconcileStatus,
    /// Per-line results, in master-list order
    pub lines: Vec<LineReport>,
}

impl ReconcileReport {
    /// Report for a run where sync is disabled
    pub fn skipped() -> Self {
        Self {
            status: ReconcileStatus::Skipped,
            lines: Vec::new(),
        }
    }

    /// Report for a run whose sync settings were rejected
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            status: ReconcileStatus::Invalid(reason.into()),
            lines: Vec::new(),
        }
    }

    /// Whether sync ran (or was skipped) without any failure
    pub fn is_clean(&self) -> bool {
        !matches!(self.status, ReconcileStatus::Invalid(_))
            && self.lines.iter().all(LineReport::is_clean)
    }
}

/// Whether reconciliation ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileStatus {
    /// Sync disabled in configuration
    Skipped,
    /// Sync settings failed validation; sync was turned off for this run
    Invalid(String),
    /// Verification passed and every line was attempted
    Completed,
}

/// Result for one line type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineReport {
    /// The line type
    pub line_type: LineType,
    /// Fully-qualified record name
    pub fqdn: String,
    /// Addresses selected for this line, best first
    pub retained: Vec<String>,
    /// Existing records successfully deleted
    pub deleted: usize,
    /// New records successfully created
    pub created: usize,
    /// Messages for failed deletes/creates
    pub failures: Vec<String>,
    /// Set when the existing records could not be read; nothing was written
    pub read_error: Option<String>,
}

impl LineReport {
    /// Whether the line was fully written
    pub fn is_clean(&self) -> bool {
        self.read_error.is_none() && self.failures.is_empty()
    }
}

/// Replace each line's record set with its best addresses.
///
/// `records` must already be in master-list order; the first
/// `max_records_per_line` addresses of each line are kept.
///
/// # Returns
///
/// - `Ok(report)`: sync skipped, settings rejected by validation, or every
///   line attempted (see the report for per-line failures)
/// - `Err(Error)`: token or zone verification failed; no write was attempted
pub async fn reconcile(
    provider: &dyn DnsProvider,
    records: &[IpRecord],
    config: &CloudflareConfig,
) -> Result<ReconcileReport> {
    if !config.enabled {
        info!("Cloudflare DNS sync is disabled");
        return Ok(ReconcileReport::skipped());
    }

    if let Err(e) = config.validate() {
        warn!("Cloudflare DNS sync disabled for this run: {}", e);
        return Ok(ReconcileReport::invalid(e.to_string()));
    }

    info!("Starting {} DNS sync for {}", provider.provider_name(), config.domain);

    let token = provider.verify_token().await.map_err(|e| {
        error!("API token verification failed: {}", e);
        e
    })?;
    info!("API token verified (status: {})", token.status);
    for resource in token.dns_resources() {
        info!("Token resource: {}, permission: {}", resource.id, resource.permission);
    }

    let zone = provider.verify_zone().await.map_err(|e| {
        error!("Zone verification failed: {}", e);
        e
    })?;
    info!("Zone verified: {}", zone.name);

    let mut lines = Vec::new();
    for (line_type, addresses) in group_by_line(records) {
        lines.push(reconcile_line(provider, config, line_type, addresses).await);
    }

    Ok(ReconcileReport {
        status: ReconcileStatus::Completed,
        lines,
    })
}

/// Group addresses by line type, keeping first-appearance order for both the
/// groups and the addresses within them.
pub fn group_by_line(records: &[IpRecord]) -> Vec<(LineType, Vec<String>)> {
    let mut groups: Vec<(LineType, Vec<String>)> = Vec::new();
    let mut index: HashMap<&LineType, usize> = HashMap::new();

    for record in records {
        let slot = *index.entry(record.line_type()).or_insert_with(|| {
            groups.push((record.line_type().clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(record.address().to_string());
    }

    groups
}

async fn reconcile_line(
    provider: &dyn DnsProvider,
    config: &CloudflareConfig,
    line_type: LineType,
    mut addresses: Vec<String>,
) -> LineReport {
    let subdomain = line_type.subdomain();
    let record_name = config.record_name(&subdomain);
    let fqdn = config.fqdn(&subdomain);

    info!("Processing line {} -> {}", line_type, fqdn);

    addresses.truncate(config.max_records_per_line);

    let mut report = LineReport {
        line_type,
        fqdn,
        retained: addresses,
        deleted: 0,
        created: 0,
        failures: Vec::new(),
        read_error: None,
    };

    let existing = match provider.list_records(&report.fqdn, &config.record_type).await {
        Ok(existing) => existing,
        Err(e) => {
            error!("Failed to read DNS records for {}: {}", report.fqdn, e);
            report.read_error = Some(e.to_string());
            return report;
        }
    };
    debug!("{} existing record(s) for {}", existing.len(), report.fqdn);

    for record in &existing.records {
        match provider.delete_record(&record.id).await {
            Ok(()) => {
                info!("Deleted record: {} -> {}", record.name, record.content);
                report.deleted += 1;
            }
            Err(e) => {
                let e = Error::partial_write(format!(
                    "delete {} ({}): {}",
                    record.id, record.content, e
                ));
                warn!("{}", e);
                report.failures.push(e.to_string());
            }
        }
    }

    for address in &report.retained {
        let new_record = NewRecord::for_address(&record_name, address, config.ttl, config.proxied);
        match provider.create_record(&new_record).await {
            Ok(()) => {
                info!(
                    "Added record: {} -> {} ({})",
                    report.fqdn, address, new_record.record_type
                );
                report.created += 1;
            }
            Err(e) => {
                let e = Error::partial_write(format!(
                    "create {} -> {}: {}",
                    report.fqdn, address, e
                ));
                warn!("{}", e);
                report.failures.push(e.to_string());
            }
        }
    }

    report
}
