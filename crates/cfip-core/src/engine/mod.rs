//! Collector engine
//!
//! The CollectorEngine is responsible for:
//! - Fetching each source page via PageFetcher
//! - Extracting records and writing the per-source file
//! - Aggregating into the merged list and writing it
//! - Handing the merged list to the DNS reconciler
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   html    ┌───────────┐  records  ┌────────────┐
//! │ PageFetcher │─────────► │ Extractor │─────────► │ Aggregator │
//! └─────────────┘           └───────────┘           └────────────┘
//!                                 │                       │
//!                                 ▼                       ▼
//!                          {source}.txt           all_cf_ip.txt
//!                                                         │
//!                                                         ▼
//!                                               ┌──────────────────┐
//!                                               │ DNS reconciler   │
//!                                               │ (DnsProvider)    │
//!                                               └──────────────────┘
//! ```
//!
//! ## Failure Policy
//!
//! Sources are processed one at a time. A source that cannot be fetched or
//! yields nothing contributes an empty list; the run continues. Output file
//! errors are logged and do not stop the run. Invalid DNS settings turn sync
//! off for the run. The run only fails when there are no sources or when DNS
//! token or zone verification fails.

use crate::aggregate::aggregate;
use crate::config::{AppConfig, CloudflareConfig, Source};
use crate::error::{Error, Result};
use crate::extract::extract_page;
use crate::model::{IpRecord, LineTypeFilter};
use crate::output::OutputWriter;
use crate::reconcile::{ReconcileReport, reconcile};
use crate::traits::{DnsProvider, PageFetcher};
use tracing::{debug, error, info, warn};

/// What one source contributed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    /// Source name
    pub name: String,
    /// Number of records extracted (after filtering)
    pub records: usize,
    /// Fetch error, if the page could not be retrieved
    pub error: Option<String>,
}

/// Summary of a full run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Per-source results, in processing order
    pub sources: Vec<SourceReport>,
    /// Merged, deduplicated, sorted records
    pub merged: Vec<IpRecord>,
    /// DNS sync result; `None` when there was nothing to sync
    pub reconcile: Option<ReconcileReport>,
}

/// Core collector engine
///
/// Drives the whole pipeline once per [`CollectorEngine::run`] call. All work
/// happens sequentially on the calling task.
pub struct CollectorEngine {
    /// Page fetcher for source URLs
    fetcher: Box<dyn PageFetcher>,

    /// DNS provider used by the reconciler, if one was attached
    provider: Option<Box<dyn DnsProvider>>,

    /// Writer for the output files
    output: OutputWriter,

    /// Line types kept by the extractor
    filter: LineTypeFilter,

    /// DNS sync settings
    cloudflare: CloudflareConfig,
}

impl CollectorEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `fetcher`: Page fetcher implementation
    /// - `config`: Collector configuration
    ///
    /// Attach a DNS provider with [`CollectorEngine::with_provider`]; without
    /// one the run stops after writing the merged list.
    pub fn new(fetcher: Box<dyn PageFetcher>, config: &AppConfig) -> Self {
        let filter = config.line_filter();
        if filter.is_all() {
            info!("No line filter configured, extracting all lines");
        } else {
            info!("Extracting lines: {}", filter.describe());
        }

        Self {
            fetcher,
            provider: None,
            output: OutputWriter::new(&config.settings.output_dir),
            filter,
            cloudflare: config.cloudflare.clone(),
        }
    }

    /// Attach the DNS provider used for sync
    pub fn with_provider(mut self, provider: Box<dyn DnsProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Run the pipeline over `sources`
    ///
    /// # Returns
    ///
    /// - `Ok(RunSummary)`: the run completed (possibly with per-source or
    ///   per-record failures, see the summary)
    /// - `Err(Error)`: no sources, or DNS token/zone verification failed
    pub async fn run(&self, sources: &[Source]) -> Result<RunSummary> {
        if sources.is_empty() {
            return Err(Error::config("No input sources configured"));
        }

        let mut reports = Vec::with_capacity(sources.len());
        let mut collected = Vec::with_capacity(sources.len());

        for source in sources {
            let (records, report) = self.collect_source(source).await;
            reports.push(report);
            if !records.is_empty() {
                collected.push(records);
            }
        }

        if collected.is_empty() {
            info!("No IP addresses found in any source");
            return Ok(RunSummary {
                sources: reports,
                merged: Vec::new(),
                reconcile: None,
            });
        }

        let merged = aggregate(collected);
        info!("Merged {} unique IP address(es)", merged.len());

        if let Err(e) = self.output.write_merged(&merged).await {
            error!("Failed to write merged list: {}", e);
        }

        let report = match self.provider.as_deref() {
            Some(provider) => reconcile(provider, &merged, &self.cloudflare).await?,
            None if self.cloudflare.enabled => {
                let reason = match self.cloudflare.validate() {
                    Err(e) => e.to_string(),
                    Ok(()) => "DNS sync is enabled but no provider is attached".to_string(),
                };
                warn!("Cloudflare DNS sync disabled for this run: {}", reason);
                ReconcileReport::invalid(reason)
            }
            None => {
                info!("No DNS provider attached, skipping DNS sync");
                ReconcileReport::skipped()
            }
        };
        for line in &report.lines {
            if line.is_clean() {
                info!(
                    "{}: {} deleted, {} created",
                    line.fqdn, line.deleted, line.created
                );
            } else {
                warn!(
                    "{}: {} deleted, {} created, {} failure(s){}",
                    line.fqdn,
                    line.deleted,
                    line.created,
                    line.failures.len(),
                    line.read_error
                        .as_deref()
                        .map(|e| format!(", read failed: {}", e))
                        .unwrap_or_default()
                );
            }
        }

        Ok(RunSummary {
            sources: reports,
            merged,
            reconcile: Some(report),
        })
    }

    /// Fetch and extract one source, writing its file when non-empty
    async fn collect_source(&self, source: &Source) -> (Vec<IpRecord>, SourceReport) {
        info!("Processing source {}: {}", source.name, source.url);

        let html = match self.fetcher.fetch(&source.url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to fetch {}: {}, skipping", source.url, e);
                return (
                    Vec::new(),
                    SourceReport {
                        name: source.name.clone(),
                        records: 0,
                        error: Some(e.to_string()),
                    },
                );
            }
        };
        debug!("Fetched {} bytes from {}", html.len(), source.url);

        let records = extract_page(&html, &self.filter);
        if records.is_empty() {
            info!("No IP addresses found in {}", source.name);
        } else {
            info!("Found {} IP address(es) in {}", records.len(), source.name);
            if let Err(e) = self.output.write_source(&source.name, &records).await {
                error!("Failed to write output for {}: {}", source.name, e);
            }
        }

        let report = SourceReport {
            name: source.name.clone(),
            records: records.len(),
            error: None,
        };
        (records, report)
    }
}
