// # cfip-core
//
// Core library for collecting edge IP addresses from speed-test pages and
// publishing the best of them to DNS, one subdomain per carrier line.
//
// ## Architecture Overview
//
// - **PageFetcher**: Trait for retrieving source pages
// - **extract**: Parses page text into `IpRecord`s, with line filtering
// - **aggregate**: Merges sources into a deduplicated, ranked master list
// - **DnsProvider**: Trait for reading and replacing record sets via a provider API
// - **reconcile**: Maps lines to subdomains and replaces each record set
// - **CollectorEngine**: Runs fetch → extract → aggregate → reconcile once
//
// ## Design Principles
//
// 1. **Explicit configuration**: `AppConfig` is built once and passed in; the
//    core never reads the environment
// 2. **Plugin seams**: Fetching and DNS access sit behind traits so the
//    pipeline is testable without a network
// 3. **Partial failure**: One bad source, line, or record never aborts a run

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod model;
pub mod output;
pub mod reconcile;
pub mod traits;

// Re-export core types for convenience
pub use config::{AppConfig, CloudflareConfig, Settings, Source};
pub use engine::{CollectorEngine, RunSummary, SourceReport};
pub use error::{Error, Result};
pub use model::{IpRecord, LineType, LineTypeFilter};
pub use output::OutputWriter;
pub use reconcile::{LineReport, ReconcileReport, ReconcileStatus, reconcile};
pub use traits::{DnsProvider, PageFetcher};
