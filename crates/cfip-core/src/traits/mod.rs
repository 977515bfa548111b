//! Core traits for the collector
//!
//! This module defines the abstract interfaces that implementations must follow.
//!
//! - [`PageFetcher`]: Retrieve source pages
//! - [`DnsProvider`]: Read and replace DNS record sets via a provider API

pub mod dns_provider;
pub mod page_fetcher;

pub use dns_provider::{
    DnsProvider, DnsRecordSet, NewRecord, RemoteRecord, TokenResource, TokenStatus, ZoneInfo,
};
pub use page_fetcher::PageFetcher;
