// # Page Fetcher Trait
//
// Defines the interface for retrieving the raw text of a source page.
//
// ## Implementations
//
// - HTTP: `cfip-fetch-http` crate
//
// ## Usage
//
// ```rust,ignore
// use cfip_core::PageFetcher;
//
// #[tokio::main]
// async fn main() -> cfip_core::Result<()> {
//     let fetcher = /* PageFetcher implementation */;
//
//     let html = fetcher.fetch("https://example.com/speedtest").await?;
//     println!("{} bytes", html.len());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for page fetcher implementations
///
/// A fetcher makes a single attempt per call. It does not retry, cache, or
/// interpret the page; extraction belongs to [`crate::extract`].
///
/// # Errors
///
/// Transport failures and non-2xx statuses are reported as
/// [`crate::Error::Network`]. The engine logs them and treats the source as
/// empty; they never abort a run.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the body of `url` as text
    async fn fetch(&self, url: &str) -> Result<String, crate::Error>;
}
