// # HTTP Page Fetcher
//
// This crate provides the `reqwest` implementation of `cfip_core::PageFetcher`.
//
// ## Behavior
//
// - One GET per call, no retries
// - Sends a browser `User-Agent`; speed-test pages commonly reject bare clients
// - Any non-2xx status is a `Network` error carrying the status
// - The body is returned as text, unparsed

use async_trait::async_trait;
use cfip_core::config::Settings;
use cfip_core::traits::PageFetcher;
use cfip_core::{Error, Result};
use std::time::Duration;

/// User-Agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Default timeout for one page request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP-based page fetcher
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    /// HTTP client (carries the timeout)
    client: reqwest::Client,

    /// User-Agent header value
    user_agent: String,
}

impl HttpPageFetcher {
    /// Create a new fetcher
    ///
    /// # Parameters
    ///
    /// - `user_agent`: User-Agent header (None = [`DEFAULT_USER_AGENT`])
    /// - `timeout`: Whole-request timeout
    pub fn new(user_agent: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            user_agent: user_agent
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        })
    }

    /// Create a fetcher from the collector settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.user_agent.clone(), settings.timeout())
    }

    /// The User-Agent this fetcher sends
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Default for HttpPageFetcher {
    fn default() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .unwrap_or_default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!("HTTP {} for {}", status, url)));
        }

        response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response from {}: {}", url, e)))
    }
}
