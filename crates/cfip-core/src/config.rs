//! Configuration types for the collector
//!
//! Configuration is built once at startup and passed by reference into the
//! pipeline; nothing in the core reads the process environment.
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. TOML file (`[links]`, `[settings]`, `[cloudflare]`)
//! 3. Environment overlay, supplied as explicit `(key, value)` pairs
//!
//! ```toml
//! [links]
//! cf1 = "https://example.com/speedtest"
//!
//! [settings]
//! include_lines = "电信, 联通, ipv6"
//!
//! [cloudflare]
//! enabled = true
//! api_token = "..."
//! zone_id = "..."
//! domain = "example.com"
//! ```

use crate::error::{Error, Result};
use crate::model::LineTypeFilter;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Required length of a Cloudflare API token
pub const API_TOKEN_LEN: usize = 40;

/// Required length of a Cloudflare zone ID
pub const ZONE_ID_LEN: usize = 32;

/// Main collector configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Source name -> page URL
    #[serde(default)]
    pub links: BTreeMap<String, String>,

    /// Fetch and output settings
    #[serde(default)]
    pub settings: Settings,

    /// DNS sync settings
    #[serde(default)]
    pub cloudflare: CloudflareConfig,
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file.
    ///
    /// A missing file is only an error when `required` is set; otherwise the
    /// defaults are returned and the environment overlay has to supply sources.
    pub fn load_file(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                return Err(Error::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply environment overrides.
    ///
    /// Setting any of `CLOUDFLARE_API_TOKEN`, `CLOUDFLARE_ZONE_ID` or
    /// `CLOUDFLARE_DOMAIN` turns DNS sync on; an explicit `CLOUDFLARE_ENABLE`
    /// still wins.
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut secrets_present = false;
        let mut explicit_enable = None;

        for (key, value) in vars {
            let key = key.as_ref();
            let value: String = value.into();
            match key {
                "USER_AGENT" => self.settings.user_agent = Some(value),
                "INCLUDE_LINES" => self.settings.include_lines = Some(value),
                "TIMEOUT" => self.settings.timeout_secs = parse_number(key, &value)?,
                "OUTPUT_DIR" => self.settings.output_dir = value,
                "CLOUDFLARE_API_TOKEN" => {
                    self.cloudflare.api_token = value;
                    secrets_present = true;
                }
                "CLOUDFLARE_ZONE_ID" => {
                    self.cloudflare.zone_id = value;
                    secrets_present = true;
                }
                "CLOUDFLARE_DOMAIN" => {
                    self.cloudflare.domain = value;
                    secrets_present = true;
                }
                "CLOUDFLARE_ENABLE" => explicit_enable = Some(parse_bool(key, &value)?),
                "CLOUDFLARE_RECORD_NAME" => self.cloudflare.record_name_base = value,
                "CLOUDFLARE_RECORD_TYPE" => self.cloudflare.record_type = value,
                "CLOUDFLARE_TTL" => self.cloudflare.ttl = parse_number(key, &value)?,
                "CLOUDFLARE_PROXIED" => self.cloudflare.proxied = parse_bool(key, &value)?,
                "CLOUDFLARE_MAX_RECORDS_PER_LINE" => {
                    self.cloudflare.max_records_per_line = parse_number(key, &value)?
                }
                _ => {
                    if let Some(n) = key.strip_prefix("CF")
                        && !n.is_empty()
                        && n.chars().all(|c| c.is_ascii_digit())
                    {
                        self.links.insert(format!("cf{}", n), value);
                    }
                }
            }
        }

        if secrets_present {
            self.cloudflare.enabled = true;
        }
        if let Some(enabled) = explicit_enable {
            self.cloudflare.enabled = enabled;
        }

        Ok(())
    }

    /// Sources with a non-blank URL, in name order
    pub fn sources(&self) -> Vec<Source> {
        self.links
            .iter()
            .filter_map(|(name, url)| {
                let url = url.trim();
                if url.is_empty() {
                    tracing::info!("Skipping empty link: {}", name);
                    None
                } else {
                    Some(Source::new(name.clone(), url))
                }
            })
            .collect()
    }

    /// Build the line type filter from `include_lines`
    pub fn line_filter(&self) -> LineTypeFilter {
        match self.settings.include_lines.as_deref() {
            Some(setting) => LineTypeFilter::parse(setting),
            None => LineTypeFilter::All,
        }
    }

    /// Validate the configuration
    ///
    /// Only the absence of sources is fatal here; Cloudflare settings are
    /// checked by the reconciler so a bad token never blocks extraction.
    pub fn validate(&self) -> Result<()> {
        if self.links.values().all(|url| url.trim().is_empty()) {
            return Err(Error::config("No input sources configured"));
        }
        if self.settings.timeout_secs == 0 {
            return Err(Error::config("Fetch timeout must be > 0"));
        }
        Ok(())
    }
}

/// A named page to scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Name used for the per-source output file
    pub name: String,
    /// Page URL
    pub url: String,
}

impl Source {
    /// Create a new source
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Fetch and output settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Overrides the default browser identity on page fetches
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Comma/semicolon/whitespace separated line types to keep
    #[serde(default)]
    pub include_lines: Option<String>,

    /// Page fetch timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Directory for the output files
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Settings {
    /// Page fetch timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agent: None,
            include_lines: None,
            timeout_secs: default_timeout_secs(),
            output_dir: default_output_dir(),
        }
    }
}

/// Cloudflare DNS sync configuration
#[derive(Clone, Deserialize)]
pub struct CloudflareConfig {
    /// Whether DNS sync runs at all
    #[serde(default, alias = "enable")]
    pub enabled: bool,

    /// API token (40 characters)
    #[serde(default)]
    pub api_token: String,

    /// Zone ID (32 characters)
    #[serde(default)]
    pub zone_id: String,

    /// Zone apex, e.g. "example.com"
    #[serde(default)]
    pub domain: String,

    /// Record names are `{record_name_base}-{subdomain}`
    #[serde(default = "default_record_name_base", alias = "record_name")]
    pub record_name_base: String,

    /// Record type used to look up existing records
    #[serde(default = "default_record_type")]
    pub record_type: String,

    /// TTL for created records (1 = automatic)
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Whether created records are proxied
    #[serde(default)]
    pub proxied: bool,

    /// Upper bound on records written per line type
    #[serde(default = "default_max_records_per_line")]
    pub max_records_per_line: usize,
}

impl CloudflareConfig {
    /// Check credentials and IDs before any API call.
    ///
    /// Checks run in a fixed order and stop at the first failure.
    pub fn validate(&self) -> Result<()> {
        if self.api_token.len() != API_TOKEN_LEN {
            return Err(Error::validation(format!(
                "API token length is {} characters, expected {}",
                self.api_token.len(),
                API_TOKEN_LEN
            )));
        }

        if self.zone_id.len() != ZONE_ID_LEN {
            return Err(Error::validation(format!(
                "Zone ID length is {} characters, expected {}",
                self.zone_id.len(),
                ZONE_ID_LEN
            )));
        }

        let mut missing = Vec::new();
        if self.api_token.is_empty() {
            missing.push("api_token");
        }
        if self.zone_id.is_empty() {
            missing.push("zone_id");
        }
        if self.domain.is_empty() {
            missing.push("domain");
        }
        if !missing.is_empty() {
            return Err(Error::validation(format!(
                "Cloudflare configuration incomplete, missing: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }

    /// Record name (without the zone) for a subdomain token
    pub fn record_name(&self, subdomain: &str) -> String {
        format!("{}-{}", self.record_name_base, subdomain)
    }

    /// Fully-qualified record name for a subdomain token
    pub fn fqdn(&self, subdomain: &str) -> String {
        format!("{}.{}", self.record_name(subdomain), self.domain)
    }
}

impl Default for CloudflareConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_token: String::new(),
            zone_id: String::new(),
            domain: String::new(),
            record_name_base: default_record_name_base(),
            record_type: default_record_type(),
            ttl: default_ttl(),
            proxied: false,
            max_records_per_line: default_max_records_per_line(),
        }
    }
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareConfig")
            .field("enabled", &self.enabled)
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("domain", &self.domain)
            .field("record_name_base", &self.record_name_base)
            .field("record_type", &self.record_type)
            .field("ttl", &self.ttl)
            .field("proxied", &self.proxied)
            .field("max_records_per_line", &self.max_records_per_line)
            .finish()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("{} must be a number, got '{}'", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Ok(true),
        "0" | "no" | "false" | "off" => Ok(false),
        _ => Err(Error::config(format!(
            "{} must be a boolean, got '{}'",
            key, value
        ))),
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_record_name_base() -> String {
    "cf".to_string()
}

fn default_record_type() -> String {
    "A".to_string()
}

fn default_ttl() -> u32 {
    1
}

fn default_max_records_per_line() -> usize {
    5
}
