// # cfip - Edge IP collector
//
// Thin integration layer: loads configuration, initializes logging and the
// runtime, wires the fetcher and DNS provider into `CollectorEngine`, and maps
// the outcome to an exit code. All collection and DNS logic lives in cfip-core.
//
// ## Configuration
//
// Settings come from a TOML file overlaid with environment variables.
//
// ### Process
// - `CFIP_CONFIG`: Path to the TOML config file (default `config.toml`;
//   a missing default file is fine, a missing explicit file is an error)
// - `CFIP_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `CFIP_MODE`: `dry-run` to log DNS writes instead of sending them
//
// ### Sources and extraction
// - `CF1`, `CF2`, ...: Source page URLs (named `cf1`, `cf2`, ...)
// - `USER_AGENT`, `INCLUDE_LINES`, `TIMEOUT`, `OUTPUT_DIR`
//
// ### DNS sync
// - `CLOUDFLARE_API_TOKEN`, `CLOUDFLARE_ZONE_ID`, `CLOUDFLARE_DOMAIN`
// - `CLOUDFLARE_ENABLE`, `CLOUDFLARE_RECORD_NAME`, `CLOUDFLARE_RECORD_TYPE`,
//   `CLOUDFLARE_TTL`, `CLOUDFLARE_PROXIED`, `CLOUDFLARE_MAX_RECORDS_PER_LINE`
//
// ## Example
//
// ```bash
// export CF1=https://example.net/speedtest
// export CLOUDFLARE_API_TOKEN=your_token
// export CLOUDFLARE_ZONE_ID=your_zone_id
// export CLOUDFLARE_DOMAIN=example.com
//
// cfip
// ```

use anyhow::{Context, Result};
use cfip_core::{AppConfig, CollectorEngine, ReconcileStatus, RunSummary};
use cfip_fetch_http::HttpPageFetcher;
use cfip_provider_cloudflare::CloudflareProvider;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Default config file, used when `CFIP_CONFIG` is unset
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Exit codes for different termination scenarios
///
/// - 0: Run completed (individual sources or records may still have failed)
/// - 1: Configuration or startup error
/// - 2: Whole run aborted (DNS token or zone verification failed)
#[derive(Debug, Clone, Copy)]
enum CfipExitCode {
    /// Run completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Run aborted
    RuntimeError = 2,
}

impl From<CfipExitCode> for ExitCode {
    fn from(code: CfipExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Process-level options, read before anything else
struct Options {
    config_path: PathBuf,
    config_required: bool,
    log_level: Level,
    dry_run: bool,
}

impl Options {
    fn from_env() -> Result<Self> {
        let (config_path, config_required) = match env::var("CFIP_CONFIG") {
            Ok(path) if !path.trim().is_empty() => (PathBuf::from(path.trim()), true),
            _ => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        let log_level = env::var("CFIP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_level = match log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            other => anyhow::bail!(
                "CFIP_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                other
            ),
        };

        let dry_run = env::var("CFIP_MODE")
            .unwrap_or_default()
            .eq_ignore_ascii_case("dry-run");

        Ok(Self {
            config_path,
            config_required,
            log_level,
            dry_run,
        })
    }
}

/// Load the config file, overlay the process environment, and validate
fn load_config(options: &Options) -> Result<AppConfig> {
    let mut config = AppConfig::load_file(&options.config_path, options.config_required)
        .with_context(|| format!("loading {}", options.config_path.display()))?;
    config.apply_env(env::vars())?;
    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    let options = match Options::from_env() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return CfipExitCode::ConfigError.into();
        }
    };

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(options.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CfipExitCode::ConfigError.into();
    }

    let config = match load_config(&options) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return CfipExitCode::ConfigError.into();
        }
    };

    info!("Starting cfip");
    info!(
        "Configuration loaded: {} source(s), DNS sync {}",
        config.sources().len(),
        if config.cloudflare.enabled { "enabled" } else { "disabled" }
    );

    // Sources are processed one at a time; a single-threaded runtime is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CfipExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run(&config, options.dry_run).await {
            Ok(summary) => {
                report(&summary);
                CfipExitCode::Success
            }
            Err(e) => {
                error!("Run aborted: {:#}", e);
                CfipExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Wire the components and run the pipeline once
async fn run(config: &AppConfig, dry_run: bool) -> Result<RunSummary> {
    let fetcher = HttpPageFetcher::from_settings(&config.settings)?;
    let mut engine = CollectorEngine::new(Box::new(fetcher), config);

    if config.cloudflare.enabled {
        // Without a provider the engine reports the settings problem and
        // turns sync off for this run
        match CloudflareProvider::from_config(&config.cloudflare, dry_run) {
            Ok(provider) => engine = engine.with_provider(Box::new(provider)),
            Err(e) => warn!("Cloudflare provider unavailable: {}", e),
        }
    } else {
        info!("Cloudflare sync disabled");
    }

    Ok(engine.run(&config.sources()).await?)
}

/// Log the end-of-run summary
fn report(summary: &RunSummary) {
    let failed = summary.sources.iter().filter(|s| s.error.is_some()).count();
    info!(
        "Done: {} source(s) processed ({} failed), {} unique IP(s)",
        summary.sources.len(),
        failed,
        summary.merged.len()
    );

    match &summary.reconcile {
        Some(reconcile) if matches!(reconcile.status, ReconcileStatus::Invalid(_)) => {
            warn!("DNS sync was not attempted; see the log above");
        }
        Some(reconcile) if !reconcile.is_clean() => {
            warn!("DNS sync finished with errors; see the log above");
        }
        _ => {}
    }
}
