//! Contract Test: End-to-End Pipeline
//!
//! Constraints verified:
//! - Sources are fetched once each, in order
//! - A failing source contributes nothing and does not stop the run
//! - Per-source and merged files are written in `address#line` format
//! - The merged list is deduplicated and ranked before DNS sync
//! - No sources is a whole-run error; verification failure aborts the run
//! - Invalid DNS settings only turn sync off; the run still completes

mod common;

use cfip_core::config::Source;
use cfip_core::{AppConfig, CollectorEngine, Error, ReconcileStatus};
use common::*;
use tempfile::tempdir;

fn config_in(dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.settings.output_dir = dir.join("output").to_string_lossy().into_owned();
    config
}

#[tokio::test]
async fn merges_sources_and_writes_files() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());

    let fetcher = MockPageFetcher::new()
        .with_page("https://a.test/", &page(&[row(1, "电信", "1.1.1.1")]))
        .with_page(
            "https://b.test/",
            &page(&[row(1, "电信", "1.1.1.1"), row(2, "联通", "2.2.2.2")]),
        );
    let fetch_log = fetcher.fetch_log();

    let engine = CollectorEngine::new(Box::new(fetcher), &config)
        .with_provider(Box::new(MockDnsProvider::new()));
    let sources = vec![
        Source::new("cf1", "https://a.test/"),
        Source::new("cf2", "https://b.test/"),
    ];

    let summary = engine.run(&sources).await.unwrap();

    let merged: Vec<String> = summary.merged.iter().map(|r| r.key()).collect();
    assert_eq!(merged, vec!["1.1.1.1#电信", "2.2.2.2#联通"]);
    assert_eq!(
        *fetch_log.lock().unwrap(),
        vec!["https://a.test/".to_string(), "https://b.test/".to_string()]
    );

    let out = dir.path().join("output");
    assert_eq!(
        std::fs::read_to_string(out.join("cf1.txt")).unwrap(),
        "1.1.1.1#电信\n"
    );
    assert_eq!(
        std::fs::read_to_string(out.join("cf2.txt")).unwrap(),
        "1.1.1.1#电信\n2.2.2.2#联通\n"
    );
    assert_eq!(
        std::fs::read_to_string(out.join("all_cf_ip.txt")).unwrap(),
        "1.1.1.1#电信\n2.2.2.2#联通\n"
    );

    let reconcile = summary.reconcile.unwrap();
    assert_eq!(reconcile.status, ReconcileStatus::Skipped);
}

#[tokio::test]
async fn failing_source_is_skipped() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());

    let fetcher = MockPageFetcher::new()
        .with_page("https://ok.test/", &page(&[row(1, "移动", "3.3.3.3")]));
    let engine = CollectorEngine::new(Box::new(fetcher), &config)
        .with_provider(Box::new(MockDnsProvider::new()));

    let summary = engine
        .run(&[
            Source::new("down", "https://down.test/"),
            Source::new("ok", "https://ok.test/"),
        ])
        .await
        .unwrap();

    assert_eq!(summary.sources.len(), 2);
    assert!(summary.sources[0].error.as_deref().unwrap().contains("404"));
    assert_eq!(summary.sources[1].records, 1);
    assert_eq!(summary.merged.len(), 1);
    assert!(!dir.path().join("output").join("down.txt").exists());
}

#[tokio::test]
async fn empty_pages_skip_merge_and_sync() {
    let dir = tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.cloudflare = valid_cloudflare();

    let fetcher = MockPageFetcher::new().with_page("https://a.test/", "<p>maintenance</p>");
    let provider = MockDnsProvider::new();
    let calls = provider.call_log();
    let engine = CollectorEngine::new(Box::new(fetcher), &config)
        .with_provider(Box::new(provider));

    let summary = engine.run(&[Source::new("cf1", "https://a.test/")]).await.unwrap();

    assert!(summary.merged.is_empty());
    assert!(summary.reconcile.is_none());
    assert!(calls.lock().unwrap().is_empty());
    assert!(!dir.path().join("output").join("all_cf_ip.txt").exists());
}

#[tokio::test]
async fn include_lines_filters_every_source() {
    let dir = tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.settings.include_lines = Some("电信,IPV6".to_string());

    let fetcher = MockPageFetcher::new().with_page(
        "https://a.test/",
        &page(&[
            row(1, "电信", "1.1.1.1"),
            row(2, "联通", "2.2.2.2"),
            row(3, "移动", "3.3.3.3"),
            row(4, "多线", "4.4.4.4"),
            row(5, "IPV6", "2606:4700::1"),
        ]),
    );
    let engine = CollectorEngine::new(Box::new(fetcher), &config)
        .with_provider(Box::new(MockDnsProvider::new()));

    let summary = engine.run(&[Source::new("cf1", "https://a.test/")]).await.unwrap();

    let merged: Vec<String> = summary.merged.iter().map(|r| r.key()).collect();
    assert_eq!(merged, vec!["1.1.1.1#电信", "2606:4700::1#IPV6"]);
}

#[tokio::test]
async fn merged_list_drives_dns_sync() {
    let dir = tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.cloudflare = valid_cloudflare();
    config.cloudflare.max_records_per_line = 1;

    let fetcher = MockPageFetcher::new().with_page(
        "https://a.test/",
        &page(&[
            row(1, "电信", "10.0.0.1"),
            row(2, "电信", "9.0.0.1"),
            row(3, "联通", "2.2.2.2"),
        ]),
    );
    let provider = MockDnsProvider::new().with_existing("cf-CT.example.com", 2);
    let calls = provider.call_log();
    let engine = CollectorEngine::new(Box::new(fetcher), &config)
        .with_provider(Box::new(provider));

    let summary = engine.run(&[Source::new("cf1", "https://a.test/")]).await.unwrap();

    let report = summary.reconcile.unwrap();
    assert_eq!(report.status, ReconcileStatus::Completed);
    assert_eq!(report.lines[0].retained, vec!["9.0.0.1"]);

    let calls = calls.lock().unwrap().clone();
    assert_eq!(count(&calls, is_delete), 2);
    assert_eq!(count(&calls, is_create), 2);
}

#[tokio::test]
async fn verification_failure_aborts_run() {
    let dir = tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.cloudflare = valid_cloudflare();

    let fetcher = MockPageFetcher::new()
        .with_page("https://a.test/", &page(&[row(1, "电信", "1.1.1.1")]));
    let provider = MockDnsProvider::new().failing_token();
    let engine = CollectorEngine::new(Box::new(fetcher), &config)
        .with_provider(Box::new(provider));

    let result = engine.run(&[Source::new("cf1", "https://a.test/")]).await;

    assert!(result.is_err());
    // Extraction output is still written before sync is attempted
    assert!(dir.path().join("output").join("all_cf_ip.txt").exists());
}

#[tokio::test]
async fn no_sources_is_an_error() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let engine = CollectorEngine::new(Box::new(MockPageFetcher::new()), &config);

    let err = engine.run(&[]).await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn without_provider_sync_is_skipped_when_disabled() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());

    let fetcher = MockPageFetcher::new()
        .with_page("https://a.test/", &page(&[row(1, "电信", "1.1.1.1")]));
    let engine = CollectorEngine::new(Box::new(fetcher), &config);

    let summary = engine.run(&[Source::new("cf1", "https://a.test/")]).await.unwrap();

    assert_eq!(summary.reconcile.unwrap().status, ReconcileStatus::Skipped);
}

#[tokio::test]
async fn without_provider_bad_credentials_turn_sync_off() {
    let dir = tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.cloudflare = valid_cloudflare();
    config.cloudflare.api_token.clear();

    let fetcher = MockPageFetcher::new()
        .with_page("https://a.test/", &page(&[row(1, "电信", "1.1.1.1")]));
    let engine = CollectorEngine::new(Box::new(fetcher), &config);

    let summary = engine.run(&[Source::new("cf1", "https://a.test/")]).await.unwrap();

    assert_eq!(summary.merged.len(), 1);
    let report = summary.reconcile.unwrap();
    assert!(
        matches!(report.status, ReconcileStatus::Invalid(_)),
        "got {:?}",
        report.status
    );
    assert!(dir.path().join("output").join("cf1.txt").exists());
}

#[tokio::test]
async fn short_token_keeps_run_and_makes_no_calls() {
    let dir = tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.cloudflare = valid_cloudflare();
    config.cloudflare.api_token = "t".repeat(39);

    let fetcher = MockPageFetcher::new()
        .with_page("https://a.test/", &page(&[row(1, "电信", "1.1.1.1")]));
    let provider = MockDnsProvider::new();
    let calls = provider.call_log();
    let engine = CollectorEngine::new(Box::new(fetcher), &config)
        .with_provider(Box::new(provider));

    let summary = engine.run(&[Source::new("cf1", "https://a.test/")]).await.unwrap();

    assert_eq!(summary.sources[0].records, 1);
    let reason = "Validation failed: API token length is 39 characters, expected 40";
    assert_eq!(
        summary.reconcile.unwrap().status,
        ReconcileStatus::Invalid(reason.to_string())
    );
    assert!(calls.lock().unwrap().is_empty());
    assert!(dir.path().join("output").join("all_cf_ip.txt").exists());
}
