// tests/pipeline_e2e.rs
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rss_daily_digest::history::ReportStore;
use rss_daily_digest::ingest::config::{GlobalSettings, SourceConfig, SourcesConfig};
use rss_daily_digest::ingest::providers::RssProvider;
use rss_daily_digest::ingest::types::SourceProvider;
use rss_daily_digest::notify::Notifier;
use rss_daily_digest::pipeline::{DailyProcessor, TEST_MESSAGE};
use rss_daily_digest::{parse_word_groups, DailyReport};

const SAMPLE_XML: &str = include_str!("fixtures/sample_rss.xml");

#[derive(Default)]
struct RecordingNotifier {
    texts: Mutex<Vec<String>>,
    reports: Mutex<Vec<DailyReport>>,
    fail_reports: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, text: &str) -> Result<()> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }
    async fn send_report(&self, report: &DailyReport) -> Result<()> {
        if self.fail_reports {
            bail!("webhook down");
        }
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
    fn name(&self) -> &str {
        "recording"
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap()
}

fn config() -> SourcesConfig {
    SourcesConfig {
        sources: vec![SourceConfig {
            name: "Tech Daily".into(),
            url: "https://tech.example.com/feed".into(),
            enabled: true,
            max_items: 20,
            keywords: vec!["AI".into(), "芯片".into()],
            exclude_keywords: vec!["广告".into()],
        }],
        global_settings: GlobalSettings {
            request_delay_ms: 0,
            ..GlobalSettings::default()
        },
    }
}

fn processor() -> DailyProcessor {
    let providers: Vec<Box<dyn SourceProvider>> =
        vec![Box::new(RssProvider::from_fixture_str("Tech Daily", SAMPLE_XML))];
    DailyProcessor::new(config(), providers)
        .with_word_groups(parse_word_groups("AI\n\n芯片\n+发布\n\n区块链\n"))
}

#[tokio::test]
async fn full_run_filters_reports_saves_and_sends() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ReportStore::new(tmp.path());
    let notifier = RecordingNotifier::default();

    let outcome = processor()
        .with_store(store.clone())
        .run(&notifier, now())
        .await
        .expect("run ok");

    // 4 parsed; ChatGPT entry is too old; the ad is excluded.
    assert_eq!(outcome.fetched, 4);
    assert_eq!(outcome.kept, 2);
    assert_eq!(outcome.report.statistics.total_articles, 2);
    let titles: Vec<&str> = outcome.report.sections[0]
        .articles
        .iter()
        .map(|a| a.title.as_str())
        .collect();
    assert_eq!(titles, vec!["OpenAI 发布 GPT-5 模型", "芯片巨头发布新一代处理器"]);

    // Trend: every group gets a header, the ad still counts there (no ruleset on this path).
    assert!(outcome.trend.starts_with("AI (3)\n"), "{}", outcome.trend);
    assert!(outcome.trend.contains("芯片 | +发布 (1)\n"));
    assert!(outcome.trend.contains("区块链 (0)\n"));

    let saved = outcome.saved.expect("saved path");
    assert!(saved.ends_with("daily_report_20250102.json"));
    assert_eq!(
        store.statistics(now().date_naive()).unwrap().unwrap().total_articles,
        2
    );

    assert_eq!(notifier.reports.lock().unwrap().len(), 1);
    assert_eq!(notifier.texts.lock().unwrap().as_slice(), [outcome.trend]);
}

#[tokio::test]
async fn nothing_recent_still_sends_empty_report() {
    let notifier = RecordingNotifier::default();
    let later = now() + chrono::Duration::days(30);
    let outcome = processor().run(&notifier, later).await.unwrap();

    assert!(outcome.report.is_empty());
    assert_eq!(outcome.report.summary, "今日暂无重要资讯。");
    assert_eq!(notifier.reports.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_delivery_fails_the_run() {
    let notifier = RecordingNotifier {
        fail_reports: true,
        ..Default::default()
    };
    assert!(processor().run(&notifier, now()).await.is_err());
}

#[tokio::test]
async fn connection_test_sends_fixed_message() {
    let notifier = RecordingNotifier::default();
    processor().test_connection(&notifier).await.unwrap();
    assert_eq!(notifier.texts.lock().unwrap().as_slice(), [TEST_MESSAGE.to_string()]);
}

#[test]
fn stats_without_store_is_none() {
    assert!(processor().stats(now().date_naive()).unwrap().is_none());
}
