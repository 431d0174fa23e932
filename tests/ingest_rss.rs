// tests/ingest_rss.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rss_daily_digest::ingest::providers::RssProvider;
use rss_daily_digest::ingest::types::SourceProvider;
use rss_daily_digest::ingest::{fetch_all, filter_recent};
use rss_daily_digest::filter::remove_duplicates;
use rss_daily_digest::Item;

const SAMPLE_XML: &str = include_str!("fixtures/sample_rss.xml");

struct FailingProvider;

#[async_trait]
impl SourceProvider for FailingProvider {
    async fn fetch_latest(&self) -> Result<Vec<Item>> {
        Err(anyhow!("feed down"))
    }
    fn name(&self) -> &str {
        "failing"
    }
}

struct StaticProvider(Vec<Item>);

#[async_trait]
impl SourceProvider for StaticProvider {
    async fn fetch_latest(&self) -> Result<Vec<Item>> {
        Ok(self.0.clone())
    }
    fn name(&self) -> &str {
        "static"
    }
}

#[tokio::test]
async fn fixture_parses_into_items() {
    let provider = RssProvider::from_fixture_str("Tech Daily", SAMPLE_XML);
    let items = provider.fetch_latest().await.expect("fixture parse ok");

    assert_eq!(items.len(), 4, "entry without a title is skipped");
    assert!(items.iter().all(|i| i.source == "Tech Daily"));
    assert_eq!(items[0].title, "OpenAI 发布 GPT-5 模型");
    assert_eq!(items[0].summary, "OpenAI 发布了最新的 AI 模型 性能大幅提升。");
    assert_eq!(
        items[0].published,
        Utc.with_ymd_and_hms(2025, 1, 2, 9, 30, 0).unwrap()
    );
    assert_eq!(provider.name(), "Tech Daily");
}

#[tokio::test]
async fn provider_errors_are_not_fatal_and_output_is_newest_first() {
    let late = Item::new(
        "late",
        "l",
        "",
        "static",
        Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap(),
    );
    let providers: Vec<Box<dyn SourceProvider>> = vec![
        Box::new(RssProvider::from_fixture_str("Tech Daily", SAMPLE_XML)),
        Box::new(FailingProvider),
        Box::new(StaticProvider(vec![late.clone()])),
    ];
    let all = fetch_all(&providers).await;
    assert_eq!(all.len(), 5);
    assert_eq!(all[0], late);
    assert!(all.windows(2).all(|w| w[0].published >= w[1].published));
}

#[tokio::test]
async fn recent_window_drops_old_entries() {
    let provider = RssProvider::from_fixture_str("Tech Daily", SAMPLE_XML);
    let items = provider.fetch_latest().await.unwrap();
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap();
    let recent = filter_recent(&items, 24, now);
    assert_eq!(recent.len(), 3);
    assert!(recent.iter().all(|i| !i.title.contains("ChatGPT")));
}

#[tokio::test]
async fn titles_keep_trailing_punctuation_and_stay_distinct() {
    let xml = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Q</title>
  <item><title>Is AI safe?</title><link>https://q.example.com/1</link></item>
  <item><title>Is AI safe!</title><link>https://q.example.com/2</link></item>
  <item><title>Yahoo!</title><link>https://q.example.com/3</link></item>
</channel></rss>"#;
    let items = RssProvider::from_fixture_str("Q", xml).fetch_latest().await.unwrap();
    let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Is AI safe?", "Is AI safe!", "Yahoo!"]);
    assert_eq!(remove_duplicates(&items).len(), 3);
}
