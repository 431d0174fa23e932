// src/ingest/providers/rss.rs
//! Generic RSS 2.0 provider: one instance per configured feed.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::ingest::config::SourceConfig;
use crate::ingest::normalize_text;
use crate::ingest::types::SourceProvider;
use crate::metrics as m;
use crate::types::Item;

pub const DEFAULT_MAX_ITEMS: usize = 20;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}
#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    let dt = OffsetDateTime::parse(ts.trim(), &Rfc2822).ok()?;
    DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), dt.nanosecond())
}

pub struct RssProvider {
    name: String,
    max_items: usize,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
        timeout: Duration,
    },
}

impl RssProvider {
    /// Provider over an in-memory feed body (tests, offline runs).
    pub fn from_fixture_str(name: impl Into<String>, xml: &str) -> Self {
        Self {
            name: name.into(),
            max_items: DEFAULT_MAX_ITEMS,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(name: impl Into<String>, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            max_items: DEFAULT_MAX_ITEMS,
            mode: Mode::Http {
                url: url.into(),
                client: reqwest::Client::new(),
                timeout,
            },
        }
    }

    pub fn from_source(src: &SourceConfig, timeout: Duration) -> Self {
        Self::from_url(src.name.clone(), src.url.clone(), timeout).with_max_items(src.max_items)
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Parse a feed body. Entries without a title or link are skipped; a missing or
    /// unparseable `pubDate` falls back to `fetched_at`.
    pub fn parse_items(&self, body: &str, fetched_at: DateTime<Utc>) -> Result<Vec<Item>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(body);
        let rss: Rss = from_str(&xml_clean)
            .with_context(|| format!("parsing rss xml for {}", self.name))?;

        let mut out = Vec::with_capacity(rss.channel.item.len().min(self.max_items));
        for it in rss.channel.item.into_iter().take(self.max_items) {
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            let link = it.link.as_deref().unwrap_or_default().trim().to_string();
            if title.is_empty() || link.is_empty() {
                tracing::debug!(target: "ingest", provider = %self.name, "entry without title/link skipped");
                continue;
            }
            out.push(Item {
                title,
                link,
                summary: normalize_text(it.description.as_deref().unwrap_or_default()),
                source: self.name.clone(),
                published: it
                    .pub_date
                    .as_deref()
                    .and_then(parse_rfc2822)
                    .unwrap_or(fetched_at),
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!(m::PARSE_MS).record(ms);
        counter!(m::ITEMS_FETCHED).increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for RssProvider {
    async fn fetch_latest(&self) -> Result<Vec<Item>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items(s, Utc::now()),
            Mode::Http {
                url,
                client,
                timeout,
            } => {
                let resp = client
                    .get(url)
                    .timeout(*timeout)
                    .send()
                    .await
                    .with_context(|| format!("{} http get()", self.name))?;
                let resp = resp
                    .error_for_status()
                    .with_context(|| format!("{} http status", self.name))?;
                let body = resp
                    .text()
                    .await
                    .with_context(|| format!("{} http .text()", self.name))?;
                self.parse_items(&body, Utc::now())
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// Named HTML entities are not valid XML; map the common ones before parsing.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>T</title>
  <item><title>OpenAI &ldquo;GPT&rdquo; launch</title><link>https://a/1</link>
    <description><![CDATA[<p>New <b>model</b></p>]]></description>
    <pubDate>Thu, 02 Jan 2025 08:30:00 +0800</pubDate></item>
  <item><title>No date</title><link>https://a/2</link></item>
  <item><title></title><link>https://a/3</link></item>
  <item><title>No link</title></item>
</channel></rss>"#;

    #[test]
    fn parses_items_and_skips_incomplete_entries() {
        let p = RssProvider::from_fixture_str("feed", FEED);
        let fetched = Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap();
        let items = p.parse_items(FEED, fetched).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, r#"OpenAI "GPT" launch"#);
        assert_eq!(items[0].summary, "New model");
        assert_eq!(items[0].source, "feed");
        assert_eq!(items[0].published, Utc.with_ymd_and_hms(2025, 1, 2, 0, 30, 0).unwrap());
        assert_eq!(items[1].published, fetched);
    }

    #[test]
    fn max_items_caps_before_filtering() {
        let p = RssProvider::from_fixture_str("feed", FEED).with_max_items(1);
        let items = p.parse_items(FEED, Utc::now()).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn garbage_is_an_error() {
        let p = RssProvider::from_fixture_str("feed", "not xml");
        assert!(p.parse_items("not xml", Utc::now()).is_err());
    }
}
