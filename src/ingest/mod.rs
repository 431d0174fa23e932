// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod types;

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::types::SourceProvider;
use crate::metrics as m;
use crate::types::Item;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

const MAX_TEXT_CHARS: usize = 1500;

/// Normalize feed text: decode entities, strip tags, collapse whitespace, trim,
/// cap the length. Punctuation is kept, so titles stay distinct.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let decoded = html_escape::decode_html_entities(s);

    // 2) Strip HTML tags
    let stripped = RE_TAGS.replace_all(&decoded, " ");

    // 3) Curly quotes to ASCII
    let quoted = stripped
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (NBSP included)
    let mut out = RE_WS.replace_all(&quoted, " ").trim().to_string();

    if out.chars().count() > MAX_TEXT_CHARS {
        out = out.chars().take(MAX_TEXT_CHARS).collect();
    }
    out
}

/// Poll every provider in turn, `delay` apart. Provider errors are logged and
/// counted, never fatal. Result is newest first.
pub async fn fetch_all_with_delay(
    providers: &[Box<dyn SourceProvider>],
    delay: Duration,
) -> Vec<Item> {
    m::ensure_described();

    let mut all = Vec::new();
    for (i, p) in providers.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match p.fetch_latest().await {
            Ok(mut v) => {
                tracing::info!(target: "ingest", provider = p.name(), items = v.len(), "fetched");
                all.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, provider = p.name(), "provider error");
                counter!(m::PROVIDER_ERRORS).increment(1);
            }
        }
    }

    // Stable: equal timestamps keep provider order.
    all.sort_by(|a, b| b.published.cmp(&a.published));
    all
}

pub async fn fetch_all(providers: &[Box<dyn SourceProvider>]) -> Vec<Item> {
    fetch_all_with_delay(providers, Duration::ZERO).await
}

/// Items published at or after `now - hours`.
///
/// A window of zero or fewer hours keeps nothing. A window too wide for the
/// calendar keeps everything.
pub fn filter_recent(items: &[Item], hours: i64, now: DateTime<Utc>) -> Vec<Item> {
    if hours <= 0 {
        tracing::warn!(target: "ingest", hours, "non-positive recent window, nothing kept");
        return Vec::new();
    }
    let Some(cutoff) = TimeDelta::try_hours(hours).and_then(|d| now.checked_sub_signed(d)) else {
        tracing::warn!(target: "ingest", hours, "recent window out of range, keeping all items");
        return items.to_vec();
    };
    let kept: Vec<Item> = items
        .iter()
        .filter(|it| it.published >= cutoff)
        .cloned()
        .collect();
    tracing::info!(target: "ingest", hours, kept = kept.len(), total = items.len(), "recent filter");
    kept
}
