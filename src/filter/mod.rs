// src/filter/mod.rs
//! Content filtering over item batches: per-source rulesets, keyword groups,
//! deduplication, priority ordering and source/date slicing.
//!
//! Every function takes a borrowed slice and returns a fresh `Vec`; nothing here
//! keeps state between calls.

pub mod matcher;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::filter::matcher::{evaluate_group, evaluate_ruleset, PreparedContent, Verdict};
use crate::segment::{Segmenter, WordSegmenter};
use crate::types::{GroupResult, Item, Ruleset, WordGroup};

// Dev logging gate: DIGEST_DEV_LOG=1 AND a debug build.
pub(crate) fn dev_logging_enabled() -> bool {
    cfg!(debug_assertions) && std::env::var("DIGEST_DEV_LOG").ok().as_deref() == Some("1")
}

// Short stable id for an item, so match traces never carry feed text.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn dev_log_verdict(scope: &str, item: &Item, verdict: &Verdict<'_>) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(&item.link);
    debug!(target: "filter", %id, scope, source = %item.source, verdict = %verdict.label());
}

/// Keyword filter with a pluggable segmenter for the tokenized fallback.
pub struct ContentFilter {
    segmenter: Box<dyn Segmenter>,
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentFilter {
    pub fn new() -> Self {
        Self::with_segmenter(WordSegmenter)
    }

    pub fn with_segmenter<S: Segmenter + 'static>(segmenter: S) -> Self {
        Self {
            segmenter: Box::new(segmenter),
        }
    }

    pub fn segmenter(&self) -> &dyn Segmenter {
        self.segmenter.as_ref()
    }

    pub fn should_include(&self, item: &Item, ruleset: &Ruleset) -> bool {
        let pc = PreparedContent::new(item, self.segmenter());
        let verdict = evaluate_ruleset(&pc, ruleset);
        dev_log_verdict("ruleset", item, &verdict);
        verdict.is_accepted()
    }

    /// Keep items accepted by `ruleset`, in input order.
    pub fn filter_articles(&self, items: &[Item], ruleset: &Ruleset) -> Vec<Item> {
        let kept: Vec<Item> = items
            .iter()
            .filter(|it| self.should_include(it, ruleset))
            .cloned()
            .collect();
        info!(target: "filter", input = items.len(), kept = kept.len(), "ruleset filter");
        kept
    }

    /// Apply each source's ruleset to that source's items; sources are visited in the given order.
    pub fn filter_by_sources<'a, I>(&self, items: &[Item], sources: I) -> Vec<Item>
    where
        I: IntoIterator<Item = (&'a str, &'a Ruleset)>,
    {
        let mut out = Vec::new();
        for (name, ruleset) in sources {
            let own: Vec<Item> = items.iter().filter(|it| it.source == name).cloned().collect();
            out.extend(self.filter_articles(&own, ruleset));
        }
        out
    }

    /// One result per group, in group order; an item may land in several groups.
    pub fn filter_by_groups(&self, items: &[Item], groups: &[WordGroup]) -> Vec<GroupResult> {
        let prepared: Vec<PreparedContent<'_>> = items
            .iter()
            .map(|it| PreparedContent::new(it, self.segmenter()))
            .collect();

        let results: Vec<GroupResult> = groups
            .iter()
            .map(|group| {
                let matched_articles = items
                    .iter()
                    .zip(&prepared)
                    .filter(|(item, pc)| {
                        let verdict = evaluate_group(pc, group);
                        dev_log_verdict("group", item, &verdict);
                        verdict.is_accepted()
                    })
                    .map(|(item, _)| item.clone())
                    .collect();
                GroupResult {
                    group: group.clone(),
                    matched_articles,
                }
            })
            .collect();

        info!(
            target: "filter",
            items = items.len(),
            groups = groups.len(),
            matched = results.iter().map(|r| r.matched_articles.len()).sum::<usize>(),
            "group filter"
        );
        results
    }
}

/// Drop any item whose trimmed title OR trimmed link was already seen; first wins.
pub fn remove_duplicates(items: &[Item]) -> Vec<Item> {
    let mut seen_titles: HashSet<&str> = HashSet::new();
    let mut seen_links: HashSet<&str> = HashSet::new();
    let mut unique = Vec::with_capacity(items.len());

    for item in items {
        let title = item.title.trim();
        let link = item.link.trim();
        if seen_titles.contains(title) || seen_links.contains(link) {
            continue;
        }
        seen_titles.insert(title);
        seen_links.insert(link);
        unique.push(item.clone());
    }

    info!(
        target: "filter",
        removed = items.len() - unique.len(),
        kept = unique.len(),
        "dedup"
    );
    unique
}

/// Stable sort, most priority keywords (literal, case-insensitive) first.
pub fn sort_by_priority<S: AsRef<str>>(items: &[Item], keywords: &[S]) -> Vec<Item> {
    if keywords.is_empty() {
        return items.to_vec();
    }
    let lowered: Vec<String> = keywords.iter().map(|k| k.as_ref().to_lowercase()).collect();
    let mut scored: Vec<(usize, &Item)> = items
        .iter()
        .map(|it| {
            let content = it.match_content();
            let score = lowered.iter().filter(|k| content.contains(k.as_str())).count();
            (score, it)
        })
        .collect();
    // `sort_by` is stable: equal scores keep input order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    debug!(target: "filter", items = items.len(), "priority sort");
    scored.into_iter().map(|(_, it)| it.clone()).collect()
}

/// `None` or a blank name keeps everything.
pub fn filter_by_source(items: &[Item], source: Option<&str>) -> Vec<Item> {
    match source.map(str::trim).filter(|s| !s.is_empty()) {
        None => items.to_vec(),
        Some(name) => {
            let kept: Vec<Item> = items.iter().filter(|it| it.source == name).cloned().collect();
            info!(target: "filter", source = name, kept = kept.len(), "source filter");
            kept
        }
    }
}

/// Inclusive on both ends; a missing bound is open.
pub fn filter_by_date_range(
    items: &[Item],
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Vec<Item> {
    let kept: Vec<Item> = items
        .iter()
        .filter(|it| start.map_or(true, |s| it.published >= s))
        .filter(|it| end.map_or(true, |e| it.published <= e))
        .cloned()
        .collect();
    info!(target: "filter", kept = kept.len(), "date range filter");
    kept
}
