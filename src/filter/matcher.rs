// src/filter/matcher.rs
//! Keyword matching primitive shared by the per-source ruleset path and the
//! grouped path.
//!
//! A keyword matches when it is a literal substring of the lowercased content or,
//! failing that, when one of its whitespace-separated words has every segmented
//! unit present in the content's tokens. A CJK word therefore needs all of its
//! bigrams, so `人工智能` never matches on `智能` alone.

use std::collections::HashSet;

use once_cell::unsync::OnceCell;

use crate::segment::Segmenter;
use crate::types::{Item, Ruleset, WordGroup};

/// Lowercased item text plus its token set, segmented lazily on first fallback.
pub struct PreparedContent<'s> {
    content: String,
    tokens: OnceCell<HashSet<String>>,
    segmenter: &'s dyn Segmenter,
}

impl<'s> PreparedContent<'s> {
    pub fn new(item: &Item, segmenter: &'s dyn Segmenter) -> Self {
        Self::from_text(item.match_content(), segmenter)
    }

    pub fn from_text(content: String, segmenter: &'s dyn Segmenter) -> Self {
        Self {
            content,
            tokens: OnceCell::new(),
            segmenter,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    fn tokens(&self) -> &HashSet<String> {
        self.tokens
            .get_or_init(|| word_units(self.segmenter, &self.content).collect())
    }

    /// Literal containment only (used for ruleset exclusions and priority scoring).
    pub fn contains_literal(&self, keyword: &str) -> bool {
        self.content.contains(&keyword.to_lowercase())
    }

    /// Substring match, then the tokenized word test.
    pub fn matches(&self, keyword: &str) -> bool {
        keyword_matches(keyword, &self.content, || self.tokens(), self.segmenter)
    }
}

/// The shared primitive. `content` is already lowercased; `content_tokens` is only
/// evaluated when the substring test fails.
pub fn keyword_matches<'t, F>(
    keyword: &str,
    content: &str,
    content_tokens: F,
    segmenter: &dyn Segmenter,
) -> bool
where
    F: FnOnce() -> &'t HashSet<String>,
{
    let kw = keyword.to_lowercase();
    if content.contains(&kw) {
        return true;
    }
    let tokens = content_tokens();
    let hit = kw.split_whitespace().any(|word| {
        let units: Vec<String> = word_units(segmenter, word).collect();
        !units.is_empty() && units.iter().all(|u| tokens.contains(u))
    });
    hit
}

fn word_units<'a>(seg: &dyn Segmenter, text: &'a str) -> impl Iterator<Item = String> + 'a {
    seg.segment(text)
        .into_iter()
        .filter(|t| !t.trim().is_empty())
}

/// Why an item was accepted or rejected by one rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'a> {
    /// `hit` is the first include keyword that matched, `None` when the include list is empty.
    Accepted { hit: Option<&'a str> },
    Excluded(&'a str),
    MissingMust(&'a str),
    NoKeyword,
}

impl Verdict<'_> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted { .. })
    }

    pub fn label(&self) -> String {
        match self {
            Verdict::Accepted { hit: Some(k) } => format!("hit:{k}"),
            Verdict::Accepted { hit: None } => "open".to_string(),
            Verdict::Excluded(k) => format!("exclude:{k}"),
            Verdict::MissingMust(k) => format!("missing_must:{k}"),
            Verdict::NoKeyword => "no_keyword".to_string(),
        }
    }
}

fn first_include<'a>(pc: &PreparedContent<'_>, keywords: &'a [String]) -> Verdict<'a> {
    if keywords.is_empty() {
        return Verdict::Accepted { hit: None };
    }
    match keywords.iter().find(|k| pc.matches(k)) {
        Some(k) => Verdict::Accepted { hit: Some(k.as_str()) },
        None => Verdict::NoKeyword,
    }
}

/// Per-source ruleset: literal exclusions first, then any include keyword.
pub fn evaluate_ruleset<'a>(pc: &PreparedContent<'_>, ruleset: &'a Ruleset) -> Verdict<'a> {
    if let Some(x) = ruleset.exclude_keywords.iter().find(|k| pc.contains_literal(k)) {
        return Verdict::Excluded(x.as_str());
    }
    first_include(pc, &ruleset.keywords)
}

/// Word group: any keyword AND every must keyword AND no exclude keyword.
pub fn evaluate_group<'a>(pc: &PreparedContent<'_>, group: &'a WordGroup) -> Verdict<'a> {
    let verdict = first_include(pc, &group.keywords);
    if !verdict.is_accepted() {
        return verdict;
    }
    if let Some(m) = group.must_keywords.iter().find(|k| !pc.matches(k)) {
        return Verdict::MissingMust(m.as_str());
    }
    if let Some(x) = group.exclude_keywords.iter().find(|k| pc.matches(k)) {
        return Verdict::Excluded(x.as_str());
    }
    verdict
}

pub fn should_include(item: &Item, ruleset: &Ruleset, segmenter: &dyn Segmenter) -> bool {
    evaluate_ruleset(&PreparedContent::new(item, segmenter), ruleset).is_accepted()
}

pub fn group_matches(item: &Item, group: &WordGroup, segmenter: &dyn Segmenter) -> bool {
    evaluate_group(&PreparedContent::new(item, segmenter), group).is_accepted()
}
