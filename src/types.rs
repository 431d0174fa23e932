// src/types.rs
//! Shared data model: items, rule shapes and aggregation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DigestError;

/// One feed entry entering the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub summary: String,
    pub source: String, // feed name from the source config
    pub published: DateTime<Utc>,
}

impl Item {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        summary: impl Into<String>,
        source: impl Into<String>,
        published: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            summary: summary.into(),
            source: source.into(),
            published,
        }
    }

    /// Lowercased `title + " " + summary`, the text every keyword rule is matched against.
    pub fn match_content(&self) -> String {
        format!("{} {}", self.title.to_lowercase(), self.summary.to_lowercase())
    }

    /// Items with a blank title or source cannot be bucketed by `(source, title)`.
    pub fn validate(&self) -> Result<(), DigestError> {
        if self.title.trim().is_empty() {
            return Err(DigestError::Validation(format!(
                "missing title (link: {:?})",
                self.link
            )));
        }
        if self.source.trim().is_empty() {
            return Err(DigestError::Validation(format!(
                "missing source for {:?}",
                self.title
            )));
        }
        Ok(())
    }
}

/// Per-source include/exclude rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruleset {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
}

impl Ruleset {
    pub fn new<S: Into<String>>(
        keywords: impl IntoIterator<Item = S>,
        exclude_keywords: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            exclude_keywords: exclude_keywords.into_iter().map(Into::into).collect(),
        }
    }
}

/// Keyword group parsed from the frequency-words file.
///
/// `keywords` are OR-ed, `must_keywords` are AND-ed, `exclude_keywords` disqualify.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordGroup {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub must_keywords: Vec<String>,
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
}

impl WordGroup {
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.must_keywords.is_empty() && self.exclude_keywords.is_empty()
    }

    /// Header label: `kw kw | +must | !exclude`, empty parts omitted.
    pub fn label(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if !self.keywords.is_empty() {
            parts.push(self.keywords.join(" "));
        }
        if !self.must_keywords.is_empty() {
            parts.push(
                self.must_keywords
                    .iter()
                    .map(|k| format!("+{k}"))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }
        if !self.exclude_keywords.is_empty() {
            parts.push(
                self.exclude_keywords
                    .iter()
                    .map(|k| format!("!{k}"))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }
        if parts.is_empty() {
            "(all)".to_string()
        } else {
            parts.join(" | ")
        }
    }
}

/// A group paired with the items that matched it, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupResult {
    pub group: WordGroup,
    pub matched_articles: Vec<Item>,
}

/// Occurrences of one `(source, title)` pair inside a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceStat {
    pub item: Item,
    pub count: usize,
    pub first_time: DateTime<Utc>,
    pub last_time: DateTime<Utc>,
}

impl OccurrenceStat {
    pub fn seed(item: &Item) -> Self {
        Self {
            item: item.clone(),
            count: 1,
            first_time: item.published,
            last_time: item.published,
        }
    }

    /// Count another occurrence and widen the range to min/max of all timestamps seen.
    pub fn merge(&mut self, ts: DateTime<Utc>) {
        self.count += 1;
        if ts < self.first_time {
            self.first_time = ts;
        }
        if ts > self.last_time {
            self.last_time = ts;
        }
    }
}
