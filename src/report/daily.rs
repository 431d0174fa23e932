// src/report/daily.rs
//! Structured daily report (title, summary, per-source sections, statistics)
//! and its Markdown / plain-text renderings.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::Item;

pub const DEFAULT_MAX_ITEMS: usize = 50;
pub const SUMMARY_MAX_CHARS: usize = 100;
pub const EMPTY_SUMMARY: &str = "今日暂无重要资讯。";

/// Topics counted for the "热门话题" line of the summary.
pub const DEFAULT_HOT_KEYWORDS: &[&str] = &[
    "AI", "人工智能", "机器学习", "ChatGPT", "大模型", "科技", "创新", "创业", "投资", "融资",
    "IPO", "上市", "收购", "合并", "裁员", "芯片", "半导体", "新能源", "电动车", "元宇宙", "Web3",
    "区块链",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleEntry {
    pub title: String,
    pub link: String,
    pub published: String, // HH:MM
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub articles: Vec<ArticleEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_articles: usize,
    #[serde(default)]
    pub source_distribution: BTreeMap<String, usize>,
    #[serde(default)]
    pub hourly_distribution: BTreeMap<String, usize>,
    #[serde(default)]
    pub top_sources: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub title: String,
    pub summary: String,
    pub sections: Vec<Section>,
    pub statistics: Statistics,
    pub generated_at: DateTime<FixedOffset>,
}

impl DailyReport {
    pub fn is_empty(&self) -> bool {
        self.statistics.total_articles == 0
    }
}

#[derive(Debug, Clone)]
pub struct DailyReportBuilder {
    pub max_items: usize,
    pub hot_keywords: Vec<String>,
    pub offset: FixedOffset,
}

impl Default for DailyReportBuilder {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            hot_keywords: DEFAULT_HOT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            offset: Utc.fix(),
        }
    }
}

impl DailyReportBuilder {
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_hot_keywords<S: Into<String>>(mut self, kws: impl IntoIterator<Item = S>) -> Self {
        self.hot_keywords = kws.into_iter().map(Into::into).collect();
        self
    }

    fn title(&self, now: DateTime<Utc>) -> String {
        let local = now.with_timezone(&self.offset);
        format!("📰 科技日报 - {}", local.format("%Y年%m月%d日"))
    }

    pub fn empty(&self, now: DateTime<Utc>) -> DailyReport {
        DailyReport {
            title: self.title(now),
            summary: EMPTY_SUMMARY.to_string(),
            sections: Vec::new(),
            statistics: Statistics::default(),
            generated_at: now.with_timezone(&self.offset),
        }
    }

    /// Build the report from already filtered, deduplicated and ordered items.
    pub fn generate(&self, items: &[Item], now: DateTime<Utc>) -> DailyReport {
        if items.is_empty() {
            return self.empty(now);
        }
        let items = &items[..items.len().min(self.max_items)];

        let report = DailyReport {
            title: self.title(now),
            summary: self.summary(items),
            sections: self.sections(items),
            statistics: self.statistics(items),
            generated_at: now.with_timezone(&self.offset),
        };
        info!(target: "report", articles = items.len(), sections = report.sections.len(), "daily report built");
        report
    }

    /// Hot keywords by number of articles mentioning them; ties keep list order.
    pub fn keyword_counts(&self, items: &[Item]) -> Vec<(String, usize)> {
        let contents: Vec<String> = items.iter().map(Item::match_content).collect();
        let mut counts: Vec<(String, usize)> = self
            .hot_keywords
            .iter()
            .map(|kw| {
                let needle = kw.to_lowercase();
                (kw.clone(), contents.iter().filter(|c| c.contains(&needle)).count())
            })
            .filter(|(_, n)| *n > 0)
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    fn summary(&self, items: &[Item]) -> String {
        let sources = group_by_source(items).len();
        let mut summary = format!(
            "今日共筛选出 {} 篇重要资讯，来自 {} 个信息源。",
            items.len(),
            sources
        );
        let top: Vec<String> = self
            .keyword_counts(items)
            .into_iter()
            .take(3)
            .map(|(kw, n)| format!("{kw}({n})"))
            .collect();
        if !top.is_empty() {
            let _ = write!(summary, " 热门话题：{}。", top.join("、"));
        }
        summary
    }

    fn sections(&self, items: &[Item]) -> Vec<Section> {
        group_by_source(items)
            .into_iter()
            .map(|(source, articles)| Section {
                title: format!("📊 {source}"),
                articles: articles
                    .into_iter()
                    .map(|a| ArticleEntry {
                        title: a.title.clone(),
                        link: a.link.clone(),
                        published: a.published.with_timezone(&self.offset).format("%H:%M").to_string(),
                        summary: truncate_summary(&a.summary, SUMMARY_MAX_CHARS),
                    })
                    .collect(),
            })
            .collect()
    }

    fn statistics(&self, items: &[Item]) -> Statistics {
        let mut source_distribution = BTreeMap::new();
        let mut hourly_distribution = BTreeMap::new();
        for it in items {
            *source_distribution.entry(it.source.clone()).or_insert(0) += 1;
            let hour = it.published.with_timezone(&self.offset).hour();
            *hourly_distribution.entry(format!("{hour:02}:00")).or_insert(0) += 1;
        }

        // First-appearance order, then a stable sort by count.
        let mut top_sources: Vec<(String, usize)> = group_by_source(items)
            .into_iter()
            .map(|(s, v)| (s.to_string(), v.len()))
            .collect();
        top_sources.sort_by(|a, b| b.1.cmp(&a.1));
        top_sources.truncate(3);

        Statistics {
            total_articles: items.len(),
            source_distribution,
            hourly_distribution,
            top_sources,
        }
    }
}

/// Sources in order of first appearance, each with its items.
fn group_by_source(items: &[Item]) -> Vec<(&str, Vec<&Item>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&Item>)> = Vec::new();
    for it in items {
        let i = *index.entry(it.source.as_str()).or_insert_with(|| {
            groups.push((it.source.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[i].1.push(it);
    }
    groups
}

/// Cut to `max_chars` characters and mark the cut with `...`.
pub fn truncate_summary(summary: &str, max_chars: usize) -> String {
    if summary.chars().count() <= max_chars {
        return summary.to_string();
    }
    let mut out: String = summary.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

fn top_sources_line(stats: &Statistics) -> Option<String> {
    if stats.top_sources.is_empty() {
        return None;
    }
    Some(
        stats
            .top_sources
            .iter()
            .map(|(s, n)| format!("{s}({n})"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

fn footer_time(report: &DailyReport) -> String {
    report.generated_at.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn format_markdown(report: &DailyReport) -> String {
    let mut s = String::new();
    let _ = write!(s, "# {}\n\n", report.title);
    let _ = write!(s, "## 📋 今日摘要\n{}\n\n", report.summary);
    s.push_str("## 📊 数据统计\n");
    let _ = writeln!(s, "- 总文章数：{} 篇", report.statistics.total_articles);
    if let Some(line) = top_sources_line(&report.statistics) {
        let _ = writeln!(s, "- 主要来源：{line}");
    }
    s.push('\n');

    for section in &report.sections {
        let _ = writeln!(s, "## {}", section.title);
        for a in &section.articles {
            let _ = writeln!(s, "- **{}** [{}]", a.title, a.published);
            let _ = writeln!(s, "  {}", a.link);
            if !a.summary.is_empty() {
                let _ = writeln!(s, "  > {}", a.summary);
            }
            s.push('\n');
        }
    }

    let _ = write!(s, "---\n*生成时间：{}*", footer_time(report));
    s
}

pub fn format_text(report: &DailyReport) -> String {
    let mut s = String::new();
    let _ = write!(s, "{}\n\n", report.title);
    let _ = write!(s, "📋 今日摘要\n{}\n\n", report.summary);
    s.push_str("📊 数据统计\n");
    let _ = writeln!(s, "总文章数：{} 篇", report.statistics.total_articles);
    if let Some(line) = top_sources_line(&report.statistics) {
        let _ = writeln!(s, "主要来源：{line}");
    }
    s.push('\n');

    for section in &report.sections {
        let _ = writeln!(s, "{}", section.title);
        for a in &section.articles {
            let _ = writeln!(s, "- {} [{}]", a.title, a.published);
            let _ = writeln!(s, "  {}", a.link);
            if !a.summary.is_empty() {
                let _ = writeln!(s, "  {}", a.summary);
            }
            s.push('\n');
        }
    }

    let _ = write!(s, "生成时间：{}", footer_time(report));
    s
}
