// src/report/trend.rs
//! Trend report: per keyword group, how often each `(source, title)` showed up
//! and over which time span.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use tracing::{debug, warn};

use crate::types::{GroupResult, Item, OccurrenceStat};

/// Collapse items into `(source, title)` buckets, ranked by count desc then first_time asc.
///
/// Records that fail [`Item::validate`] are skipped.
pub fn aggregate_occurrences(items: &[Item]) -> Vec<OccurrenceStat> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut buckets: Vec<OccurrenceStat> = Vec::new();

    for item in items {
        if let Err(e) = item.validate() {
            warn!(target: "report", error = %e, "skipping record");
            continue;
        }
        match index.get(&(item.source.as_str(), item.title.as_str())) {
            Some(&i) => buckets[i].merge(item.published),
            None => {
                index.insert((item.source.as_str(), item.title.as_str()), buckets.len());
                buckets.push(OccurrenceStat::seed(item));
            }
        }
    }

    // Stable: ties keep bucket creation order.
    buckets.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.first_time.cmp(&b.first_time))
    });
    buckets
}

/// Renders group results into the plain-text trend report.
#[derive(Debug, Clone)]
pub struct TrendReportBuilder {
    offset: FixedOffset,
}

impl Default for TrendReportBuilder {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }
}

impl TrendReportBuilder {
    /// `offset` is the zone the `HH:MM` times are shown in.
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }

    fn hm(&self, ts: DateTime<Utc>) -> String {
        ts.with_timezone(&self.offset).format("%H:%M").to_string()
    }

    fn time_range(&self, stat: &OccurrenceStat) -> String {
        if stat.first_time == stat.last_time {
            self.hm(stat.first_time)
        } else {
            format!("{} ~ {}", self.hm(stat.first_time), self.hm(stat.last_time))
        }
    }

    pub fn render_line(&self, rank: usize, stat: &OccurrenceStat) -> String {
        let mut line = format!(
            "  {rank}. [{}] {} {}",
            stat.item.source,
            stat.item.title,
            self.time_range(stat)
        );
        if stat.count > 1 {
            let _ = write!(line, " (x{})", stat.count);
        }
        line
    }

    /// Every group gets a header (zero-count groups included) followed by a blank line.
    pub fn build(&self, results: &[GroupResult]) -> String {
        let mut out = String::new();
        for result in results {
            let _ = writeln!(
                out,
                "{} ({})",
                result.group.label(),
                result.matched_articles.len()
            );
            let stats = aggregate_occurrences(&result.matched_articles);
            for (i, stat) in stats.iter().enumerate() {
                let _ = writeln!(out, "{}", self.render_line(i + 1, stat));
            }
            out.push('\n');
            debug!(
                target: "report",
                group = %result.group.label(),
                buckets = stats.len(),
                "rendered group"
            );
        }
        out
    }
}

/// Build the trend report with times shown in UTC.
pub fn build_report(results: &[GroupResult]) -> String {
    TrendReportBuilder::default().build(results)
}
