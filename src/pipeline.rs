// src/pipeline.rs
//! Daily run: fetch → recent → per-source filter → dedup → priority sort →
//! daily report + trend report → save → send.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use metrics::counter;
use tracing::{info, warn};

use crate::filter::{remove_duplicates, sort_by_priority, ContentFilter};
use crate::history::ReportStore;
use crate::ingest::config::SourcesConfig;
use crate::ingest::providers::RssProvider;
use crate::ingest::types::SourceProvider;
use crate::metrics as m;
use crate::notify::Notifier;
use crate::report::daily::{DailyReport, DailyReportBuilder, Statistics};
use crate::report::trend::TrendReportBuilder;
use crate::types::WordGroup;
use crate::word_groups::load_word_groups;

pub const TEST_MESSAGE: &str =
    "🔧 RSS 日报系统连接测试\n\n如果您看到这条消息，说明飞书机器人配置正确！";

/// What one run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: DailyReport,
    pub trend: String,
    pub fetched: usize,
    pub kept: usize,
    pub saved: Option<PathBuf>,
}

/// Keyword groups for the trend report. A missing or unreadable rules file is not
/// fatal: the run goes on without groups.
pub fn load_word_groups_or_empty(path: &Path) -> Vec<WordGroup> {
    match load_word_groups(path) {
        Ok(groups) => {
            info!(target: "pipeline", groups = groups.len(), path = %path.display(), "word groups loaded");
            groups
        }
        Err(e) => {
            warn!(target: "pipeline", error = %e, "no word groups, trend report will be empty");
            Vec::new()
        }
    }
}

pub struct DailyProcessor {
    config: SourcesConfig,
    providers: Vec<Box<dyn SourceProvider>>,
    filter: ContentFilter,
    word_groups: Vec<WordGroup>,
    builder: DailyReportBuilder,
    trend: TrendReportBuilder,
    store: Option<ReportStore>,
}

impl DailyProcessor {
    /// `providers` are polled in order; `config` supplies per-source rules and global settings.
    pub fn new(config: SourcesConfig, providers: Vec<Box<dyn SourceProvider>>) -> Self {
        let builder =
            DailyReportBuilder::default().with_max_items(config.global_settings.max_daily_items);
        Self {
            config,
            providers,
            filter: ContentFilter::new(),
            word_groups: Vec::new(),
            builder,
            trend: TrendReportBuilder::default(),
            store: None,
        }
    }

    /// One HTTP RSS provider per enabled source.
    pub fn from_config(config: SourcesConfig) -> Self {
        let timeout = Duration::from_secs(config.global_settings.timeout_secs);
        let providers: Vec<Box<dyn SourceProvider>> = config
            .enabled_sources()
            .map(|s| Box::new(RssProvider::from_source(s, timeout)) as Box<dyn SourceProvider>)
            .collect();
        Self::new(config, providers)
    }

    pub fn with_word_groups(mut self, groups: Vec<WordGroup>) -> Self {
        self.word_groups = groups;
        self
    }

    pub fn with_store(mut self, store: ReportStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_filter(mut self, filter: ContentFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Zone used for report titles and `HH:MM` times.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.builder = self.builder.with_offset(offset);
        self.trend = TrendReportBuilder::with_offset(offset);
        self
    }

    /// Everything up to (and including) saving; nothing is sent.
    pub async fn build(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        m::ensure_described();
        let gs = &self.config.global_settings;

        info!(target: "pipeline", providers = self.providers.len(), "step 1: fetch");
        let all = crate::ingest::fetch_all_with_delay(
            &self.providers,
            Duration::from_millis(gs.request_delay_ms),
        )
        .await;

        info!(target: "pipeline", hours = gs.recent_hours, "step 2: recent");
        let recent = crate::ingest::filter_recent(&all, gs.recent_hours, now);

        info!(target: "pipeline", "step 3: per-source filter");
        let rulesets = self.config.rulesets();
        let filtered = self.filter.filter_by_sources(
            &recent,
            rulesets.iter().map(|(name, rs)| (name.as_str(), rs)),
        );

        info!(target: "pipeline", "step 4: dedup + priority");
        let unique = remove_duplicates(&filtered);
        counter!(m::DUPLICATES_REMOVED).increment((filtered.len() - unique.len()) as u64);
        let ordered = sort_by_priority(&unique, &gs.priority_keywords);
        counter!(m::ITEMS_KEPT).increment(ordered.len() as u64);

        info!(target: "pipeline", items = ordered.len(), "step 5: reports");
        let report = self.builder.generate(&ordered, now);
        let groups = self.filter.filter_by_groups(&recent, &self.word_groups);
        let trend = self.trend.build(&groups);

        let saved = match &self.store {
            Some(store) => {
                let day = now.with_timezone(&self.builder.offset).date_naive();
                Some(store.save(&report, day).context("saving daily report")?)
            }
            None => None,
        };

        Ok(RunOutcome {
            report,
            trend,
            fetched: all.len(),
            kept: ordered.len(),
            saved,
        })
    }

    /// Full run. A failed report delivery fails the run; a failed trend delivery is logged.
    pub async fn run(&self, notifier: &dyn Notifier, now: DateTime<Utc>) -> Result<RunOutcome> {
        let outcome = self.build(now).await?;

        info!(target: "pipeline", notifier = notifier.name(), "step 6: send");
        notifier
            .send_report(&outcome.report)
            .await
            .context("sending daily report")?;
        if let Err(e) = notifier.send_trend(&outcome.trend).await {
            warn!(target: "pipeline", error = %e, "trend report not delivered");
        }

        info!(target: "pipeline", fetched = outcome.fetched, kept = outcome.kept, "daily run done");
        Ok(outcome)
    }

    pub async fn test_connection(&self, notifier: &dyn Notifier) -> Result<()> {
        notifier
            .send_text(TEST_MESSAGE)
            .await
            .context("connection test message")
    }

    /// Saved statistics for `date`; `None` without a store or without a report that day.
    pub fn stats(&self, date: NaiveDate) -> Result<Option<Statistics>> {
        match &self.store {
            Some(store) => Ok(store.statistics(date)?),
            None => Ok(None),
        }
    }
}
