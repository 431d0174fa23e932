// src/report/mod.rs
//! Report builders: the grouped trend text and the structured daily report.

pub mod daily;
pub mod trend;

pub use daily::{format_markdown, format_text, DailyReport, DailyReportBuilder, Statistics};
pub use trend::{aggregate_occurrences, build_report, TrendReportBuilder};
