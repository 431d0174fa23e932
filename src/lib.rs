// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod error;
pub mod segment;
pub mod types;
pub mod word_groups;

// Keyword filtering core and report builders
pub mod filter;
pub mod report;

// Collaborators: feeds, delivery, snapshots, orchestration
pub mod history;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod pipeline;

// ---- Re-exports for stable public API ----
pub use crate::error::DigestError;
pub use crate::filter::{
    filter_by_date_range, filter_by_source, remove_duplicates, sort_by_priority, ContentFilter,
};
pub use crate::report::{build_report, DailyReport, DailyReportBuilder, TrendReportBuilder};
pub use crate::segment::{Segmenter, WhitespaceSegmenter, WordSegmenter};
pub use crate::types::{GroupResult, Item, OccurrenceStat, Ruleset, WordGroup};
pub use crate::word_groups::{load_word_groups, parse as parse_word_groups};
