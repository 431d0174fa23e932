// src/history.rs
//! Per-day JSON snapshots of the daily report.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::error::DigestError;
use crate::report::daily::{DailyReport, Statistics};

pub const DEFAULT_REPORTS_DIR: &str = "reports";

#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new(DEFAULT_REPORTS_DIR)
    }
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("daily_report_{}.json", date.format("%Y%m%d")))
    }

    /// Write `report` as pretty JSON, creating the directory if needed.
    pub fn save(&self, report: &DailyReport, date: NaiveDate) -> Result<PathBuf, DigestError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(date);
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json)?;
        info!(target: "pipeline", path = %path.display(), "report saved");
        Ok(path)
    }

    pub fn load(&self, date: NaiveDate) -> Result<DailyReport, DigestError> {
        let path = self.path_for(date);
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Statistics of the saved report for `date`, `None` when there is none.
    pub fn statistics(&self, date: NaiveDate) -> Result<Option<Statistics>, DigestError> {
        if !self.path_for(date).exists() {
            return Ok(None);
        }
        Ok(Some(self.load(date)?.statistics))
    }
}
