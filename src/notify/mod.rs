// src/notify/mod.rs
pub mod feishu;

use anyhow::Result;

use crate::report::daily::DailyReport;

pub use feishu::FeishuNotifier;

/// Delivery channel for finished reports.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<()>;
    async fn send_report(&self, report: &DailyReport) -> Result<()>;
    fn name(&self) -> &str;

    /// Send the trend report; whitespace-only text is skipped and reported as `false`.
    async fn send_trend(&self, text: &str) -> Result<bool> {
        if text.trim().is_empty() {
            tracing::info!(target: "notify", notifier = self.name(), "empty trend report, not sent");
            return Ok(false);
        }
        self.send_text(text).await?;
        Ok(true)
    }
}
